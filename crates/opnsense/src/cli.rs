//! Clap derive structures for the `opnsense` CLI.
//!
//! Defines the command tree, global flags, and shared argument types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// opnsense -- manage OPNsense firewall objects over the REST API
#[derive(Debug, Parser)]
#[command(
    name = "opnsense",
    version,
    about = "Manage OPNsense firewall objects from the command line",
    long_about = "Create, inspect, and delete aliases, firewall and NAT rules, interface\n\
        groups, categories, and captive portal templates on an OPNsense firewall.\n\n\
        Authenticates with an API key/secret pair created under\n\
        System > Access > Users.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Firewall profile to use
    #[arg(long, short = 'p', env = "OPNSENSE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Firewall URL, without /api (overrides profile)
    #[arg(long, short = 'e', env = "OPNSENSE_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    /// API key
    #[arg(long, env = "OPNSENSE_API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// API secret
    #[arg(long, env = "OPNSENSE_API_SECRET", global = true, hide_env_values = true)]
    pub api_secret: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "OPNSENSE_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept the firewall's self-signed TLS certificate
    #[arg(long, short = 'k', env = "OPNSENSE_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "OPNSENSE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one uuid per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage firewall aliases
    #[command(alias = "alias", alias = "a")]
    Aliases(AliasesArgs),

    /// Manage firewall filter rules
    #[command(alias = "rule", alias = "r")]
    Rules(ResourceArgs),

    /// Manage outbound (source) NAT rules
    Snat(ResourceArgs),

    /// Manage one-to-one NAT rules
    #[command(name = "one-to-one", alias = "binat")]
    OneToOne(ResourceArgs),

    /// Manage IPv6 prefix translation (NPT) rules
    Npt(ResourceArgs),

    /// Manage firewall categories
    #[command(alias = "cat")]
    Categories(ResourceArgs),

    /// Manage interface groups
    Groups(ResourceArgs),

    /// Manage captive portal templates
    Templates(TemplatesArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared Arguments ─────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Only show rows matching this phrase (server-side search)
    #[arg(long, short = 's')]
    pub search: Option<String>,
}

/// Generic lifecycle for objects whose payload is read from a file.
#[derive(Debug, Args)]
pub struct ResourceArgs {
    #[command(subcommand)]
    pub command: ResourceCommand,
}

#[derive(Debug, Subcommand)]
pub enum ResourceCommand {
    /// List objects
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one object
    Get {
        /// Object uuid
        id: String,
    },

    /// Create an object from a JSON or YAML file ('-' for stdin)
    Create {
        #[arg(long, short = 'F')]
        from_file: PathBuf,
    },

    /// Replace an object with the contents of a JSON or YAML file
    Update {
        /// Object uuid
        id: String,

        #[arg(long, short = 'F')]
        from_file: PathBuf,
    },

    /// Delete an object
    #[command(alias = "rm")]
    Delete {
        /// Object uuid
        id: String,
    },

    /// Reload the running configuration
    Apply,
}

// ── Aliases ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AliasesArgs {
    #[command(subcommand)]
    pub command: AliasesCommand,
}

#[derive(Debug, Subcommand)]
pub enum AliasesCommand {
    /// List aliases
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one alias
    Get {
        /// Alias uuid
        id: String,
    },

    /// Create an alias from flags or a file
    Create(AliasSpec),

    /// Replace an alias
    Update {
        /// Alias uuid
        id: String,

        #[command(flatten)]
        spec: AliasSpec,
    },

    /// Delete an alias
    #[command(alias = "rm")]
    Delete {
        /// Alias uuid
        id: String,
    },

    /// Reload aliases (pf tables)
    Apply,

    /// Print the uuid of the alias with this name
    Lookup {
        /// Alias name
        name: String,
    },
}

#[derive(Debug, Args)]
pub struct AliasSpec {
    /// Read the full alias from a JSON or YAML file
    #[arg(long, short = 'F', conflicts_with_all = ["name", "alias_type", "content"])]
    pub from_file: Option<PathBuf>,

    /// Alias name
    #[arg(long, required_unless_present = "from_file")]
    pub name: Option<String>,

    /// Alias type (host, network, port, url, urltable, geoip, ...)
    #[arg(long = "type", short = 't', default_value = "host")]
    pub alias_type: String,

    /// Content entries (repeat or comma-separate)
    #[arg(long, short = 'c', value_delimiter = ',')]
    pub content: Vec<String>,

    /// Category names or uuids (repeat or comma-separate)
    #[arg(long = "category", value_delimiter = ',')]
    pub categories: Vec<String>,

    /// Free-form description
    #[arg(long, short = 'd')]
    pub description: Option<String>,

    /// Create the alias disabled
    #[arg(long)]
    pub disabled: bool,
}

// ── Templates ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TemplatesArgs {
    #[command(subcommand)]
    pub command: TemplatesCommand,
}

#[derive(Debug, Subcommand)]
pub enum TemplatesCommand {
    /// List captive portal templates
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one template, optionally saving its archive
    Get {
        /// Template uuid
        id: String,

        /// Write the decoded zip archive to this path
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Upload a template archive
    Create {
        /// Template name
        #[arg(long)]
        name: String,

        /// Zip archive to upload
        #[arg(long, short = 'f')]
        file: PathBuf,
    },

    /// Replace a template's archive
    Update {
        /// Template uuid
        id: String,

        /// Template name
        #[arg(long)]
        name: String,

        /// Zip archive to upload
        #[arg(long, short = 'f')]
        file: PathBuf,
    },

    /// Delete a template
    #[command(alias = "rm")]
    Delete {
        /// Template uuid
        id: String,
    },

    /// Reload the captive portal service
    Apply,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive configuration wizard
    Init,

    /// Show the configuration (secrets masked)
    Show,

    /// Set a profile value
    Set {
        /// Key (endpoint, api_key, api_key_env, api_secret, api_secret_env,
        /// ca_cert, insecure, timeout)
        key: String,

        /// Value
        value: String,
    },

    /// List profiles (default marked with *)
    Profiles,

    /// Make a profile the default
    Use {
        /// Profile name
        name: String,
    },

    /// Store the API key and secret in the system keyring
    SetSecret {
        /// Profile name (defaults to the active profile)
        #[arg(long)]
        profile: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
