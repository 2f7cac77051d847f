//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a stable process exit code.

use miette::Diagnostic;
use thiserror::Error;

use opnsense_config::ConfigError;
use opnsense_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const REJECTED: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to firewall at {url}")]
    #[diagnostic(
        code(opnsense::connection_failed),
        help(
            "Check that the web GUI is reachable and the API is enabled.\n\
             {reason}\n\
             Self-signed certificate? Try --insecure (-k) or set ca_cert in your profile."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("{message}")]
    #[diagnostic(
        code(opnsense::timeout),
        help("Increase the timeout with --timeout or check firewall load.")
    )]
    Timeout { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(opnsense::auth_failed),
        help(
            "Verify the API key/secret and that the user has the required privileges.\n\
             Run: opnsense config set-secret"
        )
    )]
    AuthFailed { message: String },

    #[error("No {what} configured for profile '{profile}'")]
    #[diagnostic(
        code(opnsense::no_credentials),
        help(
            "Configure credentials with: opnsense config init\n\
             Or pass --api-key/--api-secret (OPNSENSE_API_KEY/OPNSENSE_API_SECRET)."
        )
    )]
    NoCredentials { profile: String, what: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(opnsense::not_found),
        help("Run: opnsense {list_command} to see existing objects")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("{message}")]
    #[diagnostic(
        code(opnsense::rejected),
        help("Fix the listed fields and try again.")
    )]
    Rejected { message: String },

    #[error("{message}")]
    #[diagnostic(code(opnsense::api_error))]
    ApiError { message: String },

    // ── Usage ────────────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(opnsense::validation))]
    Validation { field: String, reason: String },

    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(opnsense::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(opnsense::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: opnsense config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No firewall configured")]
    #[diagnostic(
        code(opnsense::no_config),
        help(
            "Create a profile with: opnsense config init\n\
             Or pass --endpoint. Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("{0}")]
    #[diagnostic(code(opnsense::config))]
    Config(String),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(opnsense::io))]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(opnsense::json))]
    Json(#[from] serde_json::Error),

    #[error("Invalid YAML: {0}")]
    #[diagnostic(code(opnsense::yaml), help("Check the file contents and try again."))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Rejected { .. } => exit_code::REJECTED,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    pub fn not_found(resource_type: &str, identifier: &str, list_command: &str) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            identifier: identifier.into(),
            list_command: list_command.into(),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            err @ CoreError::Timeout { .. } => Self::Timeout {
                message: err.to_string(),
            },
            err @ CoreError::AuthenticationFailed { .. } => Self::AuthFailed {
                message: err.to_string(),
            },
            CoreError::NotFound {
                entity_type,
                identifier,
            } => Self::NotFound {
                list_command: list_command_for(&entity_type).into(),
                resource_type: entity_type,
                identifier,
            },
            err @ CoreError::ValidationFailed { .. } => Self::Rejected {
                message: err.to_string(),
            },
            err @ CoreError::OperationFailed { .. } => Self::ApiError {
                message: err.to_string(),
            },
            CoreError::Config { message } => Self::Config(message),
            CoreError::Internal(message) => Self::ApiError {
                message: format!("internal error: {message}"),
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoCredentials { profile, what } => Self::NoCredentials {
                profile,
                what: what.into(),
            },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config(other.to_string()),
        }
    }
}

fn list_command_for(entity_type: &str) -> &'static str {
    match entity_type {
        "alias" => "aliases list",
        "filter rule" => "rules list",
        "source NAT rule" => "snat list",
        "one-to-one NAT rule" => "one-to-one list",
        "NPTv6 rule" => "npt list",
        "category" => "categories list",
        "interface group" => "groups list",
        "captive portal template" => "templates list",
        _ => "--help",
    }
}
