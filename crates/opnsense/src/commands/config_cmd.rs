//! Config subcommand handlers.

use dialoguer::{Confirm, Input, Select};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, CredentialKind, Profile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

const MASK: &str = "****";

/// Replace plaintext secrets so `config show` never prints them.
fn redact(cfg: &mut Config) {
    for profile in cfg.profiles.values_mut() {
        if profile.api_key.is_some() {
            profile.api_key = Some(MASK.into());
        }
        if profile.api_secret.is_some() {
            profile.api_secret = Some(MASK.into());
        }
    }
}

fn render_toml(cfg: &Config) -> Result<String, CliError> {
    toml::to_string_pretty(cfg).map_err(|e| CliError::Config(e.to_string()))
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn prompt_secret(prompt: &str, field: &str) -> Result<String, CliError> {
    let value = rpassword::prompt_password(prompt).map_err(prompt_err)?;
    if value.is_empty() {
        return Err(CliError::Validation {
            field: field.into(),
            reason: "value cannot be empty".into(),
        });
    }
    Ok(value)
}

/// Offer to store a secret in the system keyring or return it for the
/// config file. Returns `None` when it went to the keyring.
fn store_secret(
    profile_name: &str,
    kind: CredentialKind,
    secret: String,
    use_keyring: bool,
) -> Result<Option<String>, CliError> {
    if use_keyring {
        config::store_credential(profile_name, kind, &secret)?;
        Ok(None)
    } else {
        Ok(Some(secret))
    }
}

fn set_profile_key(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    let parse_err = |field: &str, reason: &str| CliError::Validation {
        field: field.into(),
        reason: reason.into(),
    };

    match key {
        "endpoint" => {
            config::parse_endpoint(&value)?;
            profile.endpoint = value;
        }
        "api_key" | "api-key" => profile.api_key = Some(value),
        "api_key_env" | "api-key-env" => profile.api_key_env = Some(value),
        "api_secret" | "api-secret" => profile.api_secret = Some(value),
        "api_secret_env" | "api-secret-env" => profile.api_secret_env = Some(value),
        "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
        "insecure" => {
            profile.insecure = Some(
                value
                    .parse()
                    .map_err(|_| parse_err("insecure", "must be 'true' or 'false'"))?,
            );
        }
        "timeout" => {
            profile.timeout = Some(
                value
                    .parse()
                    .map_err(|_| parse_err("timeout", "must be a number (seconds)"))?,
            );
        }
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!(
                    "unknown config key '{other}'. Valid keys: endpoint, api_key, \
                     api_key_env, api_secret, api_secret_env, ca_cert, insecure, timeout"
                ),
            });
        }
    }
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(global),

        ConfigCommand::Show => {
            let mut cfg = config::load_config()?;
            redact(&mut cfg);
            let out = output::render_single(global.output, &cfg, render_toml, |_| {
                config::config_path().display().to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config()?;
            let profile_name = config::active_profile_name(global, &cfg);
            let profile = cfg.profiles.entry(profile_name.clone()).or_default();
            set_profile_key(profile, &key, value)?;

            config::save_config(&cfg)?;
            output::print_success(
                &format!("Set {key} on profile '{profile_name}'"),
                global.color,
                global.quiet,
            );
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config()?;
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: opnsense config init");
            }
            let listing = cfg
                .profiles
                .keys()
                .map(|name| {
                    if name == default {
                        format!("{name} *")
                    } else {
                        name.clone()
                    }
                })
                .collect::<Vec<_>>()
                .join("\n");
            output::print_output(&listing, global.quiet);
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config()?;
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }
            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            output::print_success(
                &format!("Default profile set to '{name}'"),
                global.color,
                global.quiet,
            );
            Ok(())
        }

        ConfigCommand::SetSecret { profile } => {
            let cfg = config::load_config()?;
            let profile_name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));
            if !cfg.profiles.contains_key(&profile_name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name: profile_name,
                });
            }

            let key = prompt_secret("API key: ", "api_key")?;
            let secret = prompt_secret("API secret: ", "api_secret")?;
            config::store_credential(&profile_name, CredentialKind::ApiKey, &key)?;
            config::store_credential(&profile_name, CredentialKind::ApiSecret, &secret)?;

            output::print_success(
                &format!("Credentials stored in system keyring for profile '{profile_name}'"),
                global.color,
                global.quiet,
            );
            Ok(())
        }
    }
}

/// Interactive wizard: one profile, credentials in keyring or file.
fn init(global: &GlobalOpts) -> Result<(), CliError> {
    let config_path = config::config_path();
    eprintln!("OPNsense CLI configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    let endpoint: String = Input::new()
        .with_prompt("Firewall URL")
        .default("https://192.168.1.1".into())
        .validate_with(|input: &String| {
            config::parse_endpoint(input)
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .interact_text()
        .map_err(prompt_err)?;

    eprintln!("\n   Create a key pair under System > Access > Users > API keys.");
    let key = prompt_secret("API key: ", "api_key")?;
    let secret = prompt_secret("API secret: ", "api_secret")?;

    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let use_keyring = Select::new()
        .with_prompt("Where to store the credentials?")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?
        == 0;

    let insecure = Confirm::new()
        .with_prompt("Accept a self-signed certificate?")
        .default(false)
        .interact()
        .map_err(prompt_err)?;

    let profile = Profile {
        endpoint,
        api_key: store_secret(&profile_name, CredentialKind::ApiKey, key, use_keyring)?,
        api_secret: store_secret(&profile_name, CredentialKind::ApiSecret, secret, use_keyring)?,
        insecure: insecure.then_some(true),
        ..Profile::default()
    };

    // Keep other profiles from an existing file.
    let mut cfg = config::load_config()?;
    cfg.profiles.insert(profile_name.clone(), profile);
    cfg.default_profile = Some(profile_name.clone());
    config::save_config(&cfg)?;

    output::print_success(
        &format!("Configuration written to {}", config_path.display()),
        global.color,
        false,
    );
    eprintln!("  Active profile: {profile_name}");
    eprintln!("\n  Test it: opnsense aliases list");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn set_profile_key_parses_typed_values() {
        let mut profile = Profile::default();
        set_profile_key(&mut profile, "timeout", "60".into()).unwrap();
        set_profile_key(&mut profile, "insecure", "true".into()).unwrap();
        set_profile_key(&mut profile, "endpoint", "https://fw.lan".into()).unwrap();
        assert_eq!(profile.timeout, Some(60));
        assert_eq!(profile.insecure, Some(true));
        assert_eq!(profile.endpoint, "https://fw.lan");
    }

    #[test]
    fn set_profile_key_rejects_bad_input() {
        let mut profile = Profile::default();
        assert!(set_profile_key(&mut profile, "timeout", "soon".into()).is_err());
        assert!(set_profile_key(&mut profile, "endpoint", "ftp://fw".into()).is_err());
        assert!(set_profile_key(&mut profile, "site", "x".into()).is_err());
        assert!(profile.endpoint.is_empty());
    }

    #[test]
    fn redact_masks_plaintext_secrets_only() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "fw".into(),
            Profile {
                endpoint: "https://fw".into(),
                api_key: Some("k".into()),
                api_secret_env: Some("FW_SECRET".into()),
                ..Profile::default()
            },
        );
        redact(&mut cfg);
        let text = render_toml(&cfg).unwrap();
        assert!(text.contains(r#"api_key = "****""#), "{text}");
        assert!(text.contains("FW_SECRET"), "{text}");
        assert!(!text.contains("api_secret ="), "{text}");
    }
}
