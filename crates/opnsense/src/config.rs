//! CLI-facing configuration: the shared profile types from
//! `opnsense-config`, plus flag-aware resolution into a `ControllerConfig`.

use std::time::Duration;

use secrecy::SecretString;

pub use opnsense_config::{
    Config, CredentialKind, Profile, config_path, load_config, parse_endpoint, save_config,
    store_credential,
};
use opnsense_core::{ControllerConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build a `ControllerConfig` from the config file, the active profile,
/// and CLI overrides. Flags win over the profile.
pub fn resolve_controller_config(global: &GlobalOpts) -> Result<ControllerConfig, CliError> {
    let cfg = load_config()?;
    let profile_name = active_profile_name(global, &cfg);

    let Some(profile) = cfg.profiles.get(&profile_name) else {
        // An explicitly named profile must exist.
        if global.profile.is_some() {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(&cfg),
            });
        }
        return from_flags(global, &profile_name, cfg.defaults.timeout);
    };

    let url = parse_endpoint(global.endpoint.as_deref().unwrap_or(&profile.endpoint))?;
    let api_key = match global.api_key {
        Some(ref key) => SecretString::from(key.clone()),
        None => opnsense_config::resolve_api_key(profile, &profile_name)?,
    };
    let api_secret = match global.api_secret {
        Some(ref secret) => SecretString::from(secret.clone()),
        None => opnsense_config::resolve_api_secret(profile, &profile_name)?,
    };

    let tls = if global.insecure {
        TlsVerification::DangerAcceptInvalid
    } else {
        opnsense_config::profile_tls(profile, &cfg.defaults)
    };
    let timeout = global
        .timeout
        .or(profile.timeout)
        .unwrap_or(cfg.defaults.timeout);

    Ok(ControllerConfig {
        url,
        api_key,
        api_secret,
        tls,
        timeout: Duration::from_secs(timeout),
    })
}

/// No profile on disk: everything must come from flags / env vars.
fn from_flags(
    global: &GlobalOpts,
    profile_name: &str,
    default_timeout: u64,
) -> Result<ControllerConfig, CliError> {
    let endpoint = global.endpoint.as_deref().ok_or_else(|| CliError::NoConfig {
        path: config_path().display().to_string(),
    })?;
    let url = parse_endpoint(endpoint)?;

    let missing = |what: &str| CliError::NoCredentials {
        profile: profile_name.into(),
        what: what.into(),
    };
    let api_key = global.api_key.clone().ok_or_else(|| missing("API key"))?;
    let api_secret = global
        .api_secret
        .clone()
        .ok_or_else(|| missing("API secret"))?;

    let mut config = ControllerConfig::new(
        url,
        SecretString::from(api_key),
        SecretString::from(api_secret),
    );
    if global.insecure {
        config.tls = TlsVerification::DangerAcceptInvalid;
    }
    config.timeout = Duration::from_secs(global.timeout.unwrap_or(default_timeout));
    Ok(config)
}

pub fn available_profiles(cfg: &Config) -> String {
    if cfg.profiles.is_empty() {
        "(none)".into()
    } else {
        cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}
