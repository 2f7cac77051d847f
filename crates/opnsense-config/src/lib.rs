//! Shared configuration for OPNsense tools.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `opnsense_core::ControllerConfig`. The CLI adds
//! flag-aware wrappers on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use opnsense_core::{ControllerConfig, TlsVerification};

/// Keyring service name credentials are stored under.
pub const KEYRING_SERVICE: &str = "opnsense";

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "OPNSENSE_CONFIG";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no {what} configured for profile '{profile}'")]
    NoCredentials { profile: String, what: &'static str },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named firewall profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named firewall profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Firewall base URL (e.g., "https://192.168.1.1"), without `/api`.
    pub endpoint: String,

    /// API key (plaintext, prefer keyring or env var).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// API secret (plaintext, prefer keyring or env var).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_secret: Option<String>,

    /// Environment variable name containing the API secret.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_secret_env: Option<String>,

    /// Path to custom CA certificate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    /// Override timeout (seconds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `$OPNSENSE_CONFIG`, else the platform
/// config directory.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("org", "opnsense", "opnsense").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("opnsense");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from an explicit file, layered over defaults and under
/// `OPNSENSE_*` environment overrides (`OPNSENSE_DEFAULTS__TIMEOUT=60`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(
            Env::prefixed("OPNSENSE_")
                .ignore(&["config", "api_key", "api_secret", "profile", "endpoint"])
                .split("__"),
        );

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution (without CLI flags) ───────────────────────

/// Which half of the key pair is being resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    ApiKey,
    ApiSecret,
}

impl CredentialKind {
    /// Keyring account suffix.
    pub fn keyring_suffix(self) -> &'static str {
        match self {
            Self::ApiKey => "api-key",
            Self::ApiSecret => "api-secret",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::ApiKey => "API key",
            Self::ApiSecret => "API secret",
        }
    }
}

fn keyring_entry(profile_name: &str, kind: CredentialKind) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(
        KEYRING_SERVICE,
        &format!("{profile_name}/{}", kind.keyring_suffix()),
    )?)
}

/// Resolve one credential through the chain: named env var, keyring,
/// plaintext in the profile. `env` looks up environment variables.
pub fn resolve_credential_with(
    profile: &Profile,
    profile_name: &str,
    kind: CredentialKind,
    env: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    let (env_name, plaintext) = match kind {
        CredentialKind::ApiKey => (&profile.api_key_env, &profile.api_key),
        CredentialKind::ApiSecret => (&profile.api_secret_env, &profile.api_secret),
    };

    // 1. Profile's *_env → env var lookup
    if let Some(val) = env_name.as_deref().and_then(&env) {
        return Ok(SecretString::from(val));
    }

    // 2. System keyring
    if let Ok(entry) = keyring_entry(profile_name, kind) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    if let Some(val) = plaintext {
        return Ok(SecretString::from(val.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
        what: kind.label(),
    })
}

pub fn resolve_api_key(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    resolve_credential_with(profile, profile_name, CredentialKind::ApiKey, |k| {
        std::env::var(k).ok()
    })
}

pub fn resolve_api_secret(
    profile: &Profile,
    profile_name: &str,
) -> Result<SecretString, ConfigError> {
    resolve_credential_with(profile, profile_name, CredentialKind::ApiSecret, |k| {
        std::env::var(k).ok()
    })
}

/// Store a credential in the system keyring.
pub fn store_credential(
    profile_name: &str,
    kind: CredentialKind,
    value: &str,
) -> Result<(), ConfigError> {
    keyring_entry(profile_name, kind)?.set_password(value)?;
    Ok(())
}

/// Parse a profile endpoint as an absolute URL.
pub fn parse_endpoint(endpoint: &str) -> Result<url::Url, ConfigError> {
    let url: url::Url = endpoint.trim().parse().map_err(|e| ConfigError::Validation {
        field: "endpoint".into(),
        reason: format!("invalid URL '{endpoint}': {e}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "endpoint".into(),
            reason: format!("expected an http(s) URL, got '{endpoint}'"),
        });
    }
    Ok(url)
}

/// TLS strategy for a profile: `insecure` wins, then a custom CA, then
/// the system store.
pub fn profile_tls(profile: &Profile, defaults: &Defaults) -> TlsVerification {
    if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    }
}

/// Build a `ControllerConfig` from a profile, no CLI flag overrides.
pub fn profile_to_controller_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ControllerConfig, ConfigError> {
    let url = parse_endpoint(&profile.endpoint)?;
    let api_key = resolve_api_key(profile, profile_name)?;
    let api_secret = resolve_api_secret(profile, profile_name)?;

    Ok(ControllerConfig {
        url,
        api_key,
        api_secret,
        tls: profile_tls(profile, defaults),
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    fn profile() -> Profile {
        Profile {
            endpoint: "https://fw.example.com".into(),
            api_key: Some("plain-key".into()),
            api_key_env: Some("FW_KEY".into()),
            api_secret: Some("plain-secret".into()),
            ..Profile::default()
        }
    }

    #[test]
    fn env_var_wins_over_plaintext() {
        let key = resolve_credential_with(&profile(), "test-env", CredentialKind::ApiKey, |k| {
            (k == "FW_KEY").then(|| "env-key".to_owned())
        })
        .unwrap();
        assert_eq!(key.expose_secret(), "env-key");
    }

    #[test]
    fn missing_env_falls_back_to_plaintext() {
        let secret = resolve_credential_with(
            &profile(),
            "test-plaintext",
            CredentialKind::ApiSecret,
            |_| None,
        )
        .unwrap();
        assert_eq!(secret.expose_secret(), "plain-secret");
    }

    #[test]
    fn no_credential_is_an_error() {
        let err = resolve_credential_with(
            &Profile::default(),
            "test-none",
            CredentialKind::ApiSecret,
            |_| None,
        )
        .unwrap_err();
        assert!(err.to_string().contains("API secret"));
    }

    #[test]
    fn loads_profiles_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_profile = "home"

[defaults]
timeout = 10

[profiles.home]
endpoint = "https://192.168.1.1"
api_key_env = "HOME_FW_KEY"
insecure = true
"#,
        )
        .unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.default_profile.as_deref(), Some("home"));
        assert_eq!(cfg.defaults.timeout, 10);
        assert_eq!(cfg.defaults.output, "table");
        let home = &cfg.profiles["home"];
        assert_eq!(home.endpoint, "https://192.168.1.1");
        assert_eq!(
            profile_tls(home, &cfg.defaults),
            TlsVerification::DangerAcceptInvalid
        );
    }

    #[test]
    fn save_then_load_keeps_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.profiles.insert("lab".into(), profile());
        save_config_to(&cfg, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(!text.contains("ca_cert"));

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.profiles["lab"].api_key_env.as_deref(), Some("FW_KEY"));
    }

    #[test]
    fn endpoint_must_be_http_url() {
        assert!(parse_endpoint("https://fw.example.com").is_ok());
        assert!(parse_endpoint("fw.example.com").is_err());
        assert!(parse_endpoint("ftp://fw.example.com").is_err());
    }

    #[test]
    fn tls_defaults_to_system_store() {
        let p = Profile {
            ca_cert: Some("/etc/ssl/fw.pem".into()),
            ..Profile::default()
        };
        assert_eq!(
            profile_tls(&p, &Defaults::default()),
            TlsVerification::CustomCa("/etc/ssl/fw.pem".into())
        );
        assert_eq!(
            profile_tls(&Profile::default(), &Defaults::default()),
            TlsVerification::SystemDefaults
        );
    }
}
