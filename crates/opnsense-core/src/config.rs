// ── Runtime connection configuration ──
//
// These types describe *how* to reach an OPNsense firewall. They carry
// credentials and connection tuning but never touch disk; the CLI builds a
// `ControllerConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use opnsense_api::{ClientConfig, TlsMode};

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed web GUI certificate).
    DangerAcceptInvalid,
}

impl From<&TlsVerification> for TlsMode {
    fn from(tls: &TlsVerification) -> Self {
        match tls {
            TlsVerification::SystemDefaults => Self::System,
            TlsVerification::CustomCa(path) => Self::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => Self::DangerAcceptInvalid,
        }
    }
}

/// Configuration for connecting to a single firewall.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Firewall URL (e.g. `https://192.168.1.1`), without `/api`.
    pub url: Url,
    pub api_key: SecretString,
    pub api_secret: SecretString,
    pub tls: TlsVerification,
    /// Client-wide request timeout.
    pub timeout: Duration,
}

impl ControllerConfig {
    pub fn new(url: Url, api_key: SecretString, api_secret: SecretString) -> Self {
        Self {
            url,
            api_key,
            api_secret,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
        }
    }

    pub(crate) fn client_config(&self) -> ClientConfig {
        ClientConfig::new(
            self.url.as_str(),
            self.api_key.clone(),
            self.api_secret.clone(),
        )
        .with_timeout(self.timeout)
        .with_tls(TlsMode::from(&self.tls))
    }
}
