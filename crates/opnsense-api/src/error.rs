use thiserror::Error;

use crate::envelope::Validations;

/// Top-level error type for the `opnsense-api` crate.
///
/// Covers every failure mode of the management API: client construction,
/// transport, authentication, response envelopes, and payload decoding.
/// `opnsense-core` maps these into operation-scoped diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Configuration ───────────────────────────────────────────────
    /// Invalid client construction input (bad endpoint, missing credentials).
    #[error("Invalid client configuration: {message}")]
    Configuration { message: String },

    /// URL parsing error while building a request URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Only GET and POST are spoken by the OPNsense API.
    #[error("Unsupported HTTP method {0}: only GET and POST are allowed")]
    UnsupportedMethod(String),

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// TLS setup or certificate loading error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Authentication ──────────────────────────────────────────────
    /// HTTP 403: the key/secret pair is wrong or lacks the privilege.
    #[error("Authentication failed (HTTP 403) for {path}")]
    Authentication { path: String },

    // ── Status ──────────────────────────────────────────────────────
    /// Any non-200 status not otherwise special-cased.
    #[error("Unexpected HTTP status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    // ── Envelopes ───────────────────────────────────────────────────
    /// OPNsense rejected the payload (`result == "failed"`).
    #[error("Validation failed:\n{0}")]
    Validation(Validations),

    /// The object does not exist on the firewall.
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    /// A result envelope carried a value we do not recognise.
    #[error("Unexpected result '{result}'")]
    UnexpectedResult { result: String },

    /// Configuration was saved but the apply/reconfigure call failed.
    #[error("Failed to apply configuration (status '{status}')")]
    ApplyConfig { status: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// Request body could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A response field held a value outside the known option set.
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

impl Error {
    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if the credentials were rejected.
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Field-level validation messages, if OPNsense rejected the payload.
    pub fn validations(&self) -> Option<&Validations> {
        match self {
            Self::Validation(v) => Some(v),
            _ => None,
        }
    }

    /// HTTP status code carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Authentication { .. } => Some(403),
            Self::UnexpectedStatus { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
