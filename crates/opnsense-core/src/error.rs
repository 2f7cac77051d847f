// ── Core error types ──
//
// User-facing errors from opnsense-core. Every variant that stems from an
// API call names the operation and the object kind it was acting on, so
// consumers can print the error as-is. The raw transport error never leaks.

use std::time::Duration;

use strum::{AsRefStr, Display};
use thiserror::Error;

use opnsense_api::{Error as ApiError, Validations};

/// The lifecycle step an error or diagnostic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    List,
    Apply,
    Lookup,
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to firewall at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("{operation} {entity_type}: authentication failed: {message}")]
    AuthenticationFailed {
        operation: Operation,
        entity_type: String,
        message: String,
    },

    #[error("{operation} {entity_type}: request timed out after {timeout_secs}s")]
    Timeout {
        operation: Operation,
        entity_type: String,
        timeout_secs: u64,
    },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{entity_type} '{identifier}' not found")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    #[error("{operation} {entity_type}: rejected by OPNsense:\n{validations}")]
    ValidationFailed {
        operation: Operation,
        entity_type: String,
        validations: Validations,
    },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("{operation} {entity_type}: {message}")]
    OperationFailed {
        operation: Operation,
        entity_type: String,
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Where an API error happened.
#[derive(Debug, Clone, Copy)]
pub struct ErrorContext<'a> {
    pub operation: Operation,
    pub entity_type: &'a str,
    pub timeout: Duration,
}

impl CoreError {
    /// Translate a transport-layer error, tagging it with its context.
    pub fn from_api(ctx: ErrorContext<'_>, err: ApiError) -> Self {
        let operation = ctx.operation;
        let entity_type = ctx.entity_type.to_owned();

        match err {
            ApiError::Configuration { message } => CoreError::Config { message },
            ApiError::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            ApiError::UnsupportedMethod(method) => {
                CoreError::Internal(format!("unsupported HTTP method {method}"))
            }
            ApiError::Transport(ref e) if e.is_timeout() => CoreError::Timeout {
                operation,
                entity_type,
                timeout_secs: ctx.timeout.as_secs(),
            },
            ApiError::Transport(ref e) if e.is_connect() => CoreError::ConnectionFailed {
                url: e
                    .url()
                    .map(|u| u.origin().ascii_serialization())
                    .unwrap_or_else(|| "<unknown>".into()),
                reason: e.to_string(),
            },
            // Raised while building the client, before any address is dialled.
            ApiError::Tls(msg) => CoreError::Config {
                message: format!("TLS setup failed: {msg}"),
            },
            ApiError::Authentication { path } => CoreError::AuthenticationFailed {
                operation,
                entity_type,
                message: format!(
                    "API key/secret rejected or lacking privileges for '{path}' (HTTP 403)"
                ),
            },
            ApiError::Validation(validations) => CoreError::ValidationFailed {
                operation,
                entity_type,
                validations,
            },
            ApiError::NotFound { kind, id } => CoreError::NotFound {
                entity_type: kind.to_owned(),
                identifier: id,
            },
            other => {
                let status = other.status();
                CoreError::OperationFailed {
                    operation,
                    entity_type,
                    message: other.to_string(),
                    status,
                }
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Field-level messages, if OPNsense rejected the payload.
    pub fn validations(&self) -> Option<&Validations> {
        match self {
            Self::ValidationFailed { validations, .. } => Some(validations),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(operation: Operation) -> ErrorContext<'static> {
        ErrorContext {
            operation,
            entity_type: "alias",
            timeout: Duration::from_secs(30),
        }
    }

    #[test]
    fn validation_error_is_prefixed_with_operation_and_kind() {
        let validations: Validations = [("alias.name".to_owned(), "required".to_owned())]
            .into_iter()
            .collect();
        let err = CoreError::from_api(ctx(Operation::Create), ApiError::Validation(validations));
        let text = err.to_string();
        assert!(text.starts_with("create alias: rejected by OPNsense"), "{text}");
        assert!(text.contains("alias.name: required"), "{text}");
    }

    #[test]
    fn authentication_keeps_context() {
        let err = CoreError::from_api(
            ctx(Operation::Read),
            ApiError::Authentication {
                path: "firewall/alias/getItem/x".into(),
            },
        );
        assert!(matches!(err, CoreError::AuthenticationFailed { operation: Operation::Read, .. }));
        assert!(err.to_string().starts_with("read alias: authentication failed"));
    }

    #[test]
    fn other_api_errors_become_operation_failures() {
        let err = CoreError::from_api(
            ctx(Operation::Delete),
            ApiError::UnexpectedStatus {
                status: 502,
                body: "bad gateway".into(),
            },
        );
        match err {
            CoreError::OperationFailed {
                operation, status, ..
            } => {
                assert_eq!(operation, Operation::Delete);
                assert_eq!(status, Some(502));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn tls_setup_failure_is_a_config_error() {
        let err = CoreError::from_api(
            ctx(Operation::List),
            ApiError::Tls("invalid CA cert: bad PEM".into()),
        );
        match err {
            CoreError::Config { message } => {
                assert_eq!(message, "TLS setup failed: invalid CA cert: bad PEM");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn not_found_passes_through() {
        let err = CoreError::from_api(
            ctx(Operation::Read),
            ApiError::NotFound {
                kind: "alias",
                id: "x".into(),
            },
        );
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "alias 'x' not found");
    }
}
