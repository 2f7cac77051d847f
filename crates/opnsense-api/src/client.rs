// OPNsense management API HTTP client
//
// Wraps `reqwest::Client` with the fixed `<endpoint>/api/` base, HTTP Basic
// authentication (API key + secret), and low-level failure classification.
// Object-type operations (aliases, rules, etc.) are implemented as inherent
// methods in `resources/` to keep this module focused on transport mechanics.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::{TlsMode, TransportConfig};

const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

/// Fixed path segment every management API call lives under.
pub const API_PREFIX: &str = "api/";

// ── Configuration ────────────────────────────────────────────────────

/// Everything needed to construct a [`Client`]. Immutable once built.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Firewall base URL (e.g. `https://fw.example.com`), without `/api`.
    pub endpoint: String,
    pub api_key: SecretString,
    pub api_secret: SecretString,
    pub timeout: Duration,
    pub tls: TlsMode,
}

impl ClientConfig {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: SecretString,
        api_secret: SecretString,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key,
            api_secret,
            timeout: Duration::from_secs(30),
            tls: TlsMode::System,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_tls(mut self, tls: TlsMode) -> Self {
        self.tls = tls;
        self
    }
}

// ── Raw response ─────────────────────────────────────────────────────

/// Status and body of a completed request, left uninterpreted.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// Body as text (lossy for binary payloads).
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Fail with `UnexpectedStatus` unless the status is exactly 200.
    pub fn ensure_ok(self) -> Result<Self, Error> {
        if self.status == StatusCode::OK {
            Ok(self)
        } else {
            let text = self.text();
            Err(Error::UnexpectedStatus {
                status: self.status.as_u16(),
                body: preview(&text).to_owned(),
            })
        }
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        decode(&self.body)
    }
}

/// Decode a JSON body, keeping the raw text on failure.
pub(crate) fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, Error> {
    serde_json::from_slice(body).map_err(|e| {
        let text = String::from_utf8_lossy(body).into_owned();
        Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&text)),
            body: text,
        }
    })
}

fn preview(text: &str) -> &str {
    match text.char_indices().nth(200) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// ── Client ───────────────────────────────────────────────────────────

/// Authenticated client for the OPNsense management API.
///
/// Every call is a single round trip: no retries, no backoff. HTTP 403 is
/// surfaced as [`Error::Authentication`]; all other statuses are returned
/// to the caller for interpretation.
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
    api_key: SecretString,
    api_secret: SecretString,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl Client {
    // ── Constructors ─────────────────────────────────────────────────

    /// Validate the configuration and build the underlying HTTP client.
    pub fn new(config: &ClientConfig) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(&config.endpoint)?;
        Self::validate_credentials(&config.api_key, &config.api_secret)?;

        let transport = TransportConfig {
            tls: config.tls.clone(),
            timeout: config.timeout,
        };
        let http = transport.build_client()?;

        Ok(Self {
            http,
            base_url,
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
        })
    }

    /// Wrap an existing `reqwest::Client` (caller manages TLS and timeouts).
    pub fn from_reqwest(
        endpoint: &str,
        http: reqwest::Client,
        api_key: SecretString,
        api_secret: SecretString,
    ) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(endpoint)?;
        Self::validate_credentials(&api_key, &api_secret)?;
        Ok(Self {
            http,
            base_url,
            api_key,
            api_secret,
        })
    }

    /// Trim trailing slashes and append `/api/`.
    ///
    /// `https://fw.example.com/` becomes `https://fw.example.com/api/`.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let trimmed = raw.trim().trim_end_matches('/');
        let url = Url::parse(&format!("{trimmed}/{API_PREFIX}")).map_err(|e| {
            Error::Configuration {
                message: format!("endpoint '{raw}' is not an absolute URL: {e}"),
            }
        })?;

        if url.cannot_be_a_base() || url.host_str().is_none_or(str::is_empty) {
            return Err(Error::Configuration {
                message: format!("endpoint '{raw}' is not an absolute URL"),
            });
        }

        Ok(url)
    }

    fn validate_credentials(key: &SecretString, secret: &SecretString) -> Result<(), Error> {
        if key.expose_secret().trim().is_empty() {
            return Err(Error::Configuration {
                message: "API key must not be empty".into(),
            });
        }
        if secret.expose_secret().trim().is_empty() {
            return Err(Error::Configuration {
                message: "API secret must not be empty".into(),
            });
        }
        Ok(())
    }

    /// The resolved base URL, always ending in `/api/`.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Concatenate a relative path (slashes trimmed) onto the base URL.
    fn url(&self, path: &str) -> Result<Url, Error> {
        let path = path.trim_matches('/');
        Ok(Url::parse(&format!("{}{path}", self.base_url))?)
    }

    // ── Transport ────────────────────────────────────────────────────

    /// Perform one authenticated request against a relative API path.
    ///
    /// Only `GET` and `POST` are accepted; anything else fails before any
    /// I/O. A body is sent for `POST` only.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<ApiResponse, Error> {
        if method != Method::GET && method != Method::POST {
            return Err(Error::UnsupportedMethod(method.to_string()));
        }

        let url = self.url(path)?;
        debug!("{method} {url}");

        let is_post = method == Method::POST;
        let mut builder = self
            .http
            .request(method, url)
            .basic_auth(
                self.api_key.expose_secret(),
                Some(self.api_secret.expose_secret()),
            );

        if is_post {
            builder = builder.header(CONTENT_TYPE, JSON_CONTENT_TYPE);
            if let Some(body) = body {
                builder = builder.body(serde_json::to_vec(body)?);
            }
        }

        let resp = builder.send().await.map_err(Error::Transport)?;
        let status = resp.status();

        if status == StatusCode::FORBIDDEN {
            return Err(Error::Authentication {
                path: path.trim_matches('/').to_owned(),
            });
        }

        let body = resp.bytes().await.map_err(Error::Transport)?.to_vec();
        trace!(status = status.as_u16(), bytes = body.len(), "response received");

        Ok(ApiResponse { status, body })
    }

    // ── Typed helpers ────────────────────────────────────────────────

    /// GET and decode a 200 JSON response.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        self.request(Method::GET, path, None)
            .await?
            .ensure_ok()?
            .json()
    }

    /// POST a JSON body and decode a 200 JSON response.
    pub async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let body = serde_json::to_value(body)?;
        self.request(Method::POST, path, Some(&body))
            .await?
            .ensure_ok()?
            .json()
    }

    /// POST without a body (delete, apply) and decode a 200 JSON response.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        self.request(Method::POST, path, None)
            .await?
            .ensure_ok()?
            .json()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(endpoint: &str, key: &str, secret: &str) -> ClientConfig {
        ClientConfig::new(
            endpoint,
            SecretString::from(key.to_owned()),
            SecretString::from(secret.to_owned()),
        )
    }

    #[test]
    fn base_url_gets_api_suffix() {
        let client = Client::new(&config("https://fw.example.com", "key", "secret")).unwrap();
        assert_eq!(client.base_url().as_str(), "https://fw.example.com/api/");
    }

    #[test]
    fn trailing_slashes_are_trimmed() {
        let client = Client::new(&config("https://fw.example.com///", "key", "secret")).unwrap();
        assert_eq!(client.base_url().as_str(), "https://fw.example.com/api/");
    }

    #[test]
    fn endpoint_path_is_preserved() {
        let client = Client::new(&config("https://fw.example.com:8443/opn", "k", "s")).unwrap();
        assert_eq!(client.base_url().as_str(), "https://fw.example.com:8443/opn/api/");
    }

    #[test]
    fn relative_endpoint_is_rejected() {
        let err = Client::new(&config("fw.example.com", "key", "secret")).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }), "got {err:?}");
    }

    #[test]
    fn empty_key_is_rejected() {
        let err = Client::new(&config("https://fw.example.com", "", "secret")).unwrap_err();
        assert!(
            matches!(err, Error::Configuration { ref message } if message.contains("key")),
            "got {err:?}"
        );
    }

    #[test]
    fn empty_secret_is_rejected() {
        let err = Client::new(&config("https://fw.example.com", "key", "")).unwrap_err();
        assert!(
            matches!(err, Error::Configuration { ref message } if message.contains("secret")),
            "got {err:?}"
        );
    }

    #[test]
    fn request_path_slashes_are_trimmed() {
        let client = Client::new(&config("https://fw.example.com", "key", "secret")).unwrap();
        let url = client.url("/firewall/alias/getItem/abc/").unwrap();
        assert_eq!(
            url.as_str(),
            "https://fw.example.com/api/firewall/alias/getItem/abc"
        );
    }

    #[test]
    fn non_ok_status_is_unexpected() {
        let resp = ApiResponse {
            status: StatusCode::BAD_GATEWAY,
            body: b"upstream down".to_vec(),
        };
        let err = resp.ensure_ok().unwrap_err();
        assert!(matches!(err, Error::UnexpectedStatus { status: 502, .. }));
    }
}
