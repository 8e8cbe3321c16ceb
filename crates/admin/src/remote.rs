//! Remote API of an integrated installation.
//!
//! Dual login relies on every participating site exposing an API endpoint
//! that shares the cookie domain. Validation pings that endpoint with the
//! host's shared secret.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::{debug, warn};

/// Header carrying the unix timestamp that was signed.
pub const TIMESTAMP_HEADER: &str = "X-Userbridge-Timestamp";

/// Header carrying `sha256=<hex hmac>` of the timestamp.
pub const SIGNATURE_HEADER: &str = "X-Userbridge-Signature";

/// Outcome of a failed ping, with the remote's own explanation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingFailure {
    pub message: String,
}

impl PingFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Client for the remote API of an integrated installation.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// Resolve the API base URL serving a cookie domain, if any.
    fn api_url(&self, cookie_domain: &str) -> Option<String>;

    /// Probe the API at `url`, authenticating with `secret`.
    async fn ping(&self, url: &str, secret: &str) -> Result<(), PingFailure>;
}

/// Strip scheme and leading dots so `.example.com` and
/// `https://example.com` resolve to the same endpoint.
fn domain_key(domain: &str) -> String {
    let domain = domain
        .trim()
        .trim_start_matches("http://")
        .trim_start_matches("https://");
    domain
        .trim_start_matches('.')
        .trim_end_matches('/')
        .to_lowercase()
}

/// Compute the hex HMAC-SHA256 of `payload` keyed by `secret`.
pub fn sign(secret: &str, payload: &str) -> Result<String> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).context("invalid secret key")?;
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// [`RemoteApi`] over HTTP.
///
/// Endpoints are configured per cookie domain. A ping is
/// `GET <url>ping` signed with the shared secret; any 2xx answer is success.
#[derive(Clone)]
pub struct HttpRemoteApi {
    client: reqwest::Client,
    endpoints: HashMap<String, String>,
}

impl HttpRemoteApi {
    /// Create a client with the given request timeout.
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap_or_default();

        Self {
            client,
            endpoints: HashMap::new(),
        }
    }

    /// Register the API base URL serving a cookie domain.
    pub fn with_endpoint(mut self, domain: &str, url: impl Into<String>) -> Self {
        let mut url = url.into();
        if !url.ends_with('/') {
            url.push('/');
        }
        self.endpoints.insert(domain_key(domain), url);
        self
    }

    /// Register several endpoints at once.
    pub fn with_endpoints<'a>(
        self,
        endpoints: impl IntoIterator<Item = (&'a String, &'a String)>,
    ) -> Self {
        endpoints
            .into_iter()
            .fold(self, |api, (domain, url)| api.with_endpoint(domain, url.as_str()))
    }
}

#[async_trait]
impl RemoteApi for HttpRemoteApi {
    fn api_url(&self, cookie_domain: &str) -> Option<String> {
        let key = domain_key(cookie_domain);
        if key.is_empty() {
            return None;
        }
        self.endpoints.get(&key).cloned()
    }

    async fn ping(&self, url: &str, secret: &str) -> Result<(), PingFailure> {
        let timestamp = chrono::Utc::now().timestamp().to_string();

        let mut request = self
            .client
            .get(format!("{url}ping"))
            .header("User-Agent", "Userbridge-Admin/1.0")
            .header(TIMESTAMP_HEADER, &timestamp);

        if secret.is_empty() {
            warn!(url = %url, "pinging remote API without a shared secret");
        } else {
            let signature = sign(secret, &timestamp).map_err(|e| PingFailure::new(e.to_string()))?;
            request = request.header(SIGNATURE_HEADER, format!("sha256={signature}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| PingFailure::new(format!("request failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            debug!(url = %url, "remote API answered ping");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

        Err(PingFailure::new(message))
    }
}
