//! Shared upstream provider plumbing.
//!
//! Both the screener and the ticker providers are plain HTTP/JSON services.
//! This module holds the error type they report and the pooled client they
//! share construction logic for.

use std::time::Duration;

/// User agent sent to upstream providers; some reject requests without one.
const USER_AGENT: &str = concat!("market-proxy/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Provider Error
// ============================================================================

/// Errors reported by upstream providers.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    /// Connection failed, timed out, or the request could not be sent
    #[error("Network error: {0}")]
    Network(String),

    /// Provider answered with a failure status or an error payload
    #[error("Upstream error (HTTP {status}): {message}")]
    Upstream { status: u16, message: String },

    /// Provider answered but the body was not the expected shape
    #[error("Failed to decode upstream response: {0}")]
    Decode(String),

    /// Provider has no data for the requested symbol
    #[error("{0}")]
    DataNotAvailable(String),
}

impl ProviderError {
    /// Classify a transport-level reqwest error.
    pub fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Network("Request timeout".into())
        } else if e.is_connect() {
            Self::Network("Connection failed".into())
        } else if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

/// Build the pooled HTTP client used by a provider.
pub fn build_http_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Falling back to default HTTP client");
            reqwest::Client::new()
        })
}

/// Join a base URL and a path without doubling or dropping slashes.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
