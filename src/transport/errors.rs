//! Transport error types.

use std::time::Duration;
use thiserror::Error;

/// Failure to obtain an HTTP response at all.
///
/// Non-2xx statuses are not transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Failed to build HTTP client.
    #[error("Failed to build HTTP client: {0}")]
    BuildHttpClient(#[source] reqwest::Error),

    /// The request did not complete within the timeout.
    #[error("Request timeout after {}ms", timeout.as_millis())]
    Timeout { timeout: Duration },

    /// Failed to send HTTP request.
    #[error("{0}")]
    HttpRequest(#[from] reqwest_middleware::Error),

    /// Failed to read the response body.
    #[error("Failed to read response body: {0}")]
    ReadBody(#[source] reqwest::Error),

    /// Any other failure reported by a custom transport.
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
