//! Failures of a single gateway round trip.

use crate::transport::TransportError;
use crate::types::Response;
use serde_json::Value;
use thiserror::Error;

/// Error code for HTTP-level, transport-level and decoding failures.
pub const VERIFY_FAILED: &str = "VERIFY_FAILED";

/// Why a gateway call did not produce a usable provider body.
///
/// Never returned from [`Driver::verify`](super::Driver::verify): drivers turn
/// it into a failed [`Response`] via [`DispatchError::into_response`].
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Failed to encode query string: {0}")]
    EncodeQuery(#[from] serde_urlencoded::ser::Error),

    #[error("Failed to encode request body: {0}")]
    EncodeBody(#[from] serde_json::Error),

    #[error("HTTP {status}: {status_text}")]
    Status {
        status: u16,
        status_text: String,
        /// Body sent along with the error status.
        body: Value,
    },

    #[error("HTTP request failed: {0}")]
    Transport(#[from] TransportError),

    #[error("Unexpected response body: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
        body: Value,
    },
}

impl DispatchError {
    /// Body the gateway returned, if any.
    pub fn body(&self) -> Option<&Value> {
        match self {
            Self::Status { body, .. } | Self::Decode { body, .. } => Some(body),
            Self::InvalidUrl(_)
            | Self::EncodeQuery(_)
            | Self::EncodeBody(_)
            | Self::Transport(_) => None,
        }
    }

    /// Fold into a failed response with [`VERIFY_FAILED`].
    pub fn into_response(self) -> Response {
        let message = self.to_string();
        let data = self.body().cloned();
        Response::failure(message, Some(VERIFY_FAILED.to_string()), data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_status_error_keeps_body() {
        let err = DispatchError::Status {
            status: 503,
            status_text: "Service Unavailable".into(),
            body: json!({"message": "down"}),
        };
        let response = err.into_response();

        assert!(!response.is_success());
        assert_eq!(response.error(), Some("HTTP 503: Service Unavailable"));
        assert_eq!(response.error_code(), Some(VERIFY_FAILED));
        assert_eq!(response.data(), Some(&json!({"message": "down"})));
    }

    #[test]
    fn test_timeout_message() {
        let err = DispatchError::from(TransportError::Timeout {
            timeout: Duration::from_millis(1500),
        });
        let response = err.into_response();

        assert_eq!(
            response.error(),
            Some("HTTP request failed: Request timeout after 1500ms")
        );
        assert!(response.data().is_none());
    }

    #[test]
    fn test_custom_transport_failure_message() {
        let err = DispatchError::from(TransportError::Other("connection reset".into()));
        assert!(err.body().is_none());
        assert_eq!(
            err.into_response().error(),
            Some("HTTP request failed: connection reset")
        );
    }
}
