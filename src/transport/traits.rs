//! Transport trait definition.

use super::errors::TransportError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::future::Future;
use std::time::Duration;
use url::Url;

/// HTTP methods used by drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl Display for HttpMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outbound HTTP request built by a driver.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: BTreeMap<String, String>,
    /// JSON body, if any.
    pub body: Option<Value>,
    /// Per-request timeout overriding the transport default.
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    /// Create a GET request without headers or body.
    pub fn get(url: Url) -> Self {
        Self {
            method: HttpMethod::Get,
            url,
            headers: BTreeMap::new(),
            body: None,
            timeout: None,
        }
    }

    /// Create a POST request with a JSON body.
    pub fn post(url: Url, body: Value) -> Self {
        Self {
            method: HttpMethod::Post,
            url,
            headers: BTreeMap::new(),
            body: Some(body),
            timeout: None,
        }
    }

    /// Replace the request headers.
    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    /// Set a per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// HTTP response handed back to a driver.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    /// Lowercased header names.
    pub headers: BTreeMap<String, String>,
    /// Decoded JSON body, or the raw text as a string value.
    pub data: Value,
}

impl HttpResponse {
    /// Whether the status is below 400.
    pub fn is_success(&self) -> bool {
        self.status < 400
    }
}

/// HTTP collaborator injected into drivers.
///
/// Implementations must fail on network errors and timeouts, and must not
/// fail on non-2xx statuses: the caller inspects [`HttpResponse::status`].
///
/// # Example
///
/// ```rust,ignore
/// use sms_drivers::transport::{HttpRequest, HttpResponse, Transport, TransportError};
///
/// #[derive(Clone)]
/// struct CannedTransport;
///
/// impl Transport for CannedTransport {
///     async fn request(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
///         Ok(HttpResponse {
///             status: 200,
///             status_text: "OK".into(),
///             headers: Default::default(),
///             data: serde_json::json!({"status": 1}),
///         })
///     }
/// }
/// ```
pub trait Transport: Send + Sync + Clone {
    /// Perform a single request.
    fn request(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}
