//! Default transport built on `reqwest` with middleware support.

use super::errors::TransportError;
use super::traits::{HttpMethod, HttpRequest, HttpResponse, Transport};
use reqwest::header::CONTENT_TYPE;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

#[cfg(feature = "tracing")]
use tracing::debug;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// HTTP transport backed by a [`ClientWithMiddleware`].
///
/// # Example
///
/// ```rust,ignore
/// use sms_drivers::transport::ReqwestTransport;
/// use std::time::Duration;
///
/// let transport = ReqwestTransport::builder()
///     .timeout(Duration::from_secs(5))
///     .build()?;
/// ```
#[derive(Clone)]
pub struct ReqwestTransport {
    http_client: ClientWithMiddleware,
    timeout: Duration,
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Builder for configuring a [`ReqwestTransport`].
#[derive(Default)]
pub struct ReqwestTransportBuilder {
    timeout: Option<Duration>,
    http_client: Option<ClientWithMiddleware>,
}

impl ReqwestTransportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default timeout applied to requests without their own.
    ///
    /// Default: 10 seconds
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set a custom HTTP client with middleware.
    pub fn http_client(mut self, client: ClientWithMiddleware) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Build the [`ReqwestTransport`].
    pub fn build(self) -> Result<ReqwestTransport, TransportError> {
        let http_client = match self.http_client {
            Some(client) => client,
            None => {
                let client = reqwest::Client::builder()
                    .build()
                    .map_err(TransportError::BuildHttpClient)?;
                ClientBuilder::new(client).build()
            }
        };

        Ok(ReqwestTransport {
            http_client,
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
        })
    }
}

impl ReqwestTransport {
    /// Create a transport with the given default timeout.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        Self::builder().timeout(timeout).build()
    }

    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::new()
    }

    /// Default timeout for requests.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn map_send_error(err: reqwest_middleware::Error, timeout: Duration) -> TransportError {
        match err {
            reqwest_middleware::Error::Reqwest(ref e) if e.is_timeout() => {
                TransportError::Timeout { timeout }
            }
            other => TransportError::HttpRequest(other),
        }
    }
}

fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
    }
}

/// Decode a body as JSON when the content type says so, otherwise keep the text.
fn decode_body(content_type: Option<&str>, text: String) -> Value {
    let is_json = content_type.is_some_and(|ct| ct.contains("application/json"));
    if is_json {
        if let Ok(value) = serde_json::from_str(&text) {
            return value;
        }
    }
    Value::String(text)
}

impl Transport for ReqwestTransport {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "ReqwestTransport::request",
            skip_all,
            fields(method = %request.method, host = request.url.host_str().unwrap_or_default())
        )
    )]
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let timeout = request.timeout.unwrap_or(self.timeout);

        let mut builder = self
            .http_client
            .request(to_reqwest_method(request.method), request.url)
            .timeout(timeout);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Self::map_send_error(e, timeout))?;

        let status = response.status();
        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();

        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout { timeout }
            } else {
                TransportError::ReadBody(e)
            }
        })?;

        let data = decode_body(headers.get(CONTENT_TYPE.as_str()).map(String::as_str), text);

        #[cfg(feature = "tracing")]
        debug!(status = status.as_u16(), "HTTP response received");

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            data,
        })
    }
}
