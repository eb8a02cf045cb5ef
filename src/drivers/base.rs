//! Building blocks shared by the gateway drivers.

use super::errors::DispatchError;
use crate::errors::{Result, SmsError};
use crate::transport::{HttpRequest, Transport};
use crate::types::{Message, Response, Tokens};
use crate::utils::is_valid_phone_number;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use url::Url;

#[cfg(feature = "tracing")]
use opentelemetry::trace::Status;
#[cfg(feature = "tracing")]
use tracing::Span;
#[cfg(feature = "tracing")]
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Client identifier sent as `User-Agent`.
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Check the shape every message must have before it may reach a gateway.
pub fn validate_message(message: &Message) -> Result<()> {
    if message.to.trim().is_empty() {
        return Err(SmsError::validation("Recipient phone number is required"));
    }

    let has_content = message.content.as_deref().is_some_and(|c| !c.is_empty());
    let has_template = message.template.as_deref().is_some_and(|t| !t.is_empty());

    if !has_content && !has_template {
        return Err(SmsError::validation(
            "Either content or template must be provided",
        ));
    }

    if has_template && message.tokens.as_ref().is_none_or(Tokens::is_empty) {
        return Err(SmsError::validation(
            "Tokens are required when using templates",
        ));
    }

    if !is_valid_phone_number(&message.to) {
        return Err(SmsError::validation("Invalid phone number format"));
    }

    Ok(())
}

/// Template id and tokens of a verification message.
///
/// A content-only message yields a `MISSING_TEMPLATE` failure instead.
pub fn require_template(message: &Message) -> std::result::Result<(&str, &Tokens), Response> {
    let template = message
        .template
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            Response::failure(
                "Template is required for verify operation",
                Some("MISSING_TEMPLATE".to_string()),
                None,
            )
        })?;

    let tokens = message.tokens.as_ref().ok_or_else(|| {
        Response::failure(
            "Tokens are required for verify operation",
            Some("MISSING_TOKENS".to_string()),
            None,
        )
    })?;

    Ok((template, tokens))
}

/// Join a base URL and an endpoint with exactly one slash between them.
pub fn build_url(base: &str, endpoint: &str) -> std::result::Result<Url, url::ParseError> {
    let base = base.strip_suffix('/').unwrap_or(base);
    let endpoint = endpoint.strip_prefix('/').unwrap_or(endpoint);
    Url::parse(&format!("{base}/{endpoint}"))
}

/// Default JSON headers with the client identifier.
pub fn default_headers() -> BTreeMap<String, String> {
    build_headers(std::iter::empty::<(String, String)>())
}

/// Default JSON headers plus `extra`, which may override them.
pub fn build_headers<I, K, V>(extra: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let mut headers = BTreeMap::from([
        ("Content-Type".to_string(), "application/json".to_string()),
        ("Accept".to_string(), "application/json".to_string()),
        ("User-Agent".to_string(), USER_AGENT.to_string()),
    ]);
    headers.extend(extra.into_iter().map(|(k, v)| (k.into(), v.into())));
    headers
}

/// Best-effort message id lookup for bodies without a known shape.
///
/// Drivers fall back to it when the provider omits its usual id field.
///
/// Probes `messageId`, `id` and `message_id`, then `data.messageId` and
/// `data.id`. Only string values count.
pub fn extract_message_id(body: &Value) -> Option<String> {
    let top = ["messageId", "id", "message_id"]
        .iter()
        .find_map(|key| body.get(key).filter(|v| is_present(v)));

    let nested = || {
        let data = body.get("data").filter(|d| d.is_object())?;
        ["messageId", "id"]
            .iter()
            .find_map(|key| data.get(key).filter(|v| is_present(v)))
    };

    top.or_else(nested)
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Stringify a scalar id, accepting both strings and numbers.
pub(crate) fn id_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Perform one request and return the body of a non-error response.
pub(crate) async fn dispatch<T: Transport>(
    transport: &T,
    request: HttpRequest,
) -> std::result::Result<Value, DispatchError> {
    let response = transport.request(request).await?;

    if !response.is_success() {
        return Err(DispatchError::Status {
            status: response.status,
            status_text: response.status_text,
            body: response.data,
        });
    }

    Ok(response.data)
}

/// Decode a provider body into its wire type, keeping the raw body on failure.
pub(crate) fn decode<W: DeserializeOwned>(body: &Value) -> std::result::Result<W, DispatchError> {
    W::deserialize(body).map_err(|source| DispatchError::Decode {
        source,
        body: body.clone(),
    })
}

/// Mark the current span according to the outcome of a send.
#[cfg(feature = "tracing")]
pub(crate) fn record_outcome(response: &Response) {
    let span = Span::current();
    if let Some(id) = response.message_id() {
        span.record("message_id", id);
    }
    if response.is_success() {
        span.set_status(Status::Ok);
    } else {
        span.set_status(Status::error(
            response.error().unwrap_or("Unknown error").to_string(),
        ));
    }
}
