//! IPPanel driver.
//!
//! `POST {url}/api/v1/sms/pattern/normal/send` with the API key in the
//! `apikey` header. IPPanel answers validation problems with a structured
//! body on a 4xx status; that body is interpreted like a regular answer.

use super::base::{
    build_headers, build_url, decode, dispatch, extract_message_id, id_to_string,
    require_template, validate_message,
};
use super::errors::DispatchError;
use super::traits::Driver;
use crate::config::GatewayConfig;
use crate::errors::Result;
use crate::transport::{HttpRequest, ReqwestTransport, Transport};
use crate::types::{Message, ProviderId, Response, Tokens};
use indexmap::IndexMap;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[cfg(feature = "tracing")]
use super::base::record_outcome;
#[cfg(feature = "tracing")]
use crate::utils::mask_phone_number;
#[cfg(feature = "tracing")]
use tracing::warn;

#[derive(Debug, PartialEq, Serialize)]
pub(crate) struct PatternPayload<'a> {
    code: &'a str,
    sender: &'a str,
    recipient: &'a str,
    variable: IndexMap<String, String>,
}

impl<'a> PatternPayload<'a> {
    /// The first positional token is bound to `name`, the rest to `var2`..`varN`.
    fn new(code: &'a str, sender: &'a str, recipient: &'a str, tokens: &Tokens) -> Self {
        let variable = match tokens {
            Tokens::Ordered(values) => values
                .iter()
                .enumerate()
                .map(|(i, value)| {
                    let name = if i == 0 {
                        "name".to_string()
                    } else {
                        format!("var{}", i + 1)
                    };
                    (name, value.to_string())
                })
                .collect(),
            Tokens::Named(map) => map
                .iter()
                .map(|(name, value)| (name.clone(), value.to_string()))
                .collect(),
        };

        Self {
            code,
            sender,
            recipient,
            variable,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PatternResponse {
    code: i64,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error_message: Option<Value>,
    #[serde(default)]
    data: Option<Value>,
}

impl PatternResponse {
    /// Human-readable failure text.
    ///
    /// Validation failures carry an object such as
    /// `{"recipient": ["is invalid"]}`, flattened to `recipient: is invalid`.
    fn error_text(&self) -> String {
        match &self.error_message {
            Some(Value::String(text)) => return text.clone(),
            Some(Value::Object(fields)) => {
                let parts: Vec<String> = fields
                    .iter()
                    .map(|(key, value)| format!("{key}: {}", flatten(value)))
                    .collect();
                return parts.join("; ");
            }
            _ => {}
        }

        self.status.clone().unwrap_or_default()
    }

    fn into_response(self, body: Value) -> Response {
        if self.code == 200 {
            let message_id = self
                .data
                .as_ref()
                .and_then(|data| data.get("messageId"))
                .and_then(id_to_string)
                .or_else(|| extract_message_id(&body));
            return Response::success(body, message_id);
        }

        Response::failure(
            self.error_text(),
            Some(format!("IPPANEL_{}", self.code)),
            Some(body),
        )
    }
}

fn flatten(value: &Value) -> String {
    match value {
        Value::Array(items) => items.iter().map(flatten).collect::<Vec<_>>().join(", "),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Driver for the IPPanel pattern API.
#[derive(Debug, Clone)]
pub struct IppanelDriver<T: Transport = ReqwestTransport> {
    config: GatewayConfig,
    transport: T,
}

impl<T: Transport> IppanelDriver<T> {
    pub fn new(config: GatewayConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    async fn send_pattern(
        &self,
        message: &Message,
        code: &str,
        tokens: &Tokens,
    ) -> std::result::Result<Response, DispatchError> {
        let url = build_url(&self.config.url, "api/v1/sms/pattern/normal/send")?;
        let sender = message
            .from
            .as_deref()
            .filter(|from| !from.is_empty())
            .unwrap_or(self.config.line_number.as_str());
        let payload = serde_json::to_value(PatternPayload::new(code, sender, &message.to, tokens))?;
        let request = HttpRequest::post(url, payload).with_headers(build_headers([(
            "apikey",
            self.config.api_key.expose_secret(),
        )]));

        let body = dispatch(&self.transport, request).await?;
        let parsed: PatternResponse = decode(&body)?;
        Ok(parsed.into_response(body))
    }

    /// Recover IPPanel's own answer from an error-status body.
    fn reinterpret(error: &DispatchError) -> Option<Response> {
        let DispatchError::Status { body, .. } = error else {
            return None;
        };
        if body.get("code").is_none() {
            return None;
        }
        let parsed: PatternResponse = decode(body).ok()?;
        Some(parsed.into_response(body.clone()))
    }
}

impl<T: Transport> Driver for IppanelDriver<T> {
    fn provider(&self) -> ProviderId {
        ProviderId::Ippanel
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "IppanelDriver::verify",
            skip_all,
            fields(
                to = %mask_phone_number(&message.to),
                template = ?message.template,
                message_id = tracing::field::Empty,
            )
        )
    )]
    async fn verify(&self, message: &Message) -> Result<Response> {
        validate_message(message)?;
        let (template, tokens) = match require_template(message) {
            Ok(parts) => parts,
            Err(response) => return Ok(response),
        };

        let response = match self.send_pattern(message, template, tokens).await {
            Ok(response) => response,
            Err(e) => match Self::reinterpret(&e) {
                Some(response) => response,
                None => {
                    #[cfg(feature = "tracing")]
                    warn!(error = %e, "IPPanel verify failed");
                    e.into_response()
                }
            },
        };

        #[cfg(feature = "tracing")]
        record_outcome(&response);

        Ok(response)
    }
}
