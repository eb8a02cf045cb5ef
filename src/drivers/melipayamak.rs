//! Melipayamak driver.
//!
//! `POST {url}/send/shared/{apiKey}` with `{ to, bodyId, args }`.

use super::base::{
    build_url, decode, default_headers, dispatch, id_to_string, require_template, validate_message,
};
use super::errors::DispatchError;
use super::traits::Driver;
use crate::config::GatewayConfig;
use crate::errors::Result;
use crate::transport::{HttpRequest, ReqwestTransport, Transport};
use crate::types::{Message, ProviderId, Response, TokenValue, Tokens};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[cfg(feature = "tracing")]
use super::base::record_outcome;
#[cfg(feature = "tracing")]
use crate::utils::mask_phone_number;
#[cfg(feature = "tracing")]
use tracing::warn;

/// Status text Melipayamak returns for an accepted message ("sent successfully").
///
/// This is free text chosen by the provider, not a numeric code; a wording
/// change on their side turns every send into a failure.
pub const SUCCESS_STATUS: &str = "ارسال موفق بود";

/// Ordinal argument names probed, in order, for named tokens.
const ORDINAL_NAMES: [&str; 10] = [
    "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
];

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SharedPayload<'a> {
    to: &'a str,
    body_id: &'a str,
    args: Vec<String>,
}

impl<'a> SharedPayload<'a> {
    /// Named tokens are read as `one`..`ten`; when none of those exist every
    /// value is used in insertion order.
    fn new(to: &'a str, body_id: &'a str, tokens: &Tokens) -> Self {
        let args = match tokens {
            Tokens::Ordered(values) => values.iter().map(TokenValue::to_string).collect(),
            Tokens::Named(map) => {
                let ordinal: Vec<String> = ORDINAL_NAMES
                    .iter()
                    .filter_map(|name| map.get(*name))
                    .map(TokenValue::to_string)
                    .collect();

                if ordinal.is_empty() {
                    map.values().map(TokenValue::to_string).collect()
                } else {
                    ordinal
                }
            }
        };

        Self { to, body_id, args }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SharedResponse {
    #[serde(default)]
    rec_id: Value,
    #[serde(default)]
    status: Option<String>,
}

/// Driver for the Melipayamak shared-line pattern API.
#[derive(Debug, Clone)]
pub struct MelipayamakDriver<T: Transport = ReqwestTransport> {
    config: GatewayConfig,
    transport: T,
}

impl<T: Transport> MelipayamakDriver<T> {
    pub fn new(config: GatewayConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    async fn send_shared(
        &self,
        to: &str,
        body_id: &str,
        tokens: &Tokens,
    ) -> std::result::Result<Response, DispatchError> {
        let endpoint = format!("send/shared/{}", self.config.api_key.expose_secret());
        let url = build_url(&self.config.url, &endpoint)?;
        let payload = serde_json::to_value(SharedPayload::new(to, body_id, tokens))?;
        let request = HttpRequest::post(url, payload).with_headers(default_headers());

        let body = dispatch(&self.transport, request).await?;
        let parsed: SharedResponse = decode(&body)?;

        match parsed.status.as_deref() {
            Some(SUCCESS_STATUS) => {
                let message_id = id_to_string(&parsed.rec_id);
                Ok(Response::success(body, message_id))
            }
            status => {
                let status = status.unwrap_or_default();
                Ok(Response::failure(
                    status,
                    Some(format!("MELIPAYAMAK_{status}")),
                    Some(body),
                ))
            }
        }
    }
}

impl<T: Transport> Driver for MelipayamakDriver<T> {
    fn provider(&self) -> ProviderId {
        ProviderId::Melipayamak
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "MelipayamakDriver::verify",
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

        let response = match self.send_shared(&message.to, template, tokens).await {
            Ok(response) => response,
            Err(e) => {
                #[cfg(feature = "tracing")]
                warn!(error = %e, "Melipayamak verify failed");
                e.into_response()
            }
        };

        #[cfg(feature = "tracing")]
        record_outcome(&response);

        Ok(response)
    }
}
