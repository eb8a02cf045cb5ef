//! Kavenegar driver.
//!
//! `GET {url}/{apiKey}/verify/lookup.json?receptor=..&template=..&token=..`

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

/// Query parameters of the lookup endpoint.
#[derive(Debug, Default, PartialEq, Serialize)]
pub(crate) struct LookupParams<'a> {
    receptor: &'a str,
    template: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token3: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token10: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token20: Option<String>,
}

impl<'a> LookupParams<'a> {
    /// Positional tokens fill `token`, `token2`, `token3`, `token10`, `token20`
    /// in order; extra positions are dropped. Named tokens are looked up by
    /// those names, with `code` as an alias for `token`. Falsy named values
    /// are skipped.
    fn new(receptor: &'a str, template: &'a str, tokens: &Tokens) -> Self {
        let mut params = Self {
            receptor,
            template,
            ..Self::default()
        };

        match tokens {
            Tokens::Ordered(values) => {
                let mut values = values.iter().map(TokenValue::to_string);
                params.token = values.next();
                params.token2 = values.next();
                params.token3 = values.next();
                params.token10 = values.next();
                params.token20 = values.next();
            }
            Tokens::Named(map) => {
                let truthy = |key: &str| {
                    map.get(key)
                        .filter(|v| v.is_truthy())
                        .map(TokenValue::to_string)
                };
                params.token = truthy("token").or_else(|| truthy("code"));
                params.token2 = truthy("token2");
                params.token3 = truthy("token3");
                params.token10 = truthy("token10");
                params.token20 = truthy("token20");
            }
        }

        params
    }
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(rename = "return")]
    result: LookupReturn,
    #[serde(default)]
    entries: Option<Vec<LookupEntry>>,
}

#[derive(Debug, Deserialize)]
struct LookupReturn {
    status: i64,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LookupEntry {
    #[serde(default)]
    messageid: Value,
}

/// Driver for the Kavenegar verify lookup API.
#[derive(Debug, Clone)]
pub struct KavenegarDriver<T: Transport = ReqwestTransport> {
    config: GatewayConfig,
    transport: T,
}

impl<T: Transport> KavenegarDriver<T> {
    pub fn new(config: GatewayConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn lookup_request(
        &self,
        receptor: &str,
        template: &str,
        tokens: &Tokens,
    ) -> std::result::Result<HttpRequest, DispatchError> {
        let endpoint = format!("{}/verify/lookup.json", self.config.api_key.expose_secret());
        let mut url = build_url(&self.config.url, &endpoint)?;
        let params = LookupParams::new(receptor, template, tokens);
        url.set_query(Some(&serde_urlencoded::to_string(&params)?));

        Ok(HttpRequest::get(url).with_headers(default_headers()))
    }

    async fn lookup(
        &self,
        receptor: &str,
        template: &str,
        tokens: &Tokens,
    ) -> std::result::Result<Response, DispatchError> {
        let request = self.lookup_request(receptor, template, tokens)?;
        let body = dispatch(&self.transport, request).await?;
        let parsed: LookupResponse = decode(&body)?;

        if parsed.result.status == 200 {
            let message_id = parsed
                .entries
                .as_deref()
                .and_then(<[LookupEntry]>::first)
                .and_then(|entry| id_to_string(&entry.messageid));
            return Ok(Response::success(body, message_id));
        }

        Ok(Response::failure(
            parsed.result.message.unwrap_or_default(),
            Some(format!("KAVENEGAR_{}", parsed.result.status)),
            Some(body),
        ))
    }
}

impl<T: Transport> Driver for KavenegarDriver<T> {
    fn provider(&self) -> ProviderId {
        ProviderId::Kavenegar
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "KavenegarDriver::verify",
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

        let response = match self.lookup(&message.to, template, tokens).await {
            Ok(response) => response,
            Err(e) => {
                #[cfg(feature = "tracing")]
                warn!(error = %e, "Kavenegar verify failed");
                e.into_response()
            }
        };

        #[cfg(feature = "tracing")]
        record_outcome(&response);

        Ok(response)
    }
}
