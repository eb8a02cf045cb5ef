//! SMS.ir driver.
//!
//! `POST {url}/send/verify` with the API key in the `X-API-KEY` header.

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
#[serde(rename_all = "camelCase")]
pub(crate) struct VerifyPayload<'a> {
    mobile: &'a str,
    template_id: &'a str,
    parameters: Vec<Parameter>,
}

#[derive(Debug, PartialEq, Serialize)]
pub(crate) struct Parameter {
    name: String,
    value: String,
}

impl<'a> VerifyPayload<'a> {
    /// Positional tokens become `Parameter1..N`; named tokens keep their keys.
    fn new(mobile: &'a str, template_id: &'a str, tokens: &Tokens) -> Self {
        let parameters = match tokens {
            Tokens::Ordered(values) => values
                .iter()
                .enumerate()
                .map(|(i, value)| Parameter {
                    name: format!("Parameter{}", i + 1),
                    value: value.to_string(),
                })
                .collect(),
            Tokens::Named(map) => map
                .iter()
                .map(|(name, value)| Parameter {
                    name: name.clone(),
                    value: value.to_string(),
                })
                .collect(),
        };

        Self {
            mobile,
            template_id,
            parameters,
        }
    }
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    status: i64,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<VerifyData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyData {
    #[serde(default)]
    message_id: Value,
}

/// Driver for the SMS.ir verify API.
#[derive(Debug, Clone)]
pub struct SmsIrDriver<T: Transport = ReqwestTransport> {
    config: GatewayConfig,
    transport: T,
}

impl<T: Transport> SmsIrDriver<T> {
    pub fn new(config: GatewayConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    async fn send_verify(
        &self,
        mobile: &str,
        template: &str,
        tokens: &Tokens,
    ) -> std::result::Result<Response, DispatchError> {
        let url = build_url(&self.config.url, "send/verify")?;
        let payload = serde_json::to_value(VerifyPayload::new(mobile, template, tokens))?;
        let request = HttpRequest::post(url, payload).with_headers(build_headers([(
            "X-API-KEY",
            self.config.api_key.expose_secret(),
        )]));

        let body = dispatch(&self.transport, request).await?;
        let parsed: VerifyResponse = decode(&body)?;

        if parsed.status == 1 {
            let message_id = parsed
                .data
                .as_ref()
                .and_then(|data| id_to_string(&data.message_id))
                .or_else(|| extract_message_id(&body));
            return Ok(Response::success(body, message_id));
        }

        Ok(Response::failure(
            parsed.message.unwrap_or_default(),
            Some(format!("SMSIR_{}", parsed.status)),
            Some(body),
        ))
    }
}

impl<T: Transport> Driver for SmsIrDriver<T> {
    fn provider(&self) -> ProviderId {
        ProviderId::SmsIr
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "SmsIrDriver::verify",
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

        let response = match self.send_verify(&message.to, template, tokens).await {
            Ok(response) => response,
            Err(e) => {
                #[cfg(feature = "tracing")]
                warn!(error = %e, "SMS.ir verify failed");
                e.into_response()
            }
        };

        #[cfg(feature = "tracing")]
        record_outcome(&response);

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TokenValue;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn driver(server: &MockServer) -> SmsIrDriver {
        let config = GatewayConfig::new(format!("{}/v1", server.uri()), "sms-ir-key", "30004505");
        SmsIrDriver::new(config, ReqwestTransport::new(Duration::from_secs(5)).unwrap())
    }

    #[test]
    fn test_named_tokens_become_parameters() {
        let tokens = Tokens::named([("code", "9")]);
        let payload = serde_json::to_value(VerifyPayload::new("0912", "100", &tokens)).unwrap();

        assert_eq!(
            payload,
            json!({
                "mobile": "0912",
                "templateId": "100",
                "parameters": [{"name": "code", "value": "9"}]
            })
        );
    }

    #[test]
    fn test_named_parameters_keep_caller_order() {
        let tokens = Tokens::named([("name", "Ali"), ("code", "9")]);
        let payload = VerifyPayload::new("0912", "100", &tokens);
        let names: Vec<&str> = payload.parameters.iter().map(|p| p.name.as_str()).collect();

        assert_eq!(names, vec!["name", "code"]);
    }

    #[test]
    fn test_ordered_tokens_become_numbered_parameters() {
        let tokens = Tokens::Ordered(vec![TokenValue::from("a"), TokenValue::from(42)]);
        let payload = VerifyPayload::new("0912", "100", &tokens);

        assert_eq!(
            payload.parameters,
            vec![
                Parameter {
                    name: "Parameter1".into(),
                    value: "a".into()
                },
                Parameter {
                    name: "Parameter2".into(),
                    value: "42".into()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_verify_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/send/verify"))
            .and(header("x-api-key", "sms-ir-key"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({
                "mobile": "09123456789",
                "templateId": "100",
                "parameters": [{"name": "code", "value": "12345"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": 1,
                "message": "موفق",
                "data": {"messageId": "89545112", "cost": 1.0}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let message = Message::verification(
            "09123456789",
            "100",
            Tokens::named([("code", "12345")]),
        );
        let response = driver(&mock_server).verify(&message).await.unwrap();

        assert!(response.is_success());
        assert_eq!(response.message_id(), Some("89545112"));
    }

    #[tokio::test]
    async fn test_verify_success_without_data_falls_back_to_generic_id() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/send/verify"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": 1,
                "id": "sms-ir-77"
            })))
            .mount(&mock_server)
            .await;

        let message = Message::verification("09123456789", "100", Tokens::ordered(["1"]));
        let response = driver(&mock_server).verify(&message).await.unwrap();

        assert!(response.is_success());
        assert_eq!(response.message_id(), Some("sms-ir-77"));
    }

    #[tokio::test]
    async fn test_verify_provider_rejection() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/send/verify"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": 0,
                "message": "template not approved",
                "data": null
            })))
            .mount(&mock_server)
            .await;

        let message = Message::verification("09123456789", "100", Tokens::ordered(["1"]));
        let response = driver(&mock_server).verify(&message).await.unwrap();

        assert!(!response.is_success());
        assert_eq!(response.error(), Some("template not approved"));
        assert_eq!(response.error_code(), Some("SMSIR_0"));
    }

    #[tokio::test]
    async fn test_verify_unparseable_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&mock_server)
            .await;

        let message = Message::verification("09123456789", "100", Tokens::ordered(["1"]));
        let response = driver(&mock_server).verify(&message).await.unwrap();

        assert!(!response.is_success());
        assert_eq!(response.error_code(), Some("VERIFY_FAILED"));
        assert!(response.error().unwrap().starts_with("Unexpected response body"));
        assert_eq!(response.data(), Some(&json!("<html>maintenance</html>")));
    }
}
