//! End-to-end scenarios through the public service API.

use serde_json::json;
use sms_drivers::transport::{HttpRequest, HttpResponse, TransportError};
use sms_drivers::{
    GatewayConfig, Message, MockConfig, ProviderId, ServiceConfig, SmsService, SmsServiceTrait,
    TokenValue, Tokens, Transport,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Records every request and answers with a canned provider body.
#[derive(Debug, Clone)]
struct RecordingTransport {
    requests: Arc<Mutex<Vec<HttpRequest>>>,
    reply: serde_json::Value,
}

impl RecordingTransport {
    fn new(reply: serde_json::Value) -> Self {
        Self {
            requests: Arc::default(),
            reply,
        }
    }

    fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for RecordingTransport {
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        Ok(HttpResponse {
            status: 200,
            status_text: "OK".into(),
            headers: Default::default(),
            data: self.reply.clone(),
        })
    }
}

fn message_id_counter(id: &str) -> u64 {
    let (prefix, rest) = id.split_once('-').unwrap();
    assert_eq!(prefix, "mock");
    let (millis, counter) = rest.split_once('-').unwrap();
    assert!(millis.chars().all(|c| c.is_ascii_digit()) && !millis.is_empty());
    counter.parse().unwrap()
}

// =============================================================================
// Mock driver
// =============================================================================

#[tokio::test]
async fn test_mock_default_driver_sends_otp() {
    let service = SmsService::new(ServiceConfig::for_testing(false, 0)).unwrap();

    let message = Message::verification(
        "+989123456789",
        "otp",
        Tokens::named([("code", "12345")]),
    );
    let response = service.verify(&message).await.unwrap();

    assert!(response.is_success());
    assert!(response.error().is_none());
    assert!(response.error_code().is_none());
    message_id_counter(response.message_id().unwrap());

    let driver = service.factory().create_driver(None).unwrap();
    let ledger = driver.as_mock().unwrap();
    let sent = ledger.sent_message(response.message_id().unwrap()).unwrap();
    assert_eq!(sent.message.to, "+989123456789");
    assert_eq!(
        sent.message.content.as_deref(),
        Some(r#"[Template: otp] Tokens: {"code":"12345"}"#)
    );
}

#[tokio::test]
async fn test_mock_ids_strictly_increase_across_calls() {
    let service = SmsService::new(ServiceConfig::for_testing(false, 0)).unwrap();

    let mut previous = 0;
    for code in ["1", "2", "3", "4"] {
        let message = Message::verification("09123456789", "otp", Tokens::ordered([code]));
        let response = service.verify(&message).await.unwrap();
        let counter = message_id_counter(response.message_id().unwrap());
        assert!(counter > previous, "{counter} <= {previous}");
        previous = counter;
    }

    let driver = service.factory().create_driver(Some(ProviderId::Mock)).unwrap();
    assert_eq!(driver.as_mock().unwrap().sent_count(), 4);
}

#[tokio::test]
async fn test_mock_should_fail() {
    let service = SmsService::new(ServiceConfig::for_testing(true, 0)).unwrap();

    for _ in 0..3 {
        let message = Message::verification("09123456789", "otp", Tokens::ordered(["1"]));
        let response = service.verify(&message).await.unwrap();

        assert!(!response.is_success());
        assert_eq!(response.error_code(), Some("MOCK_FAILURE"));
        assert!(!response.error().unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_separate_services_do_not_share_mock_history() {
    let first = SmsService::new(ServiceConfig::for_testing(false, 0)).unwrap();
    let second = SmsService::new(ServiceConfig::for_testing(false, 0)).unwrap();

    let message = Message::verification("09123456789", "otp", Tokens::ordered(["1"]));
    first.verify(&message).await.unwrap();

    let ledger = |service: &SmsService| {
        service
            .factory()
            .create_driver(None)
            .unwrap()
            .as_mock()
            .unwrap()
            .sent_count()
    };
    assert_eq!(ledger(&first), 1);
    assert_eq!(ledger(&second), 0);
}

// =============================================================================
// Validation and configuration failures
// =============================================================================

#[tokio::test]
async fn test_validation_failures_make_no_transport_calls() {
    let transport = RecordingTransport::new(json!({"status": 1}));
    let config = ServiceConfig::builder()
        .default_driver(ProviderId::SmsIr)
        .smsir(GatewayConfig::new("https://api.sms.ir/v1/", "key", "3000"))
        .build()
        .unwrap();
    let service = SmsService::with_transport(config, transport.clone()).unwrap();

    let missing_tokens = Message {
        to: "09123456789".into(),
        template: Some("100".into()),
        ..Message::default()
    };
    let missing_template = Message::text("09123456789", "hello");
    let bad_phone = Message::verification("call me", "100", Tokens::ordered(["1"]));

    for message in [missing_tokens, missing_template, bad_phone] {
        let err = service.verify(&message).await.unwrap_err();
        assert!(err.is_validation(), "{err}");
    }

    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_absent_provider_is_configuration_error() {
    let service = SmsService::new(ServiceConfig::for_testing(false, 0)).unwrap();

    let err = service.factory().create_driver(Some(ProviderId::Ippanel)).unwrap_err();
    assert!(err.is_configuration());

    let message = Message::verification("09123456789", "otp", Tokens::ordered(["1"]))
        .with_driver(ProviderId::Kavenegar);
    let err = service.verify(&message).await.unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(err.code(), "CONFIGURATION_ERROR");
}

#[test]
fn test_default_driver_must_be_configured() {
    let err = ServiceConfig::builder()
        .default_driver(ProviderId::Melipayamak)
        .mock(MockConfig::default())
        .build()
        .unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn test_introspection_through_trait() {
    fn describe(service: &impl SmsServiceTrait) -> (ProviderId, Vec<ProviderId>) {
        (service.default_driver(), service.available_drivers())
    }

    let config = ServiceConfig::builder()
        .default_driver(ProviderId::Mock)
        .mock(MockConfig::default())
        .ippanel(GatewayConfig::new("https://api2.ippanel.com/", "key", "+983000505"))
        .build()
        .unwrap();
    let service = SmsService::new(config).unwrap();

    let (default, available) = describe(&service);
    assert_eq!(default, ProviderId::Mock);
    assert_eq!(available, vec![ProviderId::Ippanel, ProviderId::Mock]);
    assert!(service.is_driver_available(ProviderId::Ippanel));
    assert!(!service.is_driver_available(ProviderId::Kavenegar));
}

// =============================================================================
// Gateway wire contracts through the service
// =============================================================================

#[tokio::test]
async fn test_kavenegar_request_shape() {
    let transport = RecordingTransport::new(json!({
        "return": {"status": 200, "message": "ok"},
        "entries": [{"messageid": 42}]
    }));
    let config = ServiceConfig::kavenegar("secret", "10004346", None).unwrap();
    let service = SmsService::with_transport(config, transport.clone()).unwrap();

    let message = Message::verification("09123456789", "otp", Tokens::ordered(["a", "b"]));
    let response = service.verify(&message).await.unwrap();
    assert_eq!(response.message_id(), Some("42"));

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    let url = &requests[0].url;
    assert_eq!(url.path(), "/v1/secret/verify/lookup.json");

    let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    assert!(query.contains(&("token".into(), "a".into())));
    assert!(query.contains(&("token2".into(), "b".into())));
    assert!(!query.iter().any(|(k, _)| k == "token3"));
}

#[tokio::test]
async fn test_melipayamak_named_tokens_keep_caller_order() {
    let transport = RecordingTransport::new(json!({
        "recId": 55,
        "status": sms_drivers::drivers::melipayamak::SUCCESS_STATUS
    }));
    let config = ServiceConfig::melipayamak("meli-key", "5000", None).unwrap();
    let service = SmsService::with_transport(config, transport.clone()).unwrap();

    let tokens: Tokens = serde_json::from_str(r#"{"name": "Ali", "code": "1234"}"#).unwrap();
    let message = Message::verification("09123456789", "4242", tokens);
    let response = service.verify(&message).await.unwrap();
    assert!(response.is_success());

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].body,
        Some(json!({"to": "09123456789", "bodyId": "4242", "args": ["Ali", "1234"]}))
    );
}

#[tokio::test]
async fn test_smsir_over_http() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/send/verify"))
        .and(header("x-api-key", "sms-ir-key"))
        .and(body_json(json!({
            "mobile": "09123456789",
            "templateId": "100",
            "parameters": [{"name": "code", "value": "9"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": 1,
            "message": "ok",
            "data": {"messageId": "778"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = ServiceConfig::smsir(
        "sms-ir-key",
        "3000",
        Some(&format!("{}/v1/", mock_server.uri())),
    )
    .unwrap();
    let service = SmsService::new(config).unwrap();

    let message = Message::verification(
        "09123456789",
        "100",
        Tokens::named([("code", TokenValue::from(9))]),
    );
    let response = service.verify(&message).await.unwrap();

    assert!(response.is_success());
    assert_eq!(response.message_id(), Some("778"));
}

#[tokio::test]
async fn test_transport_failure_is_a_failed_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"code": 200, "data": {"messageId": "1"}}))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&mock_server)
        .await;

    let config = ServiceConfig::builder()
        .default_driver(ProviderId::Ippanel)
        .timeout(Duration::from_millis(50))
        .ippanel(GatewayConfig::new(mock_server.uri(), "key", "+983000505"))
        .build()
        .unwrap();
    let service = SmsService::new(config).unwrap();

    let message = Message::verification("09123456789", "pattern", Tokens::ordered(["x"]));
    let response = service.verify(&message).await.unwrap();

    assert!(!response.is_success());
    assert_eq!(response.error_code(), Some("VERIFY_FAILED"));
    assert!(response.error().unwrap().contains("timeout"));
}
