//! Main service implementation.

use super::traits::SmsServiceTrait;
use crate::config::ServiceConfig;
use crate::drivers::Driver;
use crate::drivers::base::validate_message;
use crate::errors::{Result, SmsError};
use crate::factory::DriverFactory;
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{Message, ProviderId, Response};

#[cfg(feature = "tracing")]
use crate::utils::mask_phone_number;
#[cfg(feature = "tracing")]
use opentelemetry::trace::Status;
#[cfg(feature = "tracing")]
use tracing::{Span, info, warn};
#[cfg(feature = "tracing")]
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Entry point for sending verification (OTP) messages.
///
/// Validates the message, picks the driver named by [`Message::driver`] or
/// the configured default, and delegates to it. Errors are returned only for
/// malformed messages and configuration problems; gateway-side failures come
/// back as a failed [`Response`].
///
/// # Example
///
/// ```rust
/// use sms_drivers::{Message, ServiceConfig, SmsService, Tokens};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> sms_drivers::Result<()> {
/// let service = SmsService::new(ServiceConfig::for_testing(false, 0))?;
///
/// let message = Message::verification("+989123456789", "otp", Tokens::named([("code", "12345")]));
/// let response = service.verify(&message).await?;
///
/// assert!(response.is_success());
/// assert!(response.message_id().unwrap().starts_with("mock-"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SmsService<T: Transport = ReqwestTransport> {
    factory: DriverFactory<T>,
}

impl SmsService<ReqwestTransport> {
    /// Create a service with the default HTTP transport.
    pub fn new(config: ServiceConfig) -> Result<Self> {
        Ok(Self::with_factory(DriverFactory::new(config)?))
    }

    /// Create a service configured from `SMS_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(ServiceConfig::from_env()?)
    }
}

impl<T: Transport> SmsService<T> {
    /// Create a service whose drivers share `transport`.
    pub fn with_transport(config: ServiceConfig, transport: T) -> Result<Self> {
        Ok(Self::with_factory(DriverFactory::with_transport(
            config, transport,
        )?))
    }

    /// Create a service around an existing factory.
    pub fn with_factory(factory: DriverFactory<T>) -> Self {
        Self { factory }
    }

    /// Send a verification message.
    ///
    /// Malformed messages, content-only messages and unconfigured or unknown
    /// drivers fail before any driver or network work happens.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "SmsService::verify",
            skip_all,
            fields(
                to = %mask_phone_number(&message.to),
                driver = ?message.driver,
            )
        )
    )]
    pub async fn verify(&self, message: &Message) -> Result<Response> {
        validate_message(message)?;

        if message.template.as_deref().is_none_or(str::is_empty) {
            return Err(SmsError::validation_with_code(
                "Template is required for verification messages",
                "MISSING_TEMPLATE",
            ));
        }

        let driver = self.factory.create_driver(message.driver)?;
        let response = driver.verify(message).await?;

        #[cfg(feature = "tracing")]
        {
            if response.is_success() {
                info!(
                    provider = %driver.provider(),
                    status = %response.status(),
                    message_id = response.message_id().unwrap_or_default(),
                    "Verification SMS sent"
                );
                Span::current().set_status(Status::Ok);
            } else {
                warn!(
                    provider = %driver.provider(),
                    status = %response.status(),
                    error = response.error().unwrap_or_default(),
                    error_code = response.error_code().unwrap_or_default(),
                    "Verification SMS rejected"
                );
                Span::current().set_status(Status::error(
                    response.error().unwrap_or_default().to_string(),
                ));
            }
        }

        Ok(response)
    }

    /// Providers with a configuration section.
    pub fn available_drivers(&self) -> Vec<ProviderId> {
        self.factory.available_drivers()
    }

    /// Whether `provider` is configured correctly.
    pub fn is_driver_available(&self, provider: ProviderId) -> bool {
        self.factory.is_driver_available(provider)
    }

    pub fn default_driver(&self) -> ProviderId {
        self.factory.default_driver()
    }

    /// The factory backing this service.
    pub fn factory(&self) -> &DriverFactory<T> {
        &self.factory
    }
}

impl<T: Transport> SmsServiceTrait for SmsService<T> {
    async fn verify(&self, message: &Message) -> Result<Response> {
        SmsService::verify(self, message).await
    }

    fn available_drivers(&self) -> Vec<ProviderId> {
        SmsService::available_drivers(self)
    }

    fn is_driver_available(&self, provider: ProviderId) -> bool {
        SmsService::is_driver_available(self, provider)
    }

    fn default_driver(&self) -> ProviderId {
        SmsService::default_driver(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GatewayConfig, MockConfig};
    use crate::transport::{HttpRequest, HttpResponse, TransportError};
    use crate::types::Tokens;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Counts requests and answers every one with a fixed body.
    #[derive(Debug, Clone, Default)]
    struct RecordingTransport {
        calls: Arc<AtomicUsize>,
    }

    impl Transport for RecordingTransport {
        async fn request(
            &self,
            _request: HttpRequest,
        ) -> std::result::Result<HttpResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(HttpResponse {
                status: 200,
                status_text: "OK".into(),
                headers: Default::default(),
                data: json!({
                    "return": {"status": 200, "message": "ok"},
                    "entries": [{"messageid": 1}]
                }),
            })
        }
    }

    fn service(transport: RecordingTransport) -> SmsService<RecordingTransport> {
        let config = ServiceConfig::builder()
            .default_driver(ProviderId::Kavenegar)
            .kavenegar(GatewayConfig::new("https://api.kavenegar.com/v1/", "k", "1000"))
            .mock(MockConfig::default())
            .build()
            .unwrap();
        SmsService::with_transport(config, transport).unwrap()
    }

    #[tokio::test]
    async fn test_verify_uses_default_driver() {
        let transport = RecordingTransport::default();
        let service = service(transport.clone());

        let message = Message::verification("09123456789", "otp", Tokens::ordered(["1"]));
        let response = service.verify(&message).await.unwrap();

        assert!(response.is_success());
        assert_eq!(response.message_id(), Some("1"));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_verify_honours_message_driver() {
        let transport = RecordingTransport::default();
        let service = service(transport.clone());

        let message = Message::verification("09123456789", "otp", Tokens::ordered(["1"]))
            .with_driver(ProviderId::Mock);
        let response = service.verify(&message).await.unwrap();

        assert!(response.message_id().unwrap().starts_with("mock-"));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_messages_never_reach_transport() {
        let transport = RecordingTransport::default();
        let service = service(transport.clone());

        let invalid = [
            Message {
                to: "09123456789".into(),
                template: Some("otp".into()),
                ..Message::default()
            },
            Message::verification("", "otp", Tokens::ordered(["1"])),
            Message::verification("phone", "otp", Tokens::ordered(["1"])),
            Message::text("09123456789", "hello"),
        ];

        for message in &invalid {
            let err = service.verify(message).await.unwrap_err();
            assert!(err.is_validation(), "{err}");
        }
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
        assert!(service.factory().available_drivers().len() == 2);
    }

    #[tokio::test]
    async fn test_unconfigured_driver_is_a_configuration_error() {
        let service = service(RecordingTransport::default());
        let message = Message::verification("09123456789", "otp", Tokens::ordered(["1"]))
            .with_driver(ProviderId::SmsIr);

        let err = service.verify(&message).await.unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_introspection() {
        let service = service(RecordingTransport::default());

        assert_eq!(service.default_driver(), ProviderId::Kavenegar);
        assert!(service.is_driver_available(ProviderId::Mock));
        assert!(!service.is_driver_available(ProviderId::Ippanel));
        assert_eq!(
            SmsServiceTrait::available_drivers(&service),
            vec![ProviderId::Kavenegar, ProviderId::Mock]
        );
    }
}
