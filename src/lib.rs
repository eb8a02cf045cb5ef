//! # SMS Drivers
//!
//! Provider-agnostic template (OTP) SMS delivery with pluggable gateway drivers.
//!
//! Applications build a [`Message`] once and send it through [`SmsService`];
//! the service picks a driver, the driver translates the message into its
//! gateway's wire format and the gateway's answer back into a [`Response`].
//!
//! ## Supported Providers
//!
//! | Provider | Id | Auth |
//! |----------|----|------|
//! | Kavenegar | `kavenegar` | API key in path |
//! | SMS.ir | `smsir` | `X-API-KEY` header |
//! | Melipayamak | `melipayamak` | API key in path |
//! | IPPanel | `ippanel` | `apikey` header |
//! | Mock | `mock` | none, in-memory |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sms_drivers::{Message, ServiceConfig, SmsService, Tokens};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServiceConfig::kavenegar("your_api_key", "10004346", None)?;
//!     let service = SmsService::new(config)?;
//!
//!     let message = Message::verification(
//!         "09123456789",
//!         "verify-template",
//!         Tokens::named([("code", "12345")]),
//!     );
//!
//!     let response = service.verify(&message).await?;
//!     if response.is_success() {
//!         println!("Sent: {:?}", response.message_id());
//!     } else {
//!         println!("Rejected: {:?} ({:?})", response.error(), response.error_code());
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! SmsService<T>
//!         │
//!         ▼
//! DriverFactory<T>     (validated config, one cached driver per provider)
//!         │
//!         ▼
//!   AnyDriver<T>       (Kavenegar | SmsIr | Melipayamak | Ippanel | Mock)
//!         │
//!         ▼
//!    Transport         (trait: ReqwestTransport, or your own)
//! ```
//!
//! ## Features
//!
//! - `tracing` - OpenTelemetry tracing instrumentation (enabled by default)

pub mod config;
pub mod drivers;
pub mod errors;
pub mod factory;
pub mod service;
pub mod transport;
pub mod types;
pub mod utils;

// Re-export commonly used types at the crate root
pub use config::{DriversConfig, GatewayConfig, MockConfig, ServiceConfig, ServiceConfigBuilder};
pub use drivers::{AnyDriver, Driver, MockDriver, SentMessage};
pub use errors::{Result, SmsError};
pub use factory::DriverFactory;
pub use service::{SmsService, SmsServiceTrait};
pub use transport::{ReqwestTransport, Transport};
pub use types::{Message, ProviderId, Response, SmsStatus, TokenValue, Tokens};
