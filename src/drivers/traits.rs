//! Driver trait definition.

use crate::errors::Result;
use crate::types::{Message, ProviderId, Response};
use std::future::Future;

/// Capability every SMS gateway adapter implements.
///
/// `verify` sends one template (OTP) message. It returns `Err` only for
/// problems detected before any network interaction: a malformed message or
/// a configuration problem. Gateway rejections, HTTP errors and transport
/// failures resolve to a failed [`Response`].
///
/// # Example
///
/// ```rust,ignore
/// use sms_drivers::{Driver, Message, ProviderId, Response, Result};
///
/// struct EchoDriver;
///
/// impl Driver for EchoDriver {
///     fn provider(&self) -> ProviderId {
///         ProviderId::Mock
///     }
///
///     async fn verify(&self, message: &Message) -> Result<Response> {
///         Ok(Response::success(serde_json::json!({ "to": message.to }), None))
///     }
/// }
/// ```
pub trait Driver: Send + Sync {
    /// Provider this driver talks to.
    fn provider(&self) -> ProviderId;

    /// Send a template message and normalize the gateway's answer.
    fn verify(&self, message: &Message) -> impl Future<Output = Result<Response>> + Send;
}
