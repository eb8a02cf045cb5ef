//! Service trait definition.

use crate::errors::Result;
use crate::types::{Message, ProviderId, Response};
use std::future::Future;

/// Trait for SMS service implementations.
///
/// Lets applications depend on the service surface without naming the
/// transport type parameter, or swap in a test double.
pub trait SmsServiceTrait: Send + Sync {
    /// Send a verification message through the selected driver.
    fn verify(&self, message: &Message) -> impl Future<Output = Result<Response>> + Send;

    /// Providers with a configuration section.
    fn available_drivers(&self) -> Vec<ProviderId>;

    /// Whether `provider` is configured correctly.
    fn is_driver_available(&self, provider: ProviderId) -> bool;

    /// Driver used when a message does not name one.
    fn default_driver(&self) -> ProviderId;
}
