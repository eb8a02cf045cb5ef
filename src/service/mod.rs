//! Facade over the driver factory.

pub(crate) mod structure;
pub(crate) mod traits;

pub use structure::SmsService;
pub use traits::SmsServiceTrait;
