//! Gateway drivers.
//!
//! Each provider module owns its wire payload and response mapping; shared
//! validation and request helpers live in [`base`].

pub mod base;
pub(crate) mod errors;
pub mod ippanel;
pub mod kavenegar;
pub mod melipayamak;
pub mod mock;
pub mod registry;
pub mod smsir;
pub(crate) mod traits;

pub use errors::{DispatchError, VERIFY_FAILED};
pub use ippanel::IppanelDriver;
pub use kavenegar::KavenegarDriver;
pub use melipayamak::MelipayamakDriver;
pub use mock::{MOCK_FAILURE, MockDriver, SentMessage};
pub use registry::AnyDriver;
pub use smsir::SmsIrDriver;
pub use traits::Driver;
