//! Small helpers shared across drivers.

pub(crate) mod phone;

pub use phone::{is_valid_phone_number, mask_phone_number};
