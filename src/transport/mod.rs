//! HTTP transport used by the gateway drivers.

pub(crate) mod client;
pub(crate) mod errors;
pub(crate) mod traits;

pub use client::{DEFAULT_TIMEOUT, ReqwestTransport, ReqwestTransportBuilder};
pub use errors::TransportError;
pub use traits::{HttpMethod, HttpRequest, HttpResponse, Transport};
