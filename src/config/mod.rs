pub(crate) mod env;
pub(crate) mod types;

pub use types::{
    DriverSettings, DriversConfig, GatewayConfig, IPPANEL_DEFAULT_URL, KAVENEGAR_DEFAULT_URL,
    MELIPAYAMAK_DEFAULT_URL, MockConfig, SMSIR_DEFAULT_URL, ServiceConfig, ServiceConfigBuilder,
    default_url,
};
