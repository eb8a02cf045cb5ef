//! Driver selection and caching.

use crate::config::ServiceConfig;
use crate::drivers::AnyDriver;
use crate::drivers::registry;
use crate::errors::{Result, SmsError};
use crate::transport::{ReqwestTransport, Transport};
use crate::types::ProviderId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

#[cfg(feature = "tracing")]
use tracing::debug;

/// Creates drivers on first use and hands out the same instance afterwards.
///
/// The configuration is validated once, at construction. Each provider's
/// driver is built at most once per factory; concurrent first requests for the
/// same provider observe the same instance.
///
/// # Example
///
/// ```rust
/// use sms_drivers::{DriverFactory, ProviderId, ServiceConfig};
/// use std::sync::Arc;
///
/// let factory = DriverFactory::new(ServiceConfig::for_testing(false, 0)).unwrap();
/// let first = factory.create_driver(None).unwrap();
/// let second = factory.create_driver(Some(ProviderId::Mock)).unwrap();
/// assert!(Arc::ptr_eq(&first, &second));
/// ```
#[derive(Debug)]
pub struct DriverFactory<T: Transport = ReqwestTransport> {
    config: ServiceConfig,
    transport: T,
    drivers: Mutex<HashMap<ProviderId, Arc<AnyDriver<T>>>>,
}

impl DriverFactory<ReqwestTransport> {
    /// Create a factory using a [`ReqwestTransport`] with the configured timeout.
    pub fn new(config: ServiceConfig) -> Result<Self> {
        config.validate()?;
        let transport = ReqwestTransport::new(config.timeout)
            .map_err(|e| SmsError::service("Build HTTP transport", e))?;
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> DriverFactory<T> {
    /// Create a factory sharing `transport` between all drivers.
    pub fn with_transport(config: ServiceConfig, transport: T) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            transport,
            drivers: Mutex::new(HashMap::new()),
        })
    }

    /// Driver for `provider`, or for the default driver when `None`.
    ///
    /// Returns the cached instance when one exists. Otherwise validates the
    /// provider's configuration, builds the driver and caches it.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "DriverFactory::create_driver",
            skip_all,
            fields(provider = ?provider)
        )
    )]
    pub fn create_driver(&self, provider: Option<ProviderId>) -> Result<Arc<AnyDriver<T>>> {
        let provider = provider.unwrap_or(self.config.default_driver);

        // Held across construction so a provider is never built twice.
        let mut drivers = self.drivers.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(driver) = drivers.get(&provider) {
            return Ok(Arc::clone(driver));
        }

        let settings = self.config.validate_driver(provider)?;
        let driver = Arc::new(registry::construct(provider, settings, &self.transport)?);
        drivers.insert(provider, Arc::clone(&driver));

        #[cfg(feature = "tracing")]
        debug!(provider = %provider, "Driver created");

        Ok(driver)
    }

    /// Same as [`create_driver`](Self::create_driver) for a provider given by name.
    ///
    /// Unknown names fail with [`SmsError::UnsupportedProvider`].
    pub fn create_driver_by_name(&self, name: &str) -> Result<Arc<AnyDriver<T>>> {
        let provider = name.parse::<ProviderId>()?;
        self.create_driver(Some(provider))
    }

    /// Providers with a configuration section.
    pub fn available_drivers(&self) -> Vec<ProviderId> {
        self.config.drivers.configured()
    }

    /// Whether `provider` has a valid configuration. Never builds a driver.
    pub fn is_driver_available(&self, provider: ProviderId) -> bool {
        self.config.validate_driver(provider).is_ok()
    }

    pub fn default_driver(&self) -> ProviderId {
        self.config.default_driver
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GatewayConfig, MockConfig};
    use crate::drivers::Driver;
    use std::time::Duration;

    fn config() -> ServiceConfig {
        ServiceConfig::builder()
            .default_driver(ProviderId::Mock)
            .timeout(Duration::from_secs(2))
            .mock(MockConfig::default())
            .kavenegar(GatewayConfig::new("https://api.kavenegar.com/v1/", "k", "1000"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_identity_is_stable() {
        let factory = DriverFactory::new(config()).unwrap();

        let a = factory.create_driver(None).unwrap();
        let b = factory.create_driver(Some(ProviderId::Mock)).unwrap();
        let c = factory.create_driver(Some(ProviderId::Kavenegar)).unwrap();
        let d = factory.create_driver_by_name("KAVENEGAR").unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&c, &d));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(c.provider(), ProviderId::Kavenegar);
    }

    #[test]
    fn test_unconfigured_provider() {
        let factory = DriverFactory::new(config()).unwrap();
        let err = factory.create_driver(Some(ProviderId::Ippanel)).unwrap_err();

        assert!(err.is_configuration());
        assert_eq!(err.to_string(), "Driver 'ippanel' is not configured");
    }

    #[test]
    fn test_unknown_provider_name() {
        let factory = DriverFactory::new(config()).unwrap();
        let err = factory.create_driver_by_name("twilio").unwrap_err();
        assert!(err.is_unsupported_provider());
    }

    #[test]
    fn test_availability_does_not_build_drivers() {
        let factory = DriverFactory::new(config()).unwrap();

        assert_eq!(
            factory.available_drivers(),
            vec![ProviderId::Kavenegar, ProviderId::Mock]
        );
        assert!(factory.is_driver_available(ProviderId::Kavenegar));
        assert!(!factory.is_driver_available(ProviderId::SmsIr));
        assert!(factory.drivers.lock().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_config_is_rejected_at_construction() {
        let mut config = config();
        config.drivers.smsir = Some(GatewayConfig::new("", "k", "1"));
        let err = DriverFactory::new(config).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_concurrent_first_use_builds_one_driver() {
        let factory = Arc::new(DriverFactory::new(config()).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let factory = Arc::clone(&factory);
                std::thread::spawn(move || factory.create_driver(None).unwrap())
            })
            .collect();

        let drivers: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(drivers.iter().all(|d| Arc::ptr_eq(d, &drivers[0])));
    }
}
