//! Service and driver configuration types.

use crate::errors::{Result, SmsError};
use crate::transport::DEFAULT_TIMEOUT;
use crate::types::ProviderId;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use std::time::Duration;
use url::Url;

/// Default base URL of the Kavenegar API.
pub const KAVENEGAR_DEFAULT_URL: &str = "https://api.kavenegar.com/v1/";
/// Default base URL of the SMS.ir API.
pub const SMSIR_DEFAULT_URL: &str = "https://api.sms.ir/v1/";
/// Default base URL of the Melipayamak API.
pub const MELIPAYAMAK_DEFAULT_URL: &str = "https://console.melipayamak.com/api/";
/// Default base URL of the IPPanel API.
pub const IPPANEL_DEFAULT_URL: &str = "https://api2.ippanel.com/";

/// Default base URL for a regional gateway. `None` for the mock driver.
pub fn default_url(provider: ProviderId) -> Option<&'static str> {
    match provider {
        ProviderId::Kavenegar => Some(KAVENEGAR_DEFAULT_URL),
        ProviderId::SmsIr => Some(SMSIR_DEFAULT_URL),
        ProviderId::Melipayamak => Some(MELIPAYAMAK_DEFAULT_URL),
        ProviderId::Ippanel => Some(IPPANEL_DEFAULT_URL),
        ProviderId::Mock => None,
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> std::result::Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

fn deserialize_millis<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_millis)
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

// =============================================================================
// Driver configuration
// =============================================================================

/// Credentials and endpoint of a regional gateway.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Absolute base URL of the gateway API.
    pub url: String,
    #[serde(deserialize_with = "deserialize_secret")]
    pub api_key: SecretString,
    /// Default sender line.
    pub line_number: String,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("url", &self.url)
            .field("api_key", &"[REDACTED]")
            .field("line_number", &self.line_number)
            .finish()
    }
}

impl GatewayConfig {
    pub fn new(
        url: impl Into<String>,
        api_key: impl Into<String>,
        line_number: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            api_key: SecretString::from(api_key.into()),
            line_number: line_number.into(),
        }
    }

    /// Check that every field is set and the URL is absolute.
    pub fn validate(&self, provider: ProviderId) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(SmsError::configuration(format!(
                "Driver '{provider}' requires a valid url"
            )));
        }

        if self.api_key.expose_secret().trim().is_empty() {
            return Err(SmsError::configuration(format!(
                "Driver '{provider}' requires a valid apiKey"
            )));
        }

        if self.line_number.trim().is_empty() {
            return Err(SmsError::configuration(format!(
                "Driver '{provider}' requires a valid lineNumber"
            )));
        }

        self.base_url().map_err(|e| {
            SmsError::configuration(format!("Driver '{provider}' has an invalid url: {e}"))
        })?;

        Ok(())
    }

    /// Parse the configured base URL.
    pub fn base_url(&self) -> std::result::Result<Url, url::ParseError> {
        let url = Url::parse(self.url.trim())?;
        if url.cannot_be_a_base() {
            return Err(url::ParseError::RelativeUrlWithCannotBeABaseBase);
        }
        Ok(url)
    }
}

/// Behaviour of the in-memory mock driver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockConfig {
    /// Fail every send with `MOCK_FAILURE`.
    #[serde(default)]
    pub should_fail: bool,
    /// Simulated latency in milliseconds.
    #[serde(default)]
    pub delay: u64,
}

impl MockConfig {
    pub fn new(should_fail: bool, delay: u64) -> Self {
        Self { should_fail, delay }
    }
}

/// Borrowed view of one provider's configuration.
#[derive(Debug, Clone, Copy)]
pub enum DriverSettings<'a> {
    Gateway(&'a GatewayConfig),
    Mock(&'a MockConfig),
}

/// Per-provider configuration sections. Absent sections are `None`; a
/// section for an unknown provider is rejected.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DriversConfig {
    pub kavenegar: Option<GatewayConfig>,
    pub smsir: Option<GatewayConfig>,
    pub melipayamak: Option<GatewayConfig>,
    pub ippanel: Option<GatewayConfig>,
    pub mock: Option<MockConfig>,
}

impl DriversConfig {
    /// Configuration section for `provider`, if present.
    pub fn get(&self, provider: ProviderId) -> Option<DriverSettings<'_>> {
        match provider {
            ProviderId::Kavenegar => self.kavenegar.as_ref().map(DriverSettings::Gateway),
            ProviderId::SmsIr => self.smsir.as_ref().map(DriverSettings::Gateway),
            ProviderId::Melipayamak => self.melipayamak.as_ref().map(DriverSettings::Gateway),
            ProviderId::Ippanel => self.ippanel.as_ref().map(DriverSettings::Gateway),
            ProviderId::Mock => self.mock.as_ref().map(DriverSettings::Mock),
        }
    }

    /// Set the section of a regional gateway. Ignored for the mock driver.
    pub fn set_gateway(&mut self, provider: ProviderId, config: GatewayConfig) {
        let slot = match provider {
            ProviderId::Kavenegar => &mut self.kavenegar,
            ProviderId::SmsIr => &mut self.smsir,
            ProviderId::Melipayamak => &mut self.melipayamak,
            ProviderId::Ippanel => &mut self.ippanel,
            ProviderId::Mock => return,
        };
        *slot = Some(config);
    }

    /// Providers with a configuration section.
    pub fn configured(&self) -> Vec<ProviderId> {
        ProviderId::ALL
            .into_iter()
            .filter(|id| self.get(*id).is_some())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.configured().is_empty()
    }

    /// Overlay every section present in `other`.
    pub fn overlay(&mut self, other: DriversConfig) {
        let DriversConfig {
            kavenegar,
            smsir,
            melipayamak,
            ippanel,
            mock,
        } = other;

        if kavenegar.is_some() {
            self.kavenegar = kavenegar;
        }
        if smsir.is_some() {
            self.smsir = smsir;
        }
        if melipayamak.is_some() {
            self.melipayamak = melipayamak;
        }
        if ippanel.is_some() {
            self.ippanel = ippanel;
        }
        if mock.is_some() {
            self.mock = mock;
        }
    }
}

// =============================================================================
// ServiceConfig
// =============================================================================

/// Validated configuration of the SMS service.
///
/// # Example
///
/// ```rust
/// use sms_drivers::{GatewayConfig, ProviderId, ServiceConfig};
/// use std::time::Duration;
///
/// let config = ServiceConfig::builder()
///     .default_driver(ProviderId::Kavenegar)
///     .timeout(Duration::from_secs(5))
///     .kavenegar(GatewayConfig::new("https://api.kavenegar.com/v1/", "key", "10004346"))
///     .build()
///     .unwrap();
///
/// assert_eq!(config.default_driver, ProviderId::Kavenegar);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ServiceConfig {
    /// Driver used when a message does not name one.
    pub default_driver: ProviderId,
    /// HTTP request timeout, in milliseconds when deserialized.
    #[serde(default = "default_timeout", deserialize_with = "deserialize_millis")]
    pub timeout: Duration,
    pub drivers: DriversConfig,
}

impl ServiceConfig {
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::default()
    }

    /// Check the whole configuration, including every present driver section.
    pub fn validate(&self) -> Result<()> {
        if self.drivers.is_empty() {
            return Err(SmsError::configuration(
                "At least one driver configuration is required",
            ));
        }

        if self.drivers.get(self.default_driver).is_none() {
            return Err(SmsError::configuration(format!(
                "Default driver '{}' is not configured",
                self.default_driver
            )));
        }

        if self.timeout.is_zero() {
            return Err(SmsError::configuration(
                "Timeout must be a positive number of milliseconds",
            ));
        }

        for provider in self.drivers.configured() {
            self.validate_driver(provider)?;
        }

        Ok(())
    }

    /// Check one provider's section and return it.
    pub fn validate_driver(&self, provider: ProviderId) -> Result<DriverSettings<'_>> {
        let settings = self.drivers.get(provider).ok_or_else(|| {
            SmsError::configuration(format!("Driver '{provider}' is not configured"))
        })?;

        if let DriverSettings::Gateway(gateway) = settings {
            gateway.validate(provider)?;
        }

        Ok(settings)
    }

    /// Mock-only configuration for tests.
    pub fn for_testing(should_fail: bool, delay: u64) -> Self {
        Self {
            default_driver: ProviderId::Mock,
            timeout: Duration::from_millis(5_000),
            drivers: DriversConfig {
                mock: Some(MockConfig::new(should_fail, delay)),
                ..DriversConfig::default()
            },
        }
    }

    /// Kavenegar-only configuration. `url` defaults to the public API.
    pub fn kavenegar(
        api_key: impl Into<String>,
        line_number: impl Into<String>,
        url: Option<&str>,
    ) -> Result<Self> {
        Self::single_gateway(ProviderId::Kavenegar, api_key, line_number, url)
    }

    /// SMS.ir-only configuration. `url` defaults to the public API.
    pub fn smsir(
        api_key: impl Into<String>,
        line_number: impl Into<String>,
        url: Option<&str>,
    ) -> Result<Self> {
        Self::single_gateway(ProviderId::SmsIr, api_key, line_number, url)
    }

    /// Melipayamak-only configuration. `url` defaults to the public API.
    pub fn melipayamak(
        api_key: impl Into<String>,
        line_number: impl Into<String>,
        url: Option<&str>,
    ) -> Result<Self> {
        Self::single_gateway(ProviderId::Melipayamak, api_key, line_number, url)
    }

    /// IPPanel-only configuration. `url` defaults to the public API.
    pub fn ippanel(
        api_key: impl Into<String>,
        line_number: impl Into<String>,
        url: Option<&str>,
    ) -> Result<Self> {
        Self::single_gateway(ProviderId::Ippanel, api_key, line_number, url)
    }

    fn single_gateway(
        provider: ProviderId,
        api_key: impl Into<String>,
        line_number: impl Into<String>,
        url: Option<&str>,
    ) -> Result<Self> {
        let url = url.or(default_url(provider)).unwrap_or_default();
        Self::builder()
            .default_driver(provider)
            .gateway(provider, GatewayConfig::new(url, api_key, line_number))
            .build()
    }

    /// Merge partial configurations; later parts win.
    ///
    /// Starts from Kavenegar as default driver and a 10 second timeout.
    pub fn merge<I>(parts: I) -> Result<Self>
    where
        I: IntoIterator<Item = ServiceConfigBuilder>,
    {
        let base = ServiceConfigBuilder::default()
            .default_driver(ProviderId::Kavenegar)
            .timeout(DEFAULT_TIMEOUT);

        parts
            .into_iter()
            .fold(base, ServiceConfigBuilder::merge)
            .build()
    }
}

/// Builder for [`ServiceConfig`]; also serves as a partial configuration.
#[derive(Debug, Clone, Default)]
pub struct ServiceConfigBuilder {
    pub(crate) default_driver: Option<ProviderId>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) drivers: DriversConfig,
}

impl ServiceConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default driver. Required.
    pub fn default_driver(mut self, provider: ProviderId) -> Self {
        self.default_driver = Some(provider);
        self
    }

    /// Set the HTTP timeout.
    ///
    /// Default: 10 seconds
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn kavenegar(self, config: GatewayConfig) -> Self {
        self.gateway(ProviderId::Kavenegar, config)
    }

    pub fn smsir(self, config: GatewayConfig) -> Self {
        self.gateway(ProviderId::SmsIr, config)
    }

    pub fn melipayamak(self, config: GatewayConfig) -> Self {
        self.gateway(ProviderId::Melipayamak, config)
    }

    pub fn ippanel(self, config: GatewayConfig) -> Self {
        self.gateway(ProviderId::Ippanel, config)
    }

    /// Set a regional gateway section by id. Ignored for [`ProviderId::Mock`].
    pub fn gateway(mut self, provider: ProviderId, config: GatewayConfig) -> Self {
        self.drivers.set_gateway(provider, config);
        self
    }

    pub fn mock(mut self, config: MockConfig) -> Self {
        self.drivers.mock = Some(config);
        self
    }

    /// Overlay the fields set in `other`.
    pub fn merge(mut self, other: ServiceConfigBuilder) -> Self {
        if other.default_driver.is_some() {
            self.default_driver = other.default_driver;
        }
        if other.timeout.is_some() {
            self.timeout = other.timeout;
        }
        self.drivers.overlay(other.drivers);
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<ServiceConfig> {
        let default_driver = self
            .default_driver
            .ok_or_else(|| SmsError::missing_config("defaultDriver"))?;

        let config = ServiceConfig {
            default_driver,
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            drivers: self.drivers,
        };
        config.validate()?;
        Ok(config)
    }
}
