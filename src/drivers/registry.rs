//! Static mapping from [`ProviderId`] to driver constructors.

use super::ippanel::IppanelDriver;
use super::kavenegar::KavenegarDriver;
use super::melipayamak::MelipayamakDriver;
use super::mock::MockDriver;
use super::smsir::SmsIrDriver;
use super::traits::Driver;
use crate::config::{DriverSettings, GatewayConfig};
use crate::errors::{Result, SmsError};
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{Message, ProviderId, Response};

/// One driver of any supported provider.
#[derive(Debug)]
pub enum AnyDriver<T: Transport = ReqwestTransport> {
    Kavenegar(KavenegarDriver<T>),
    SmsIr(SmsIrDriver<T>),
    Melipayamak(MelipayamakDriver<T>),
    Ippanel(IppanelDriver<T>),
    Mock(MockDriver),
}

impl<T: Transport> AnyDriver<T> {
    /// The mock driver, when this is one. Gives access to its ledger.
    pub fn as_mock(&self) -> Option<&MockDriver> {
        match self {
            Self::Mock(driver) => Some(driver),
            _ => None,
        }
    }
}

impl<T: Transport> Driver for AnyDriver<T> {
    fn provider(&self) -> ProviderId {
        match self {
            Self::Kavenegar(driver) => driver.provider(),
            Self::SmsIr(driver) => driver.provider(),
            Self::Melipayamak(driver) => driver.provider(),
            Self::Ippanel(driver) => driver.provider(),
            Self::Mock(driver) => driver.provider(),
        }
    }

    async fn verify(&self, message: &Message) -> Result<Response> {
        match self {
            Self::Kavenegar(driver) => driver.verify(message).await,
            Self::SmsIr(driver) => driver.verify(message).await,
            Self::Melipayamak(driver) => driver.verify(message).await,
            Self::Ippanel(driver) => driver.verify(message).await,
            Self::Mock(driver) => driver.verify(message).await,
        }
    }
}

/// Builds a driver from its already validated settings.
pub type Constructor<T> = fn(DriverSettings<'_>, &T) -> Result<AnyDriver<T>>;

/// Constructor registered for `provider`.
pub fn constructor<T: Transport>(provider: ProviderId) -> Constructor<T> {
    match provider {
        ProviderId::Kavenegar => build_kavenegar::<T>,
        ProviderId::SmsIr => build_smsir::<T>,
        ProviderId::Melipayamak => build_melipayamak::<T>,
        ProviderId::Ippanel => build_ippanel::<T>,
        ProviderId::Mock => build_mock::<T>,
    }
}

fn build_kavenegar<T: Transport>(
    settings: DriverSettings<'_>,
    transport: &T,
) -> Result<AnyDriver<T>> {
    let config = gateway(settings, ProviderId::Kavenegar)?;
    Ok(AnyDriver::Kavenegar(KavenegarDriver::new(config, transport.clone())))
}

fn build_smsir<T: Transport>(
    settings: DriverSettings<'_>,
    transport: &T,
) -> Result<AnyDriver<T>> {
    let config = gateway(settings, ProviderId::SmsIr)?;
    Ok(AnyDriver::SmsIr(SmsIrDriver::new(config, transport.clone())))
}

fn build_melipayamak<T: Transport>(
    settings: DriverSettings<'_>,
    transport: &T,
) -> Result<AnyDriver<T>> {
    let config = gateway(settings, ProviderId::Melipayamak)?;
    Ok(AnyDriver::Melipayamak(MelipayamakDriver::new(config, transport.clone())))
}

fn build_ippanel<T: Transport>(
    settings: DriverSettings<'_>,
    transport: &T,
) -> Result<AnyDriver<T>> {
    let config = gateway(settings, ProviderId::Ippanel)?;
    Ok(AnyDriver::Ippanel(IppanelDriver::new(config, transport.clone())))
}

fn build_mock<T: Transport>(settings: DriverSettings<'_>, _transport: &T) -> Result<AnyDriver<T>> {
    match settings {
        DriverSettings::Mock(config) => Ok(AnyDriver::Mock(MockDriver::new(config.clone()))),
        DriverSettings::Gateway(_) => Err(SmsError::configuration(
            "Driver 'mock' requires a mock configuration",
        )),
    }
}

/// Construct the driver for `provider`.
pub fn construct<T: Transport>(
    provider: ProviderId,
    settings: DriverSettings<'_>,
    transport: &T,
) -> Result<AnyDriver<T>> {
    constructor::<T>(provider)(settings, transport)
}

fn gateway(settings: DriverSettings<'_>, provider: ProviderId) -> Result<GatewayConfig> {
    match settings {
        DriverSettings::Gateway(config) => Ok(config.clone()),
        DriverSettings::Mock(_) => Err(SmsError::configuration(format!(
            "Driver '{provider}' requires url, apiKey and lineNumber"
        ))),
    }
}
