//! Error types for SMS driver operations.
//!
//! Only conditions detected before any network interaction are raised as
//! errors: bad configuration, malformed messages and unknown providers.
//! Gateway-side and transport-side failures are reported through a failed
//! [`Response`](crate::Response) instead.

use std::error::Error as StdError;
use thiserror::Error;

/// Errors raised by the service, the driver factory and the drivers.
///
/// # Examples
///
/// ```rust
/// use sms_drivers::SmsError;
///
/// let err = SmsError::missing_config("defaultDriver");
/// assert!(err.is_configuration());
/// assert_eq!(err.code(), "MISSING_CONFIG");
/// ```
#[derive(Debug, Error)]
pub enum SmsError {
    /// Service or driver configuration is missing or malformed.
    #[error("{message}")]
    Configuration {
        message: String,
        /// Optional machine-readable code.
        code: Option<&'static str>,
    },

    /// A required configuration key is absent.
    #[error("Missing required configuration: {key}")]
    MissingConfig { key: String },

    /// The requested driver is not one of the known providers.
    #[error("Unsupported SMS driver: {provider}")]
    UnsupportedProvider { provider: String },

    /// The message is malformed; nothing was sent.
    #[error("{message}")]
    Validation {
        message: String,
        /// Optional machine-readable code.
        code: Option<&'static str>,
    },

    /// Unexpected failure wrapped by the service layer.
    #[error("{context} failed: {source}")]
    Service {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl SmsError {
    /// Build a configuration error without a specific code.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            code: None,
        }
    }

    /// Build a missing-configuration error for `key`.
    pub fn missing_config(key: impl Into<String>) -> Self {
        Self::MissingConfig { key: key.into() }
    }

    /// Build an unsupported-provider error.
    pub fn unsupported_provider(provider: impl Into<String>) -> Self {
        Self::UnsupportedProvider {
            provider: provider.into(),
        }
    }

    /// Build a message validation error without a specific code.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            code: None,
        }
    }

    /// Build a message validation error carrying a code.
    pub fn validation_with_code(message: impl Into<String>, code: &'static str) -> Self {
        Self::Validation {
            message: message.into(),
            code: Some(code),
        }
    }

    /// Wrap an unexpected error with the operation it interrupted.
    pub fn service(
        context: impl Into<String>,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self::Service {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration { code, .. } => code.unwrap_or("CONFIGURATION_ERROR"),
            Self::MissingConfig { .. } => "MISSING_CONFIG",
            Self::UnsupportedProvider { .. } => "UNSUPPORTED_DRIVER",
            Self::Validation { code, .. } => code.unwrap_or("VALIDATION_ERROR"),
            Self::Service { .. } => "SERVICE_ERROR",
        }
    }

    /// True for configuration problems, including missing keys.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. } | Self::MissingConfig { .. })
    }

    /// True for malformed messages.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// True when an unknown provider was requested.
    pub fn is_unsupported_provider(&self) -> bool {
        matches!(self, Self::UnsupportedProvider { .. })
    }
}

pub type Result<T> = std::result::Result<T, SmsError>;
