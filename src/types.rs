//! Core types shared by the service, the factory and every driver.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::errors::SmsError;

// =============================================================================
// ProviderId
// =============================================================================

/// Identifier of an SMS gateway driver.
///
/// The set is closed: every variant has a driver in the static registry.
///
/// # Example
///
/// ```rust
/// use sms_drivers::ProviderId;
///
/// let id: ProviderId = "smsir".parse().unwrap();
/// assert_eq!(id, ProviderId::SmsIr);
/// assert_eq!(id.to_string(), "smsir");
/// assert!("twilio".parse::<ProviderId>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Kavenegar,
    #[serde(rename = "smsir")]
    SmsIr,
    Melipayamak,
    Ippanel,
    /// In-memory stand-in that never touches the network.
    Mock,
}

impl ProviderId {
    /// Every known provider, in declaration order.
    pub const ALL: [ProviderId; 5] = [
        ProviderId::Kavenegar,
        ProviderId::SmsIr,
        ProviderId::Melipayamak,
        ProviderId::Ippanel,
        ProviderId::Mock,
    ];

    /// Lowercase wire/config name of the provider.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kavenegar => "kavenegar",
            Self::SmsIr => "smsir",
            Self::Melipayamak => "melipayamak",
            Self::Ippanel => "ippanel",
            Self::Mock => "mock",
        }
    }

    /// Prefix used in environment variable names (e.g. `SMS_SMSIR_URL`).
    pub fn env_prefix(&self) -> &'static str {
        match self {
            Self::Kavenegar => "SMS_KAVENEGAR",
            Self::SmsIr => "SMS_SMSIR",
            Self::Melipayamak => "SMS_MELIPAYAMAK",
            Self::Ippanel => "SMS_IPPANEL",
            Self::Mock => "SMS_MOCK",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = SmsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        ProviderId::ALL
            .into_iter()
            .find(|id| id.as_str() == name)
            .ok_or_else(|| SmsError::unsupported_provider(s.trim()))
    }
}

// =============================================================================
// Tokens
// =============================================================================

/// A scalar substitution value for a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl TokenValue {
    /// Whether the value counts as "set" for providers that skip blank fields.
    ///
    /// Empty text, zero, NaN and `false` are not truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Integer(i) => *i != 0,
            Self::Float(f) => *f != 0.0 && !f.is_nan(),
            Self::Text(s) => !s.is_empty(),
        }
    }
}

impl Display for TokenValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            // Whole floats render without a fractional part, as gateways expect "5" not "5.0".
            Self::Float(x) if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e15 => {
                write!(f, "{}", *x as i64)
            }
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for TokenValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for TokenValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for TokenValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for TokenValue {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<i64> for TokenValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u32> for TokenValue {
    fn from(value: u32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<f64> for TokenValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// Template substitution values, either positional or named.
///
/// Named tokens keep the order the caller inserted them in.
///
/// # Example
///
/// ```rust
/// use sms_drivers::Tokens;
///
/// let ordered = Tokens::ordered(["John", "Premium"]);
/// assert_eq!(ordered.len(), 2);
///
/// let named = Tokens::named([("code", "12345")]);
/// assert!(!named.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Tokens {
    Ordered(Vec<TokenValue>),
    Named(IndexMap<String, TokenValue>),
}

impl Tokens {
    /// Build positional tokens.
    pub fn ordered<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<TokenValue>,
    {
        Self::Ordered(values.into_iter().map(Into::into).collect())
    }

    /// Build named tokens.
    pub fn named<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<TokenValue>,
    {
        Self::Named(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        match self {
            Self::Ordered(values) => values.len(),
            Self::Named(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// Message
// =============================================================================

/// Canonical outbound message accepted by every driver.
///
/// A message carries either free-form `content` or a provider-side
/// `template`; a template always comes with `tokens`.
///
/// # Example
///
/// ```rust
/// use sms_drivers::{Message, ProviderId, Tokens};
///
/// let message = Message::verification("+989123456789", "otp", Tokens::named([("code", "12345")]))
///     .with_driver(ProviderId::Mock);
///
/// assert_eq!(message.template.as_deref(), Some("otp"));
/// assert_eq!(message.driver, Some(ProviderId::Mock));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Recipient phone number.
    pub to: String,
    /// Sender line; drivers fall back to the configured line number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Provider-side template identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<Tokens>,
    /// Driver to use instead of the configured default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<ProviderId>,
}

impl Message {
    /// Create a template-based (OTP/verification) message.
    pub fn verification(
        to: impl Into<String>,
        template: impl Into<String>,
        tokens: Tokens,
    ) -> Self {
        Self {
            to: to.into(),
            template: Some(template.into()),
            tokens: Some(tokens),
            ..Self::default()
        }
    }

    /// Create a free-form text message.
    pub fn text(to: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// Route the message through a specific driver.
    pub fn with_driver(mut self, driver: ProviderId) -> Self {
        self.driver = Some(driver);
        self
    }

    /// Set the sender line.
    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    /// Set free-form content.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }
}

// =============================================================================
// Response
// =============================================================================

/// Canonical result of a send attempt, regardless of provider.
///
/// A successful response never carries an error; a failed one always does.
/// The constructors are the only way to build one, which keeps that true.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<String>,
}

impl Response {
    /// Successful send with the raw provider payload.
    pub fn success(data: Value, message_id: Option<String>) -> Self {
        Self {
            success: true,
            message_id,
            data: Some(data),
            error: None,
            error_code: None,
        }
    }

    /// Failed send. `data` may hold the raw provider payload for diagnostics.
    pub fn failure(
        error: impl Into<String>,
        error_code: Option<String>,
        data: Option<Value>,
    ) -> Self {
        let error = error.into();
        Self {
            success: false,
            message_id: None,
            data,
            error: Some(if error.is_empty() {
                "Unknown error".to_string()
            } else {
                error
            }),
            error_code,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn message_id(&self) -> Option<&str> {
        self.message_id.as_deref()
    }

    /// Raw provider payload.
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn error_code(&self) -> Option<&str> {
        self.error_code.as_deref()
    }

    /// Submit status this response stands for.
    pub fn status(&self) -> SmsStatus {
        if self.success {
            SmsStatus::Sent
        } else {
            SmsStatus::Failed
        }
    }
}

// =============================================================================
// SmsStatus
// =============================================================================

/// Lifecycle status recorded for a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmsStatus {
    Sent,
    Failed,
}

impl Display for SmsStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Sent => "sent",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}
