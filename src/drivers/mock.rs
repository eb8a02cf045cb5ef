//! In-memory driver for development and tests.
//!
//! Nothing leaves the process. Every accepted message is appended to a
//! per-instance ledger that tests can inspect.

use super::base::{require_template, validate_message};
use super::traits::Driver;
use crate::config::MockConfig;
use crate::errors::Result;
use crate::types::{Message, ProviderId, Response, SmsStatus, TokenValue, Tokens};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[cfg(feature = "tracing")]
use super::base::record_outcome;
#[cfg(feature = "tracing")]
use crate::utils::mask_phone_number;
#[cfg(feature = "tracing")]
use tracing::info;

/// Error code returned when the mock is configured to fail.
pub const MOCK_FAILURE: &str = "MOCK_FAILURE";

/// A message accepted by [`MockDriver`].
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    /// The original message with `content` replaced by the rendered template.
    pub message: Message,
    pub message_id: String,
    pub status: SmsStatus,
    pub sent_at: DateTime<Utc>,
}

/// Driver that records messages instead of sending them.
///
/// Message ids look like `mock-{unix_millis}-{n}` where `n` starts at 1 and
/// grows by one per accepted message of this instance.
#[derive(Debug)]
pub struct MockDriver {
    config: MockConfig,
    next_id: AtomicU64,
    sent: Mutex<Vec<SentMessage>>,
}

impl MockDriver {
    pub fn new(config: MockConfig) -> Self {
        Self {
            config,
            next_id: AtomicU64::new(1),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &MockConfig {
        &self.config
    }

    /// Snapshot of every accepted message, oldest first.
    pub fn sent_messages(&self) -> Vec<SentMessage> {
        self.ledger().clone()
    }

    /// Accepted message with the given id.
    pub fn sent_message(&self, message_id: &str) -> Option<SentMessage> {
        self.ledger()
            .iter()
            .find(|sent| sent.message_id == message_id)
            .cloned()
    }

    pub fn sent_count(&self) -> usize {
        self.ledger().len()
    }

    fn ledger(&self) -> MutexGuard<'_, Vec<SentMessage>> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_message_id(&self, now: DateTime<Utc>) -> String {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        format!("mock-{}-{n}", now.timestamp_millis())
    }
}

/// Render a template and its tokens the way the mock ledger shows them.
///
/// `[Template: otp] Tokens: [a, b]` for positional tokens and
/// `[Template: otp] Tokens: {"code":"1"}` for named ones.
pub fn render_template(template: &str, tokens: &Tokens) -> String {
    let tokens = match tokens {
        Tokens::Ordered(values) => {
            let values: Vec<String> = values.iter().map(TokenValue::to_string).collect();
            format!("[{}]", values.join(", "))
        }
        Tokens::Named(map) => serde_json::to_string(map).unwrap_or_default(),
    };
    format!("[Template: {template}] Tokens: {tokens}")
}

impl Driver for MockDriver {
    fn provider(&self) -> ProviderId {
        ProviderId::Mock
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "MockDriver::verify",
            skip_all,
            fields(
                to = %mask_phone_number(&message.to),
                template = ?message.template,
                message_id = tracing::field::Empty,
            )
        )
    )]
    async fn verify(&self, message: &Message) -> Result<Response> {
        validate_message(message)?;
        let (template, tokens) = match require_template(message) {
            Ok(parts) => parts,
            Err(response) => return Ok(response),
        };

        if self.config.delay > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.delay)).await;
        }

        if self.config.should_fail {
            let response = Response::failure(
                "Mock driver configured to fail",
                Some(MOCK_FAILURE.to_string()),
                None,
            );
            #[cfg(feature = "tracing")]
            record_outcome(&response);
            return Ok(response);
        }

        let now = Utc::now();
        let content = render_template(template, tokens);

        let message_id = {
            let mut ledger = self.ledger();
            let message_id = self.next_message_id(now);
            ledger.push(SentMessage {
                message: Message {
                    content: Some(content.clone()),
                    ..message.clone()
                },
                message_id: message_id.clone(),
                status: SmsStatus::Sent,
                sent_at: now,
            });
            message_id
        };

        #[cfg(feature = "tracing")]
        info!(message_id = %message_id, "Mock verification SMS recorded");

        let response = Response::success(
            json!({
                "provider": "mock",
                "timestamp": now.to_rfc3339_opts(SecondsFormat::Millis, true),
                "recipient": message.to,
                "template": template,
                "processedContent": content,
            }),
            Some(message_id),
        );

        #[cfg(feature = "tracing")]
        record_outcome(&response);

        Ok(response)
    }
}
