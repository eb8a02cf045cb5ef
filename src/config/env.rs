//! Loading [`ServiceConfig`] from `SMS_*` environment variables.
//!
//! | Variable                       | Meaning                                  |
//! |--------------------------------|------------------------------------------|
//! | `SMS_DEFAULT_DRIVER`           | default driver id (default `kavenegar`)  |
//! | `SMS_TIMEOUT`                  | request timeout in ms (default `10000`)  |
//! | `SMS_<PROVIDER>_URL`           | gateway base URL                         |
//! | `SMS_<PROVIDER>_API_KEY`       | gateway API key                          |
//! | `SMS_<PROVIDER>_LINE_NUMBER`   | default sender line                      |
//! | `SMS_USE_MOCK`                 | `true` adds the mock driver              |
//! | `SMS_MOCK_SHOULD_FAIL`         | `true` makes the mock fail               |
//! | `SMS_MOCK_DELAY`               | simulated mock latency in ms             |
//!
//! A gateway section is present when its URL or API key is set. A missing
//! URL falls back to the provider's public endpoint.

use super::types::{
    GatewayConfig, MockConfig, ServiceConfig, ServiceConfigBuilder, default_url,
};
use crate::errors::{Result, SmsError};
use crate::transport::DEFAULT_TIMEOUT;
use crate::types::ProviderId;
use std::collections::HashMap;
use std::time::Duration;

impl ServiceConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from an explicit set of variables.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(k, _)| k.starts_with("SMS_"))
            .collect();
        let get = |key: &str| lookup(&vars, key);

        let default_driver = match get("SMS_DEFAULT_DRIVER") {
            Some(raw) => raw.parse::<ProviderId>().map_err(|_| {
                SmsError::configuration(format!("Unknown SMS_DEFAULT_DRIVER: {raw}"))
            })?,
            None => ProviderId::Kavenegar,
        };

        let timeout = match get("SMS_TIMEOUT") {
            Some(raw) => raw.parse::<u64>().map(Duration::from_millis).map_err(|_| {
                SmsError::configuration(format!(
                    "SMS_TIMEOUT must be a number of milliseconds, got '{raw}'"
                ))
            })?,
            None => DEFAULT_TIMEOUT,
        };

        let mut builder = ServiceConfigBuilder::new()
            .default_driver(default_driver)
            .timeout(timeout);

        for provider in ProviderId::ALL {
            let Some(fallback_url) = default_url(provider) else {
                continue;
            };
            let prefix = provider.env_prefix();
            let url = get(&format!("{prefix}_URL"));
            let api_key = get(&format!("{prefix}_API_KEY"));

            if url.is_none() && api_key.is_none() {
                continue;
            }

            let line_number = get(&format!("{prefix}_LINE_NUMBER")).unwrap_or_default();
            builder = builder.gateway(
                provider,
                GatewayConfig::new(
                    url.unwrap_or(fallback_url),
                    api_key.unwrap_or_default(),
                    line_number,
                ),
            );
        }

        if get("SMS_USE_MOCK").is_some_and(is_true) {
            let should_fail = get("SMS_MOCK_SHOULD_FAIL").is_some_and(is_true);
            let delay = match get("SMS_MOCK_DELAY") {
                Some(raw) => raw.parse::<u64>().map_err(|_| {
                    SmsError::configuration(format!(
                        "SMS_MOCK_DELAY must be a number of milliseconds, got '{raw}'"
                    ))
                })?,
                None => 0,
            };
            builder = builder.mock(MockConfig::new(should_fail, delay));
        }

        builder.build()
    }

    /// Example `.env` contents covering every supported variable.
    pub fn sample_env() -> String {
        let mut out = String::from(
            "# Default driver: kavenegar, smsir, melipayamak, ippanel or mock\n\
             SMS_DEFAULT_DRIVER=kavenegar\n\
             # Request timeout in milliseconds\n\
             SMS_TIMEOUT=10000\n",
        );

        for provider in ProviderId::ALL {
            let Some(url) = default_url(provider) else {
                continue;
            };
            let prefix = provider.env_prefix();
            out.push_str(&format!(
                "\n{prefix}_URL={url}\n{prefix}_API_KEY=your-api-key\n{prefix}_LINE_NUMBER=your-line-number\n"
            ));
        }

        out.push_str(
            "\n# Mock driver for development and tests\n\
             SMS_USE_MOCK=false\n\
             SMS_MOCK_SHOULD_FAIL=false\n\
             SMS_MOCK_DELAY=0\n",
        );
        out
    }
}

fn lookup<'a>(vars: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn is_true(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}
