//! SMTP probe configuration (C3's companion data, §6 configuration surface).

use evcheck_core::Address;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_FROM_EMAIL: &str = "user@example.org";
pub const DEFAULT_HELLO_NAME: &str = "localhost";
pub const DEFAULT_PORT: u16 = 25;
pub const DEFAULT_TIMEOUT_CONNECTION: Duration = Duration::from_secs(5);
pub const DEFAULT_TIMEOUT_RESPONSE: Duration = Duration::from_secs(5);

/// Per-call override of the SMTP checker's defaults. Empty-string/zero
/// fields are sentinels for "inherit default"; [`Options::merge`] resolves
/// per-call options over the checker's own configured options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Options {
    pub email_from: Option<Address>,
    pub hello_name: Option<String>,
    pub proxy: Option<String>,
    pub timeout_connection: Option<Duration>,
    pub timeout_response: Option<Duration>,
    pub port: Option<u16>,
}

impl Options {
    pub fn with_defaults() -> Self {
        Self {
            email_from: Some(Address::from_string(DEFAULT_FROM_EMAIL)),
            hello_name: Some(DEFAULT_HELLO_NAME.to_string()),
            proxy: None,
            timeout_connection: Some(DEFAULT_TIMEOUT_CONNECTION),
            timeout_response: Some(DEFAULT_TIMEOUT_RESPONSE),
            port: Some(DEFAULT_PORT),
        }
    }

    /// Resolves `self` (the per-call override, e.g. from `Input`) over
    /// `base` (the checker's configured options), falling back to the
    /// hard-coded defaults for anything still unset.
    pub fn merge(&self, base: &Options) -> ResolvedOptions {
        ResolvedOptions {
            email_from: self
                .email_from
                .clone()
                .or_else(|| base.email_from.clone())
                .unwrap_or_else(|| Address::from_string(DEFAULT_FROM_EMAIL)),
            hello_name: self
                .hello_name
                .clone()
                .or_else(|| base.hello_name.clone())
                .unwrap_or_else(|| DEFAULT_HELLO_NAME.to_string()),
            proxy: self.proxy.clone().or_else(|| base.proxy.clone()),
            timeout_connection: self
                .timeout_connection
                .or(base.timeout_connection)
                .unwrap_or(DEFAULT_TIMEOUT_CONNECTION),
            timeout_response: self
                .timeout_response
                .or(base.timeout_response)
                .unwrap_or(DEFAULT_TIMEOUT_RESPONSE),
            port: self.port.or(base.port).unwrap_or(DEFAULT_PORT),
        }
    }
}

/// Fully resolved options, ready to drive one checker run.
#[derive(Debug, Clone)]
pub struct ResolvedOptions {
    pub email_from: Address,
    pub hello_name: String,
    pub proxy: Option<String>,
    pub timeout_connection: Duration,
    pub timeout_response: Duration,
    pub port: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_overrides_fall_back_to_base_then_hardcoded_defaults() {
        let base = Options::with_defaults();
        let call = Options::default();
        let resolved = call.merge(&base);
        assert_eq!(resolved.port, DEFAULT_PORT);
        assert_eq!(resolved.hello_name, DEFAULT_HELLO_NAME);
        assert_eq!(resolved.email_from.to_string(), DEFAULT_FROM_EMAIL);
    }

    #[test]
    fn per_call_override_wins() {
        let base = Options::with_defaults();
        let call = Options {
            port: Some(2525),
            ..Default::default()
        };
        let resolved = call.merge(&base);
        assert_eq!(resolved.port, 2525);
    }
}
