#![expect(
    clippy::module_name_repetitions,
    reason = "Configuration types intentionally mirror the module name for clarity"
)]

use std::time::Duration;

use backoff::backoff::Constant;

const DEFAULT_HEARTBEAT_INTERVAL_DURATION: Duration = Duration::from_secs(30);
const DEFAULT_RECONNECT_DELAY_DURATION: Duration = Duration::from_secs(3);
const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 9999;

/// Configuration for WebSocket client behavior.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct Config {
    /// Interval for sending keep-alive frames while connected
    pub heartbeat_interval: Duration,
    /// Reconnection strategy configuration
    pub reconnect: ReconnectConfig,
}

impl Config {
    /// Override the heartbeat interval.
    #[must_use]
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Override the reconnection strategy.
    #[must_use]
    pub fn with_reconnect(mut self, reconnect: ReconnectConfig) -> Self {
        self.reconnect = reconnect;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL_DURATION,
            reconnect: ReconnectConfig::default(),
        }
    }
}

/// Configuration for automatic reconnection behavior.
///
/// Reconnection uses a flat delay between a close and the next attempt. The
/// attempt counter resets whenever a transport opens, so `max_attempts` bounds
/// consecutive failures rather than the lifetime total.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Maximum number of consecutive reconnection attempts before giving up.
    /// `None` means infinite retries.
    pub max_attempts: Option<u32>,
    /// Delay between a close and the next connection attempt
    pub delay: Duration,
}

impl ReconnectConfig {
    /// Retry forever with the given delay.
    #[must_use]
    pub fn forever(delay: Duration) -> Self {
        Self {
            max_attempts: None,
            delay,
        }
    }

    /// Retry up to `max_attempts` consecutive times with the given delay.
    #[must_use]
    pub fn limited(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: Some(max_attempts),
            delay,
        }
    }

    /// Never reconnect after the first close.
    #[must_use]
    pub fn disabled() -> Self {
        Self::limited(0, Duration::ZERO)
    }

    /// Whether another attempt is allowed after `attempt` consecutive ones.
    #[must_use]
    pub fn allows(&self, attempt: u32) -> bool {
        self.max_attempts.is_none_or(|max| attempt < max)
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: Some(DEFAULT_MAX_RECONNECT_ATTEMPTS),
            delay: DEFAULT_RECONNECT_DELAY_DURATION,
        }
    }
}

impl From<ReconnectConfig> for Constant {
    fn from(config: ReconnectConfig) -> Self {
        Constant::new(config.delay)
    }
}

#[cfg(test)]
mod tests {
    use backoff::backoff::Backoff as _;

    use super::*;

    #[test]
    fn backoff_is_fixed() {
        let mut backoff: Constant = ReconnectConfig::default().into();

        for _ in 0..10 {
            assert_eq!(backoff.next_backoff(), Some(Duration::from_secs(3)));
        }
    }

    #[test]
    fn default_heartbeat_is_thirty_seconds() {
        let config = Config::default();
        assert_eq!(config.heartbeat_interval, Duration::from_secs(30));
    }

    #[test]
    fn default_retry_budget_is_effectively_unbounded() {
        let config = ReconnectConfig::default();

        assert!(config.allows(0));
        assert!(config.allows(9998));
        assert!(!config.allows(9999));
    }

    #[test]
    fn forever_always_allows() {
        assert!(ReconnectConfig::forever(Duration::from_secs(1)).allows(u32::MAX));
    }

    #[test]
    fn disabled_never_allows() {
        assert!(!ReconnectConfig::disabled().allows(0));
    }
}
