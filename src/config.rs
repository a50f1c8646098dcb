//! Engine configuration.
//!
//! [`Config`] carries the per-exchange endpoints, the display depth and the
//! reconnection policy. Defaults point at the production endpoints; tests
//! and local gateways can override them with the builder methods.

use std::time::Duration;

/// Configuration for the feed engine
///
/// # Example
///
/// ```rust
/// use perpbook::Config;
///
/// let config = Config::new()
///     .with_depth(20)
///     .with_reconnect(perpbook::config::ReconnectConfig::new().initial_delay_ms(1_000));
/// assert_eq!(config.depth(), 20);
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    hyperliquid_ws_url: String,
    hyperliquid_info_url: String,
    lighter_ws_url: String,
    depth: usize,
    reconnect: ReconnectConfig,
    http_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hyperliquid_ws_url: "wss://api.hyperliquid.xyz/ws".to_string(),
            hyperliquid_info_url: "https://api.hyperliquid.xyz/info".to_string(),
            lighter_ws_url: "wss://api.lighter.xyz/stream".to_string(),
            depth: 15,
            reconnect: ReconnectConfig::default(),
            http_timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    /// Create a configuration with production endpoints and defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the Hyperliquid WebSocket endpoint
    #[must_use]
    pub fn with_hyperliquid_ws_url(mut self, url: impl Into<String>) -> Self {
        self.hyperliquid_ws_url = url.into();
        self
    }

    /// Override the Hyperliquid info (REST) endpoint
    #[must_use]
    pub fn with_hyperliquid_info_url(mut self, url: impl Into<String>) -> Self {
        self.hyperliquid_info_url = url.into();
        self
    }

    /// Override the Lighter WebSocket endpoint
    #[must_use]
    pub fn with_lighter_ws_url(mut self, url: impl Into<String>) -> Self {
        self.lighter_ws_url = url.into();
        self
    }

    /// Set the display depth (levels per side in every [`crate::orderbook::DepthView`])
    #[must_use]
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    /// Set the reconnection policy
    #[must_use]
    pub fn with_reconnect(mut self, reconnect: ReconnectConfig) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// Set the HTTP request timeout for catalog fetches
    #[must_use]
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Hyperliquid WebSocket endpoint
    #[must_use]
    pub fn hyperliquid_ws_url(&self) -> &str {
        &self.hyperliquid_ws_url
    }

    /// Hyperliquid info (REST) endpoint
    #[must_use]
    pub fn hyperliquid_info_url(&self) -> &str {
        &self.hyperliquid_info_url
    }

    /// Lighter WebSocket endpoint
    #[must_use]
    pub fn lighter_ws_url(&self) -> &str {
        &self.lighter_ws_url
    }

    /// Display depth
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Reconnection policy
    #[must_use]
    pub fn reconnect(&self) -> &ReconnectConfig {
        &self.reconnect
    }

    /// HTTP request timeout
    #[must_use]
    pub fn http_timeout(&self) -> Duration {
        self.http_timeout
    }
}

/// Reconnection backoff policy.
///
/// Reconnection retries forever: a feed has no terminal failure state while
/// a consumer still wants data. The delay grows by `backoff_multiplier` per
/// consecutive failure and is capped at `max_delay_ms`.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnect attempt
    pub initial_delay_ms: u64,
    /// Cap on the delay between attempts
    pub max_delay_ms: u64,
    /// Multiplier applied per consecutive failed attempt
    pub backoff_multiplier: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 5_000,
            max_delay_ms: 60_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl ReconnectConfig {
    /// Create a policy with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial delay in milliseconds
    #[must_use]
    pub fn initial_delay_ms(mut self, ms: u64) -> Self {
        self.initial_delay_ms = ms;
        self
    }

    /// Set the maximum delay in milliseconds
    #[must_use]
    pub fn max_delay_ms(mut self, ms: u64) -> Self {
        self.max_delay_ms = ms;
        self
    }

    /// Set the backoff multiplier
    #[must_use]
    pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Delay before the given (0-based) reconnect attempt
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        Duration::from_millis(delay.min(self.max_delay_ms as f64) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::new();
        assert_eq!(config.depth(), 15);
        assert!(config.hyperliquid_ws_url().starts_with("wss://"));
        assert!(config.lighter_ws_url().starts_with("wss://"));
    }

    #[test]
    fn test_builder() {
        let config = Config::new()
            .with_depth(20)
            .with_lighter_ws_url("ws://localhost:9001")
            .with_http_timeout(Duration::from_secs(3));
        assert_eq!(config.depth(), 20);
        assert_eq!(config.lighter_ws_url(), "ws://localhost:9001");
        assert_eq!(config.http_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_backoff_delays() {
        let rc = ReconnectConfig::new()
            .initial_delay_ms(100)
            .backoff_multiplier(2.0)
            .max_delay_ms(1_000);

        assert_eq!(rc.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(rc.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(rc.delay_for_attempt(3), Duration::from_millis(800));
        // capped at max_delay_ms
        assert_eq!(rc.delay_for_attempt(4), Duration::from_millis(1_000));
        assert_eq!(rc.delay_for_attempt(12), Duration::from_millis(1_000));
    }
}
