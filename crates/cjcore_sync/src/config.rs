//! Synchronisation configuration.

use cjcore_net::DEFAULT_CHANNEL;
use tracing::debug;

use crate::error::ConfigError;

/// Environment variable overriding the channel name.
pub const CHANNEL_ENV: &str = "CJCORE_CHANNEL";

/// Environment variable overriding the re-query interval.
pub const QUERY_INTERVAL_ENV: &str = "CJCORE_QUERY_INTERVAL";

/// Environment variable overriding the NATS URL.
pub const NATS_URL_ENV: &str = cjcore_net::connection::NATS_URL_ENV;

/// Ticks between two queries for the same displayed target.
pub const DEFAULT_QUERY_INTERVAL: u32 = 20;

/// Configuration shared by both sides of a storage channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Channel name; both peers must agree on it.
    pub channel: String,
    /// How often a client re-queries a target it is displaying.
    pub query_interval_ticks: u32,
    /// Optional NATS URL (defaults to `NATS_URL` env or localhost).
    pub nats_url: Option<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            channel: DEFAULT_CHANNEL.to_string(),
            query_interval_ticks: DEFAULT_QUERY_INTERVAL,
            nats_url: None,
        }
    }
}

impl SyncConfig {
    /// Default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different channel name.
    #[must_use]
    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }

    /// Use a different query interval.
    #[must_use]
    pub fn with_query_interval(mut self, ticks: u32) -> Self {
        self.query_interval_ticks = ticks;
        self
    }

    /// Override the NATS URL.
    #[must_use]
    pub fn with_nats_url(mut self, url: impl Into<String>) -> Self {
        self.nats_url = Some(url.into());
        self
    }

    /// Check the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a zero interval or an unusable channel name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.query_interval_ticks == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if self.channel.is_empty()
            || self
                .channel
                .contains(|c: char| c == '.' || c == '*' || c == '>' || c.is_whitespace())
        {
            return Err(ConfigError::InvalidChannel(self.channel.clone()));
        }
        Ok(())
    }

    /// Defaults overridden by `CJCORE_CHANNEL`, `CJCORE_QUERY_INTERVAL` and
    /// `NATS_URL`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable does not parse or the result
    /// fails [`SyncConfig::validate`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(channel) = lookup(CHANNEL_ENV) {
            config.channel = channel;
        }
        if let Some(raw) = lookup(QUERY_INTERVAL_ENV) {
            config.query_interval_ticks =
                raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    var: QUERY_INTERVAL_ENV,
                    value: raw.clone(),
                })?;
        }
        config.nats_url = lookup(NATS_URL_ENV);
        config.validate()?;
        debug!(?config, "loaded sync configuration");
        Ok(config)
    }
}
