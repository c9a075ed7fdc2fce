//! Configuration errors.

/// Errors raised while building a [`SyncConfig`](crate::SyncConfig).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable held a value that does not parse.
    #[error("invalid value {value:?} for {var}")]
    InvalidValue {
        /// Variable name.
        var: &'static str,
        /// The raw value.
        value: String,
    },

    /// The query interval must be at least one tick.
    #[error("query interval must be at least one tick")]
    ZeroInterval,

    /// Channel names become NATS subject tokens and may not be empty or
    /// contain separators or wildcards.
    #[error("invalid channel name {0:?}")]
    InvalidChannel(String),
}
