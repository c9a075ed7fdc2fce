//! Network-layer error types.

use cjcore_storage::StorageError;

/// Errors produced while encoding or decoding a wire message.
///
/// A decode error means the message never came into existence; the
/// dispatcher logs and drops it.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The buffer ended before `field` could be read.
    #[error("truncated buffer reading {field}: needed {needed} bytes, {remaining} left")]
    Truncated {
        /// What was being read.
        field: &'static str,
        /// Bytes required.
        needed: usize,
        /// Bytes available.
        remaining: usize,
    },

    /// A discriminator byte held a value outside its set.
    #[error("invalid {field} tag: {value}")]
    InvalidTag {
        /// Which discriminator.
        field: &'static str,
        /// The value found.
        value: u8,
    },

    /// A string was not valid UTF-8.
    #[error("invalid UTF-8 in string field")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// A string is too long for its `u16` length prefix.
    #[error("string of {0} bytes exceeds the wire limit")]
    StringTooLong(usize),

    /// A count or blob length does not fit its prefix.
    #[error("length {0} exceeds the wire limit")]
    LengthOverflow(usize),

    /// A repeated-field count was negative.
    #[error("negative {field} count: {count}")]
    NegativeCount {
        /// Which count.
        field: &'static str,
        /// The value found.
        count: i32,
    },

    /// Bytes were left over after a complete message.
    #[error("{0} trailing bytes after message")]
    TrailingBytes(usize),

    /// Failed to encode an item tag to MessagePack.
    #[error("failed to encode item tag: {0}")]
    TagEncode(#[from] rmp_serde::encode::Error),

    /// Failed to decode an item tag from MessagePack.
    #[error("failed to decode item tag: {0}")]
    TagDecode(#[from] rmp_serde::decode::Error),

    /// A frame was empty, so it carried no message kind.
    #[error("empty frame")]
    EmptyFrame,
}

/// Errors that can occur during network operations.
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    /// Encoding or decoding failed.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The execution context behind a handle has been dropped.
    #[error("execution context {0} is closed")]
    ContextClosed(String),

    /// The outbound queue of a channel has no receiver anymore.
    #[error("channel {0} is closed")]
    ChannelClosed(String),

    /// NATS subscription error.
    #[error("NATS subscribe error: {0}")]
    Subscribe(#[from] async_nats::SubscribeError),

    /// NATS publish error.
    #[error("NATS publish error: {0}")]
    Publish(#[from] async_nats::PublishError),

    /// NATS connection error.
    #[error("NATS connection error: {0}")]
    Connect(#[from] async_nats::ConnectError),

    /// A required NATS header was missing or malformed.
    #[error("missing NATS header: {0}")]
    MissingHeader(String),
}

/// Errors returned by message handlers. They are logged by the execution
/// context and never reach the transport.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// Resolving the target failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Replying failed.
    #[error(transparent)]
    Net(#[from] NetError),

    /// The result could not be delivered to its destination.
    #[error("delivery failed: {0}")]
    Delivery(String),
}
