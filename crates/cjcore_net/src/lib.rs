//! # cjcore_net
//!
//! Wire protocol and message plumbing for remote storage queries.
//!
//! This crate provides:
//!
//! - [`codec`]: the positional big-endian field codec.
//! - [`messages`]: the eight request/response messages and their framing.
//! - [`channel`]: channel subjects and [`PeerId`].
//! - [`context`]: single-owner execution contexts that run handlers.
//! - [`dispatcher`]: decodes frames and posts them to their context.
//! - [`loopback`] / [`connection`]: in-process and NATS transports.
//! - [`error`]: network-layer error types.

pub mod channel;
pub mod codec;
pub mod connection;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod loopback;
pub mod messages;

pub use channel::{DEFAULT_CHANNEL, PeerId};
pub use connection::{FramePublisher, NatsConnection, Role, forward, run_transport};
pub use context::{ContextHandle, ExecutionContext};
pub use dispatcher::{Dispatcher, Incoming, Outbound, Outlet};
pub use error::{CodecError, HandlerError, NetError};
pub use loopback::Loopback;
pub use messages::{
    BindingId, CacheKey, Delivery, GetEnergy, GetEnergyData, GetFluidData, GetInventory,
    MessageKind, ReturnEnergy, ReturnEnergyData, ReturnFluidData, ReturnInventory, WireMessage,
};
