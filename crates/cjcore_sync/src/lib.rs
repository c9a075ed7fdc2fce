//! # cjcore_sync
//!
//! Everything above the wire: where answers land and how callers ask.
//!
//! - [`config`]: [`SyncConfig`], built in code or from the environment.
//! - [`sink`]: [`ResultSink`], the consume-once cache and write-back bindings.
//! - [`local`]: [`LocalStorage`], the synchronous path for callers that own
//!   the host. It is also the state the server context runs against.
//! - [`remote`]: [`RemoteStorage`], the fire-and-forget client path.
//! - [`server`] / [`client`]: handler registration for each side.
//! - [`pacer`]: [`QueryPacer`], the re-query cadence for displayed targets.

pub mod client;
pub mod config;
pub mod error;
pub mod local;
pub mod pacer;
pub mod remote;
pub mod server;
pub mod sink;

pub use client::{ClientState, register_client};
pub use config::SyncConfig;
pub use error::ConfigError;
pub use local::LocalStorage;
pub use pacer::QueryPacer;
pub use remote::RemoteStorage;
pub use server::register_server;
pub use sink::ResultSink;
