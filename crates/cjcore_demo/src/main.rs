//! # cjcore_demo
//!
//! A simulated server world and an overlay client exchanging storage
//! queries. The client never touches the world; everything it logs arrived
//! as a response message.
//!
//! ## Usage
//!
//! ```text
//! cjcore_demo [loopback|nats] [ticks]
//! ```
//!
//! `loopback` (the default) runs both sides in-process. `nats` connects each
//! side to NATS (`NATS_URL`, default `nats://localhost:4222`).

mod overlay;
mod session;
mod world;

use std::sync::Arc;

use anyhow::{Result, bail};
use cjcore_storage::UnitTable;
use cjcore_sync::SyncConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Ticks to run when none are given.
const DEFAULT_TICKS: u64 = 100;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("cjcore_demo=info".parse()?))
        .init();

    let config = SyncConfig::from_env()?;
    let units = Arc::new(UnitTable::standard());
    info!(units = units.len(), ?config, "cjcore demo starting");

    let mut args = std::env::args().skip(1);
    let mode = args.next().unwrap_or_else(|| "loopback".to_string());
    let ticks = match args.next() {
        Some(raw) => raw.parse()?,
        None => DEFAULT_TICKS,
    };

    match mode.as_str() {
        "loopback" => session::run_loopback(&config, units, ticks),
        "nats" => session::run_nats(&config, units, ticks).await?,
        other => bail!("unknown mode {other:?}, expected `loopback` or `nats`"),
    }

    info!("cjcore demo shut down");
    Ok(())
}
