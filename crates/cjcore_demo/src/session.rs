//! Tick loops driving both execution contexts over a transport.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use cjcore_net::{
    Dispatcher, ExecutionContext, Loopback, NatsConnection, NetError, Outbound, PeerId, Role,
    run_transport,
};
use cjcore_storage::{MemoryHost, UnitTable};
use cjcore_sync::{
    ClientState, LocalStorage, RemoteStorage, SyncConfig, register_client, register_server,
};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::overlay::Overlay;
use crate::world;

/// Ticks per second when running against a real transport.
const TICK_RATE: f64 = 20.0;

/// Unit the overlay displays energy in.
const DISPLAY_UNIT: &str = "Energy Unit";

/// The two execution contexts and the overlay feeding the presentation one.
struct Contexts {
    simulation: ExecutionContext<LocalStorage<MemoryHost>>,
    presentation: ExecutionContext<ClientState>,
    overlay: Overlay,
    units: Arc<UnitTable>,
}

/// Both dispatchers with the outbound queues their transport drains.
struct Wiring {
    server: Dispatcher,
    server_out: UnboundedReceiver<Outbound>,
    client: Dispatcher,
    client_out: UnboundedReceiver<Outbound>,
}

fn setup(config: &SyncConfig, units: Arc<UnitTable>) -> (Contexts, Wiring) {
    let simulation = ExecutionContext::new(
        "simulation",
        LocalStorage::new(world::build(), Arc::clone(&units)),
    );
    let presentation = ExecutionContext::new("presentation", ClientState::new());

    let (mut server, server_out) = Dispatcher::new(config.channel.as_str());
    let (mut client, client_out) = Dispatcher::new(config.channel.as_str());
    register_server(&mut server, &simulation.handle());
    register_client(&mut client, &presentation.handle());

    let overlay = Overlay::new(
        RemoteStorage::new(client.outlet()),
        config.query_interval_ticks,
        DISPLAY_UNIT,
    );
    let contexts = Contexts {
        simulation,
        presentation,
        overlay,
        units,
    };
    let wiring = Wiring {
        server,
        server_out,
        client,
        client_out,
    };
    (contexts, wiring)
}

impl Contexts {
    /// Simulation work, then presentation work, for one tick.
    fn tick(&mut self, tick: u64) {
        world::simulate(self.simulation.state_mut(), tick);
        self.simulation.run_pending();
        if let Err(e) = self.overlay.tick(self.presentation.state_mut(), &self.units) {
            warn!(tick, error = %e, "overlay query failed");
        }
        self.presentation.run_pending();
    }
}

/// Run both sides in this process, joined by the loopback transport.
pub fn run_loopback(config: &SyncConfig, units: Arc<UnitTable>, ticks: u64) {
    let (mut contexts, wiring) = setup(config, units);
    let peer = PeerId::random();
    let mut link = Loopback::new(peer, wiring.client_out, wiring.server_out);
    info!(%peer, ticks, channel = config.channel.as_str(), "running over loopback");

    for tick in 0..ticks {
        contexts.tick(tick);
        link.pump(&wiring.client, &wiring.server);
    }
    info!(ticks, "loopback session complete");
}

/// Run both sides in this process, each with its own NATS connection.
///
/// # Errors
///
/// Returns an error if either side cannot connect to NATS.
pub async fn run_nats(config: &SyncConfig, units: Arc<UnitTable>, ticks: u64) -> Result<()> {
    let server_conn = connect(config).await.context("server connection")?;
    let client_conn = connect(config).await.context("client connection")?;

    let (mut contexts, wiring) = setup(config, units);
    let Wiring {
        server,
        server_out,
        client,
        client_out,
    } = wiring;
    let peer = PeerId::random();

    let server_task = tokio::spawn(async move {
        run_transport(server_conn, Role::Server, &server, server_out).await
    });
    let client_task = tokio::spawn(async move {
        run_transport(client_conn, Role::Client(peer), &client, client_out).await
    });
    info!(%peer, ticks, channel = config.channel.as_str(), "running over NATS");

    let mut interval = tokio::time::interval(Duration::from_secs_f64(1.0 / TICK_RATE));
    for tick in 0..ticks {
        interval.tick().await;
        contexts.tick(tick);
        if server_task.is_finished() || client_task.is_finished() {
            warn!(tick, "transport stopped early");
            break;
        }
    }

    stop(server_task, "server").await;
    stop(client_task, "client").await;
    info!(ticks, "NATS session complete");
    Ok(())
}

/// Abort a transport task if still running and log how it ended.
async fn stop(task: JoinHandle<Result<(), NetError>>, side: &str) {
    task.abort();
    match task.await {
        Ok(Ok(())) => info!(side, "transport finished"),
        Ok(Err(e)) => warn!(side, error = %e, "transport failed"),
        Err(e) if e.is_cancelled() => {}
        Err(e) => warn!(side, error = %e, "transport task panicked"),
    }
}

async fn connect(config: &SyncConfig) -> Result<NatsConnection, NetError> {
    match &config.nats_url {
        Some(url) => NatsConnection::connect_to(url).await,
        None => NatsConnection::connect().await,
    }
}
