//! In-process transport joining one client to the authoritative side.
//!
//! Used for single-player hosts, where both sides live in the same process,
//! and in tests. Frames still go through the full encode/decode path.

use tokio::sync::mpsc;
use tracing::{trace, warn};

use crate::channel::PeerId;
use crate::dispatcher::{Dispatcher, Outbound};

/// Moves frames between a client dispatcher and a server dispatcher.
#[derive(Debug)]
pub struct Loopback {
    client_peer: PeerId,
    client_out: mpsc::UnboundedReceiver<Outbound>,
    server_out: mpsc::UnboundedReceiver<Outbound>,
}

impl Loopback {
    /// Join the outbound queues of a client (known to the server as
    /// `client_peer`) and a server.
    #[must_use]
    pub fn new(
        client_peer: PeerId,
        client_out: mpsc::UnboundedReceiver<Outbound>,
        server_out: mpsc::UnboundedReceiver<Outbound>,
    ) -> Self {
        Self {
            client_peer,
            client_out,
            server_out,
        }
    }

    /// The peer id the client appears as.
    #[must_use]
    pub fn client_peer(&self) -> PeerId {
        self.client_peer
    }

    /// Deliver every queued frame in both directions. Returns how many
    /// frames were accepted by the receiving dispatcher.
    ///
    /// Handlers only run when their execution context is drained, so a
    /// full round trip takes a pump, a server drain, a second pump and a
    /// client drain.
    pub fn pump(&mut self, client: &Dispatcher, server: &Dispatcher) -> usize {
        let mut delivered = 0;
        while let Ok(out) = self.client_out.try_recv() {
            if !out.peer.is_server() {
                warn!(peer = %out.peer, "client frame not addressed to server, dropping");
                continue;
            }
            delivered += usize::from(server.on_receive(self.client_peer, &out.frame));
        }
        while let Ok(out) = self.server_out.try_recv() {
            if out.peer != self.client_peer {
                warn!(peer = %out.peer, "no such loopback peer, dropping");
                continue;
            }
            delivered += usize::from(client.on_receive(PeerId::SERVER, &out.frame));
        }
        if delivered > 0 {
            trace!(delivered, "loopback pumped");
        }
        delivered
    }
}
