//! Message dispatch for one channel.
//!
//! The [`Dispatcher`] owns the channel's routing table: for every
//! [`MessageKind`] it knows which execution context should handle it and
//! which function to call there. Incoming frames are decoded on the
//! transport's thread; only fully decoded messages are posted to their
//! context. Anything malformed or unknown is logged and dropped.
//!
//! Outgoing frames are queued as [`Outbound`] records on an unbounded
//! channel that the transport drains.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::channel::PeerId;
use crate::context::ContextHandle;
use crate::error::{HandlerError, NetError};
use crate::messages::{MessageKind, WireMessage, encode_frame, split_frame};

/// An encoded frame waiting to be sent to `peer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    /// Destination.
    pub peer: PeerId,
    /// Kind byte plus payload.
    pub frame: Bytes,
}

/// Cloneable sending half of a channel.
#[derive(Debug, Clone)]
pub struct Outlet {
    channel: Arc<str>,
    tx: mpsc::UnboundedSender<Outbound>,
}

impl Outlet {
    /// Encode `message` and queue it for `peer`.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Codec`] if encoding fails, or
    /// [`NetError::ChannelClosed`] if the transport is gone.
    pub fn send<M: WireMessage>(&self, message: &M, peer: PeerId) -> Result<(), NetError> {
        let frame = encode_frame(message)?;
        trace!(
            channel = %self.channel,
            kind = M::KIND.name(),
            %peer,
            len = frame.len(),
            "queueing frame"
        );
        self.tx
            .send(Outbound { peer, frame })
            .map_err(|_| NetError::ChannelClosed(self.channel.to_string()))
    }

    /// Name of the channel this outlet feeds.
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }
}

/// A decoded message delivered to a handler.
#[derive(Debug)]
pub struct Incoming<M> {
    /// Sender of the message.
    pub from: PeerId,
    /// The message.
    pub message: M,
    /// Where replies go.
    pub reply: Outlet,
}

impl<M> Incoming<M> {
    /// Send `response` back to the sender.
    ///
    /// # Errors
    ///
    /// See [`Outlet::send`].
    pub fn respond<R: WireMessage>(&self, response: &R) -> Result<(), NetError> {
        self.reply.send(response, self.from)
    }
}

type Route = Box<dyn Fn(PeerId, &[u8]) -> Result<(), NetError> + Send + Sync>;

/// Routing table for one channel.
pub struct Dispatcher {
    channel: Arc<str>,
    routes: HashMap<MessageKind, Route>,
    outlet: Outlet,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("channel", &self.channel)
            .field("routes", &self.routes.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Create a dispatcher for `channel` along with the receiver its
    /// transport drains outgoing frames from.
    #[must_use]
    pub fn new(channel: impl Into<Arc<str>>) -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let channel = channel.into();
        let (tx, rx) = mpsc::unbounded_channel();
        let dispatcher = Self {
            outlet: Outlet {
                channel: Arc::clone(&channel),
                tx,
            },
            channel,
            routes: HashMap::new(),
        };
        (dispatcher, rx)
    }

    /// The channel name.
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// A cloneable sender for this channel.
    #[must_use]
    pub fn outlet(&self) -> Outlet {
        self.outlet.clone()
    }

    /// Route messages of type `M` to `handler`, run on the context behind
    /// `context`. Registering a kind twice replaces the earlier handler.
    pub fn register<M, S, F>(&mut self, context: &ContextHandle<S>, handler: F)
    where
        M: WireMessage,
        S: 'static,
        F: Fn(&mut S, Incoming<M>) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        let handler = Arc::new(handler);
        let context = context.clone();
        let reply = self.outlet.clone();
        let route: Route = Box::new(move |from: PeerId, payload: &[u8]| {
            let message = M::decode(payload)?;
            let handler = Arc::clone(&handler);
            let reply = reply.clone();
            context.run_on(move |state| {
                handler(
                    state,
                    Incoming {
                        from,
                        message,
                        reply,
                    },
                )
            })
        });
        if self.routes.insert(M::KIND, route).is_some() {
            warn!(channel = %self.channel, kind = M::KIND.name(), "handler replaced");
        } else {
            debug!(channel = %self.channel, kind = M::KIND.name(), "handler registered");
        }
    }

    /// Whether a handler is registered for `kind`.
    #[must_use]
    pub fn handles(&self, kind: MessageKind) -> bool {
        self.routes.contains_key(&kind)
    }

    /// Encode `message` and queue it for `peer`.
    ///
    /// # Errors
    ///
    /// See [`Outlet::send`].
    pub fn send<M: WireMessage>(&self, message: &M, peer: PeerId) -> Result<(), NetError> {
        self.outlet.send(message, peer)
    }

    /// Decode `frame` from `from` and post it to its handler's context.
    ///
    /// Returns whether the message was accepted. Empty, unknown, malformed,
    /// and unrouted frames are logged and dropped.
    pub fn on_receive(&self, from: PeerId, frame: &[u8]) -> bool {
        let (id, payload) = match split_frame(frame) {
            Ok(split) => split,
            Err(e) => {
                warn!(channel = %self.channel, %from, error = %e, "dropping frame");
                return false;
            }
        };
        let Some(kind) = MessageKind::from_id(id) else {
            warn!(channel = %self.channel, %from, id, "dropping frame of unknown kind");
            return false;
        };
        let Some(route) = self.routes.get(&kind) else {
            debug!(channel = %self.channel, %from, kind = kind.name(), "no handler, dropping");
            return false;
        };
        match route(from, payload) {
            Ok(()) => {
                trace!(channel = %self.channel, %from, kind = kind.name(), "dispatched");
                true
            }
            Err(e) => {
                warn!(
                    channel = %self.channel,
                    %from,
                    kind = kind.name(),
                    error = %e,
                    "dropping message"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use cjcore_storage::{BlockPos, RemoteTarget, Side};

    use super::*;
    use crate::context::ExecutionContext;
    use crate::messages::{Delivery, GetEnergy, ReturnEnergy};

    fn request() -> GetEnergy {
        GetEnergy {
            unit: "Forge Energy".to_string(),
            target: RemoteTarget::block(BlockPos::new(0, 64, 0), Some(Side::Up)),
            delivery: Delivery::cache("cjcore", "Test"),
        }
    }

    fn echo_server() -> (
        Dispatcher,
        mpsc::UnboundedReceiver<Outbound>,
        ExecutionContext<Vec<String>>,
    ) {
        let (mut dispatcher, rx) = Dispatcher::new("test");
        let ctx = ExecutionContext::new("server", Vec::new());
        dispatcher.register(&ctx.handle(), |seen: &mut Vec<String>, msg: Incoming<GetEnergy>| {
            seen.push(msg.message.unit.clone());
            msg.respond(&ReturnEnergy {
                amount: 7,
                delivery: msg.message.delivery.clone(),
            })?;
            Ok(())
        });
        (dispatcher, rx, ctx)
    }

    #[test]
    fn test_message_runs_on_context_and_replies_to_sender() {
        let (dispatcher, mut rx, mut ctx) = echo_server();
        let frame = encode_frame(&request()).unwrap();
        assert!(dispatcher.on_receive(PeerId(9), &frame));

        assert!(ctx.state().is_empty());
        assert!(rx.try_recv().is_err(), "no reply before the context runs");

        assert_eq!(ctx.run_pending(), 1);
        assert_eq!(ctx.state(), &vec!["Forge Energy".to_string()]);

        let out = rx.try_recv().unwrap();
        assert_eq!(out.peer, PeerId(9));
        let (kind, payload) = split_frame(&out.frame).unwrap();
        assert_eq!(kind, MessageKind::ReturnEnergy.id());
        let reply = ReturnEnergy::decode(payload).unwrap();
        assert_eq!(reply.amount, 7);
        assert_eq!(reply.delivery, Delivery::cache("cjcore", "Test"));
    }

    #[test]
    fn test_malformed_frame_never_reaches_context() {
        let (dispatcher, _rx, mut ctx) = echo_server();
        let frame = encode_frame(&request()).unwrap();
        assert!(!dispatcher.on_receive(PeerId(1), &frame[..frame.len() - 1]));
        assert!(!dispatcher.on_receive(PeerId(1), &[]));
        assert!(!dispatcher.on_receive(PeerId(1), &[200, 1, 2]));
        assert_eq!(ctx.run_pending(), 0);
    }

    #[test]
    fn test_unrouted_kind_dropped() {
        let (dispatcher, _rx, mut ctx) = echo_server();
        let frame = encode_frame(&ReturnEnergy {
            amount: 1,
            delivery: Delivery::cache("a", "b"),
        })
        .unwrap();
        assert!(!dispatcher.handles(MessageKind::ReturnEnergy));
        assert!(!dispatcher.on_receive(PeerId::SERVER, &frame));
        assert_eq!(ctx.run_pending(), 0);
    }

    #[test]
    fn test_dropped_context_rejects_message() {
        let (dispatcher, _rx, ctx) = echo_server();
        drop(ctx);
        let frame = encode_frame(&request()).unwrap();
        assert!(!dispatcher.on_receive(PeerId(1), &frame));
    }

    #[test]
    fn test_send_after_transport_gone() {
        let (dispatcher, rx) = Dispatcher::new("closed");
        drop(rx);
        let err = dispatcher.send(&request(), PeerId::SERVER).unwrap_err();
        assert!(matches!(err, NetError::ChannelClosed(name) if name == "closed"));
    }
}
