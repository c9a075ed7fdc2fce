//! NATS connection management and the networked transport loop.
//!
//! Provides a thin wrapper around `async-nats` for connecting with cjcore
//! defaults, plus [`run_transport`], which bridges a [`Dispatcher`] onto the
//! subjects of its channel.

use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::channel::{PEER_ID_HEADER, PeerId, client_subject, server_subject, subject_for};
use crate::dispatcher::{Dispatcher, Outbound};
use crate::error::NetError;

/// Default NATS server URL.
pub const DEFAULT_NATS_URL: &str = "nats://localhost:4222";

/// The environment variable used to override the NATS URL.
pub const NATS_URL_ENV: &str = "NATS_URL";

/// A wrapper around an `async-nats` client.
#[derive(Debug, Clone)]
pub struct NatsConnection {
    client: async_nats::Client,
}

impl NatsConnection {
    /// Connect using the URL from `NATS_URL`, falling back to
    /// [`DEFAULT_NATS_URL`].
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Connect`] if the connection cannot be established.
    pub async fn connect() -> Result<Self, NetError> {
        let url = std::env::var(NATS_URL_ENV).unwrap_or_else(|_| DEFAULT_NATS_URL.to_string());
        Self::connect_to(&url).await
    }

    /// Connect to NATS at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Connect`] if the connection cannot be established.
    pub async fn connect_to(url: &str) -> Result<Self, NetError> {
        info!(url, "connecting to NATS");
        let client = async_nats::connect(url).await?;
        info!("NATS connection established");
        Ok(Self { client })
    }

    /// The underlying `async-nats` client.
    #[must_use]
    pub fn client(&self) -> &async_nats::Client {
        &self.client
    }

    /// Publish an already encoded frame, stamped with the sender's id.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Publish`] if publishing fails.
    pub async fn publish_frame(
        &self,
        subject: &str,
        sender: PeerId,
        frame: bytes::Bytes,
    ) -> Result<(), NetError> {
        let mut headers = async_nats::HeaderMap::new();
        headers.insert(PEER_ID_HEADER, sender.0.to_string().as_str());
        self.client
            .publish_with_headers(subject.to_string(), headers, frame)
            .await?;
        Ok(())
    }

    /// Subscribe to a subject.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Subscribe`] if the subscription fails.
    pub async fn subscribe(&self, subject: &str) -> Result<async_nats::Subscriber, NetError> {
        let sub = self.client.subscribe(subject.to_string()).await?;
        Ok(sub)
    }
}

/// Something outgoing frames can be published through.
pub trait FramePublisher {
    /// Publish `frame` to `subject`, stamped with `sender`.
    fn publish_frame(
        &self,
        subject: &str,
        sender: PeerId,
        frame: bytes::Bytes,
    ) -> impl Future<Output = Result<(), NetError>> + Send;
}

impl FramePublisher for NatsConnection {
    async fn publish_frame(
        &self,
        subject: &str,
        sender: PeerId,
        frame: bytes::Bytes,
    ) -> Result<(), NetError> {
        NatsConnection::publish_frame(self, subject, sender, frame).await
    }
}

/// Which end of a channel a transport serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The authoritative side, listening on the server subject.
    Server,
    /// A client with the given id, listening on its own subject.
    Client(PeerId),
}

impl Role {
    /// The id this side stamps on outgoing frames.
    #[must_use]
    pub const fn peer(self) -> PeerId {
        match self {
            Self::Server => PeerId::SERVER,
            Self::Client(peer) => peer,
        }
    }

    /// The subject this side listens on.
    #[must_use]
    pub fn listen_subject(self, channel: &str) -> String {
        match self {
            Self::Server => server_subject(channel),
            Self::Client(peer) => client_subject(channel, peer),
        }
    }
}

/// Parse the value of a [`PEER_ID_HEADER`].
///
/// # Errors
///
/// Returns [`NetError::MissingHeader`] if the value is not a peer id.
pub fn parse_peer(value: &str) -> Result<PeerId, NetError> {
    value
        .parse::<u64>()
        .map(PeerId)
        .map_err(|_| NetError::MissingHeader(format!("{PEER_ID_HEADER}: {value:?}")))
}

/// Publish one queued frame to its destination's subject.
///
/// A failed publish drops that frame only; returns whether it went out.
pub async fn forward<P: FramePublisher + ?Sized>(
    publisher: &P,
    channel: &str,
    sender: PeerId,
    out: Outbound,
) -> bool {
    let subject = subject_for(channel, out.peer);
    match publisher.publish_frame(&subject, sender, out.frame).await {
        Ok(()) => true,
        Err(e) => {
            warn!(subject, peer = %out.peer, error = %e, "dropping frame that failed to publish");
            false
        }
    }
}

fn sender_of(message: &async_nats::Message) -> Result<PeerId, NetError> {
    let value = message
        .headers
        .as_ref()
        .and_then(|h| h.get(PEER_ID_HEADER))
        .ok_or_else(|| NetError::MissingHeader(PEER_ID_HEADER.to_string()))?;
    parse_peer(value.as_str())
}

/// Bridge `dispatcher` onto NATS until the subscription ends.
///
/// Incoming frames on the role's subject are handed to
/// [`Dispatcher::on_receive`]; frames queued on `outbound` are published to
/// their destination's subject.
///
/// # Errors
///
/// Returns [`NetError`] if subscribing fails. Publish failures are logged
/// per frame and do not end the loop.
pub async fn run_transport(
    conn: NatsConnection,
    role: Role,
    dispatcher: &Dispatcher,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
) -> Result<(), NetError> {
    let channel = dispatcher.channel().to_string();
    let me = role.peer();
    let subject = role.listen_subject(&channel);
    let mut sub = conn.subscribe(&subject).await?;
    info!(subject, peer = %me, "transport listening");

    loop {
        tokio::select! {
            incoming = sub.next() => {
                let Some(message) = incoming else {
                    info!(subject, "subscription closed");
                    break;
                };
                match sender_of(&message) {
                    Ok(from) => {
                        dispatcher.on_receive(from, &message.payload);
                    }
                    Err(e) => warn!(subject, error = %e, "dropping frame without sender"),
                }
            }
            out = outbound.recv() => {
                let Some(out) = out else {
                    debug!(channel, "outbound queue closed");
                    break;
                };
                forward(&conn, &channel, me, out).await;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use bytes::Bytes;

    use super::*;
    use crate::error::CodecError;

    /// Records published subjects and refuses frames for one peer.
    #[derive(Default)]
    struct Recorder {
        refuse: Option<PeerId>,
        sent: Mutex<Vec<(String, PeerId, Bytes)>>,
    }

    impl FramePublisher for Recorder {
        async fn publish_frame(
            &self,
            subject: &str,
            sender: PeerId,
            frame: Bytes,
        ) -> Result<(), NetError> {
            if self.refuse.is_some_and(|p| subject == subject_for("storage", p)) {
                return Err(NetError::Codec(CodecError::EmptyFrame));
            }
            self.sent
                .lock()
                .unwrap()
                .push((subject.to_string(), sender, frame));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_publish_failure_drops_only_that_frame() {
        let recorder = Recorder {
            refuse: Some(PeerId(7)),
            ..Recorder::default()
        };
        let frames = [
            Outbound { peer: PeerId(5), frame: Bytes::from_static(&[1]) },
            Outbound { peer: PeerId(7), frame: Bytes::from_static(&[2]) },
            Outbound { peer: PeerId(5), frame: Bytes::from_static(&[3]) },
        ];

        let mut outcomes = Vec::new();
        for out in frames {
            outcomes.push(forward(&recorder, "storage", PeerId::SERVER, out).await);
        }

        assert_eq!(outcomes, [true, false, true]);
        let sent = recorder.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|(subject, _, _)| subject == "cjcore.storage.client.5"));
        assert_eq!(sent[1].2, Bytes::from_static(&[3]));
    }

    #[test]
    fn test_role_subjects() {
        assert_eq!(Role::Server.listen_subject("storage"), "cjcore.storage.server");
        assert_eq!(
            Role::Client(PeerId(3)).listen_subject("storage"),
            "cjcore.storage.client.3"
        );
        assert_eq!(Role::Client(PeerId(3)).peer(), PeerId(3));
        assert!(Role::Server.peer().is_server());
    }

    #[test]
    fn test_parse_peer() {
        assert_eq!(parse_peer("42").unwrap(), PeerId(42));
        assert!(matches!(parse_peer("x"), Err(NetError::MissingHeader(_))));
        assert!(parse_peer("").is_err());
    }
}
