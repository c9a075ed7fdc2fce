//! Channel naming and peer identity.
//!
//! A channel is the named, bidirectional pipe all storage queries travel
//! through. On NATS it maps onto one subject for the authoritative side and
//! one subject per client:
//!
//! - `cjcore.<channel>.server`
//! - `cjcore.<channel>.client.<peer>`

use std::fmt;

use uuid::Uuid;

/// Root prefix for all subjects.
pub const PREFIX: &str = "cjcore";

/// Default channel name.
pub const DEFAULT_CHANNEL: &str = "storage";

/// Header carrying the sender's [`PeerId`].
pub const PEER_ID_HEADER: &str = "peer-id";

/// Identity of a peer on a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(pub u64);

impl PeerId {
    /// The authoritative peer.
    pub const SERVER: PeerId = PeerId(0);

    /// A fresh random client id, never equal to [`PeerId::SERVER`].
    #[must_use]
    pub fn random() -> Self {
        let (high, _) = Uuid::new_v4().as_u64_pair();
        Self(high.max(1))
    }

    /// Whether this is the authoritative peer.
    #[must_use]
    pub const fn is_server(self) -> bool {
        self.0 == Self::SERVER.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_server() {
            write!(f, "server")
        } else {
            write!(f, "{:016x}", self.0)
        }
    }
}

/// Subject the authoritative peer listens on.
///
/// `cjcore.<channel>.server`
#[must_use]
pub fn server_subject(channel: &str) -> String {
    format!("{PREFIX}.{channel}.server")
}

/// Subject a client listens on.
///
/// `cjcore.<channel>.client.<peer>`
#[must_use]
pub fn client_subject(channel: &str, peer: PeerId) -> String {
    format!("{PREFIX}.{channel}.client.{}", peer.0)
}

/// Subject a frame addressed to `peer` is published on.
#[must_use]
pub fn subject_for(channel: &str, peer: PeerId) -> String {
    if peer.is_server() {
        server_subject(channel)
    } else {
        client_subject(channel, peer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_subject() {
        assert_eq!(server_subject("storage"), "cjcore.storage.server");
    }

    #[test]
    fn test_client_subject() {
        assert_eq!(
            client_subject("storage", PeerId(42)),
            "cjcore.storage.client.42"
        );
    }

    #[test]
    fn test_subject_for_routes_by_peer() {
        assert_eq!(subject_for("s", PeerId::SERVER), "cjcore.s.server");
        assert_eq!(subject_for("s", PeerId(7)), "cjcore.s.client.7");
    }

    #[test]
    fn test_random_peer_is_client() {
        let peer = PeerId::random();
        assert!(!peer.is_server());
        assert_eq!(PeerId::SERVER.to_string(), "server");
    }
}
