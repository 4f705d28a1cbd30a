//! Protocol index events and non-blocking broadcast emitter.

use tokio::sync::broadcast;

use crate::protocol::ProtocolId;
use crate::traits::NetPeerId;

/// Protocol index events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolEvent<Id: NetPeerId> {
    /// First time `peer` was recorded as advertising `protocol`.
    Added { peer: Id, protocol: ProtocolId },
}

impl<Id: NetPeerId> ProtocolEvent<Id> {
    pub fn peer(&self) -> &Id {
        match self {
            Self::Added { peer, .. } => peer,
        }
    }

    pub fn protocol(&self) -> &ProtocolId {
        match self {
            Self::Added { protocol, .. } => protocol,
        }
    }
}

/// Backlog kept per subscriber before the oldest events are overwritten.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Publishes [`ProtocolEvent`]s to any number of subscribers without ever blocking the
/// publisher. A subscriber that falls more than the channel capacity behind loses the oldest
/// events and sees `RecvError::Lagged` on its next receive.
#[derive(Debug, Clone)]
pub struct ProtocolEventEmitter<Id: NetPeerId> {
    sender: broadcast::Sender<ProtocolEvent<Id>>,
}

impl<Id: NetPeerId> Default for ProtocolEventEmitter<Id> {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl<Id: NetPeerId> ProtocolEventEmitter<Id> {
    /// Panics if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sender: broadcast::channel(capacity).0,
        }
    }

    /// Publish `event`. Returns how many subscribers it was queued for.
    pub fn emit(&self, event: ProtocolEvent<Id>) -> usize {
        // An error only means nobody is subscribed right now.
        self.sender.send(event).unwrap_or(0)
    }

    pub fn protocol_added(&self, peer: Id, protocol: ProtocolId) -> usize {
        self.emit(ProtocolEvent::Added { peer, protocol })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProtocolEvent<Id>> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
