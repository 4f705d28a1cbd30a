//! Bidirectional peer ↔ protocol index.

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::events::{ProtocolEvent, ProtocolEventEmitter};
use crate::metrics::ProtocolIndexMetrics;
use crate::protocol::ProtocolId;
use crate::traits::NetPeerId;

/// Both directions of the association set. Only ever mutated as a pair.
#[derive(Debug, Clone)]
struct Associations<Id: NetPeerId> {
    peers_by_protocol: HashMap<ProtocolId, HashSet<Id>>,
    protocols_by_peer: HashMap<Id, HashSet<ProtocolId>>,
}

impl<Id: NetPeerId> Default for Associations<Id> {
    fn default() -> Self {
        Self {
            peers_by_protocol: HashMap::new(),
            protocols_by_peer: HashMap::new(),
        }
    }
}

impl<Id: NetPeerId> Associations<Id> {
    /// Returns true if the pair was not recorded before.
    fn insert(&mut self, peer: &Id, protocol: &ProtocolId) -> bool {
        self.protocols_by_peer
            .entry(peer.clone())
            .or_default()
            .insert(protocol.clone());

        self.peers_by_protocol
            .entry(protocol.clone())
            .or_default()
            .insert(peer.clone())
    }

    fn peers_with_protocol(&self, protocol: &str) -> Vec<Id> {
        self.peers_by_protocol
            .get(protocol)
            .map(|peers| peers.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn protocols_of_peer(&self, peer: &Id) -> Vec<ProtocolId> {
        self.protocols_by_peer
            .get(peer)
            .map(|protocols| protocols.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn peer_count_for(&self, protocol: &str) -> usize {
        self.peers_by_protocol.get(protocol).map_or(0, HashSet::len)
    }

    fn contains(&self, peer: &Id, protocol: &str) -> bool {
        self.protocols_by_peer
            .get(peer)
            .is_some_and(|protocols| protocols.contains(protocol))
    }

    fn association_count(&self) -> usize {
        self.protocols_by_peer.values().map(HashSet::len).sum()
    }
}

/// Tracks which protocols each peer advertises and which peers advertise each protocol.
///
/// Both maps sit behind a single `RwLock`, so readers never observe one direction updated
/// without the other. Associations are only ever added: an update carrying a shorter protocol
/// list than before leaves earlier entries in place.
#[derive(Debug)]
pub struct PeerProtocolIndex<Id: NetPeerId> {
    inner: RwLock<Associations<Id>>,
    events: ProtocolEventEmitter<Id>,
    metrics: ProtocolIndexMetrics,
}

impl<Id: NetPeerId> Default for PeerProtocolIndex<Id> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Id: NetPeerId> PeerProtocolIndex<Id> {
    pub fn new() -> Self {
        Self::with_emitter(ProtocolEventEmitter::default())
    }

    /// Create an index that publishes on an existing emitter.
    pub fn with_emitter(events: ProtocolEventEmitter<Id>) -> Self {
        Self {
            inner: RwLock::new(Associations::default()),
            events,
            metrics: ProtocolIndexMetrics::default(),
        }
    }

    /// Record that `peer` advertises every protocol in `protocols`.
    ///
    /// Protocols are processed in input order. Each pair seen for the first time emits one
    /// [`ProtocolEvent::Added`] before this returns. Returns the number of new pairs.
    pub fn update<I, P>(&self, peer: Id, protocols: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: Into<ProtocolId>,
    {
        let mut protocols = protocols.into_iter().peekable();
        if protocols.peek().is_none() {
            trace!(?peer, "Empty protocol list, nothing to record");
            return 0;
        }

        let mut added = Vec::new();
        {
            let mut inner = self.inner.write();
            for protocol in protocols {
                let protocol = protocol.into();
                if inner.insert(&peer, &protocol) {
                    added.push(protocol);
                }
            }
            // Gauges are set while the write lock is held so the last writer wins.
            self.metrics.record_update(
                added.len(),
                inner.protocols_by_peer.len(),
                inner.peers_by_protocol.len(),
            );
        }

        let count = added.len();
        for protocol in added {
            let delivered = self.events.protocol_added(peer.clone(), protocol.clone());
            debug!(?peer, %protocol, delivered, "Peer protocol added");
        }
        count
    }

    /// Peers advertising `protocol`, in no particular order. Empty if the protocol is unknown.
    pub fn peers_with_protocol(&self, protocol: &str) -> Vec<Id> {
        self.inner.read().peers_with_protocol(protocol)
    }

    /// Protocols advertised by `peer`, in no particular order. Empty if the peer is unknown.
    pub fn protocols_of_peer(&self, peer: &Id) -> Vec<ProtocolId> {
        self.inner.read().protocols_of_peer(peer)
    }

    /// Number of peers advertising `protocol`, without copying them out.
    pub fn peer_count_for(&self, protocol: &str) -> usize {
        self.inner.read().peer_count_for(protocol)
    }

    pub fn contains(&self, peer: &Id, protocol: &str) -> bool {
        self.inner.read().contains(peer, protocol)
    }

    pub fn peer_count(&self) -> usize {
        self.inner.read().protocols_by_peer.len()
    }

    pub fn protocol_count(&self) -> usize {
        self.inner.read().peers_by_protocol.len()
    }

    /// Number of distinct (peer, protocol) pairs.
    pub fn association_count(&self) -> usize {
        self.inner.read().association_count()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().protocols_by_peer.is_empty()
    }

    pub fn peers(&self) -> Vec<Id> {
        self.inner.read().protocols_by_peer.keys().cloned().collect()
    }

    pub fn protocols(&self) -> Vec<ProtocolId> {
        self.inner.read().peers_by_protocol.keys().cloned().collect()
    }

    /// Consistent copy of both directions, queryable without holding the lock.
    pub fn snapshot(&self) -> IndexSnapshot<Id> {
        IndexSnapshot {
            inner: self.inner.read().clone(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProtocolEvent<Id>> {
        self.events.subscribe()
    }

    pub fn events(&self) -> &ProtocolEventEmitter<Id> {
        &self.events
    }
}

/// Point-in-time copy of a [`PeerProtocolIndex`].
#[derive(Debug, Clone)]
pub struct IndexSnapshot<Id: NetPeerId> {
    inner: Associations<Id>,
}

impl<Id: NetPeerId> IndexSnapshot<Id> {
    pub fn peers_with_protocol(&self, protocol: &str) -> Vec<Id> {
        self.inner.peers_with_protocol(protocol)
    }

    pub fn protocols_of_peer(&self, peer: &Id) -> Vec<ProtocolId> {
        self.inner.protocols_of_peer(peer)
    }

    pub fn peer_count_for(&self, protocol: &str) -> usize {
        self.inner.peer_count_for(protocol)
    }

    pub fn contains(&self, peer: &Id, protocol: &str) -> bool {
        self.inner.contains(peer, protocol)
    }

    pub fn peer_count(&self) -> usize {
        self.inner.protocols_by_peer.len()
    }

    pub fn protocol_count(&self) -> usize {
        self.inner.peers_by_protocol.len()
    }

    pub fn association_count(&self) -> usize {
        self.inner.association_count()
    }

    /// Every (peer, protocol) pair in the snapshot.
    pub fn associations(&self) -> impl Iterator<Item = (&Id, &ProtocolId)> + '_ {
        self.inner
            .protocols_by_peer
            .iter()
            .flat_map(|(peer, protocols)| protocols.iter().map(move |p| (peer, p)))
    }
}
