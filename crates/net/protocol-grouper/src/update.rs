//! Peer metadata updates consumed by the grouper.

use libp2p::{PeerId, identify};
use plexus_net_protocol_index::{NetPeerId, ProtocolId};

/// A peer together with its currently advertised protocol list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerUpdate<Id: NetPeerId = PeerId> {
    pub peer_id: Id,
    pub protocols: Vec<ProtocolId>,
}

impl<Id: NetPeerId> PeerUpdate<Id> {
    pub fn new<I, P>(peer_id: Id, protocols: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<ProtocolId>,
    {
        Self {
            peer_id,
            protocols: protocols.into_iter().map(Into::into).collect(),
        }
    }
}

impl PeerUpdate<PeerId> {
    /// Only `Received` carries the remote's protocol list; every other variant yields `None`.
    pub fn from_identify(event: &identify::Event) -> Option<Self> {
        match event {
            identify::Event::Received { peer_id, info, .. } => {
                Some(Self::new(*peer_id, &info.protocols))
            }
            _ => None,
        }
    }
}
