//! Re-emits protocol index events as log lines.

use std::sync::Arc;

use libp2p::PeerId;
use plexus_net_protocol_index::{PeerProtocolIndex, ProtocolEvent};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{info, warn};

/// Log every newly seen (peer, protocol) pair until the event channel closes.
pub(crate) async fn report_protocols(
    index: Arc<PeerProtocolIndex<PeerId>>,
    mut events: broadcast::Receiver<ProtocolEvent<PeerId>>,
) {
    loop {
        match events.recv().await {
            Ok(ProtocolEvent::Added { peer, protocol }) => {
                info!(
                    %peer,
                    %protocol,
                    peers_with_protocol = index.peer_count_for(protocol.as_str()),
                    "Peer advertises new protocol"
                );
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Protocol event reporter lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
