//! Protocol index metrics

use metrics::{Counter, Gauge};

/// Protocol index metrics
#[derive(Clone, Debug)]
pub struct ProtocolIndexMetrics {
    /// Number of `update` calls that carried at least one protocol
    pub(crate) updates_total: Counter,
    /// Number of (peer, protocol) associations recorded for the first time
    pub(crate) associations_added_total: Counter,
    /// Number of distinct peers in the index
    pub(crate) peers: Gauge,
    /// Number of distinct protocols in the index
    pub(crate) protocols: Gauge,
}

impl Default for ProtocolIndexMetrics {
    fn default() -> Self {
        Self {
            updates_total: metrics::counter!("protocol_index.updates_total"),
            associations_added_total: metrics::counter!(
                "protocol_index.associations_added_total"
            ),
            peers: metrics::gauge!("protocol_index.peers"),
            protocols: metrics::gauge!("protocol_index.protocols"),
        }
    }
}

impl ProtocolIndexMetrics {
    /// Records one applied update and its effect on the index.
    pub(crate) fn record_update(&self, added: usize, peers: usize, protocols: usize) {
        self.updates_total.increment(1);
        self.associations_added_total.increment(added as u64);
        self.peers.set(peers as f64);
        self.protocols.set(protocols as f64);
    }
}
