//! Protocol grouper configuration (TOML-serializable).

use plexus_net_protocol_index::DEFAULT_CHANNEL_CAPACITY;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolGrouperConfig {
    /// Drain the peer update source automatically once started
    #[serde(default = "default_auto_subscribe")]
    pub auto_subscribe: bool,

    /// Buffered `ProtocolEvent`s per subscriber before it starts lagging
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for ProtocolGrouperConfig {
    fn default() -> Self {
        Self {
            auto_subscribe: default_auto_subscribe(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl ProtocolGrouperConfig {
    pub fn manual() -> Self {
        Self {
            auto_subscribe: false,
            ..Default::default()
        }
    }
}

fn default_auto_subscribe() -> bool {
    true
}

fn default_event_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}
