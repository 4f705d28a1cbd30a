//! Bidirectional index of which protocols each peer advertises, and which peers advertise each
//! protocol.
//!
//! The index only ever accumulates associations. Every first sighting of a (peer, protocol) pair
//! is broadcast as a [`ProtocolEvent::Added`].

pub mod events;
pub mod index;
pub mod metrics;
pub mod protocol;
pub mod traits;

pub use events::{DEFAULT_CHANNEL_CAPACITY, ProtocolEvent, ProtocolEventEmitter};
pub use index::{IndexSnapshot, PeerProtocolIndex};
pub use metrics::ProtocolIndexMetrics;
pub use protocol::ProtocolId;
pub use traits::NetPeerId;
