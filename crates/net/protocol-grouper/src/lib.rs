//! Service glue that keeps a [`PeerProtocolIndex`] fed from peer metadata updates.
//!
//! In automatic mode the grouper drains a stream of [`PeerUpdate`]s on a background task. In
//! manual mode the host calls [`ProtocolGrouper::apply`] itself.

pub mod config;
pub mod error;
pub mod service;
pub mod update;

pub use config::ProtocolGrouperConfig;
pub use error::GrouperError;
pub use service::ProtocolGrouper;
pub use update::PeerUpdate;

pub use plexus_net_protocol_index::{
    NetPeerId, PeerProtocolIndex, ProtocolEvent, ProtocolEventEmitter, ProtocolId,
};
