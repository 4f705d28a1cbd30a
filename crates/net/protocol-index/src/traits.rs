//! Peer identifier bound shared by the index and its consumers.

use std::fmt::Debug;
use std::hash::Hash;

/// Blanket-implemented for any type with Clone + Eq + Hash + Send + Sync + Debug.
///
/// The index never inspects the identifier; it is only used as a map key.
pub trait NetPeerId: Clone + Eq + Hash + Send + Sync + Debug + 'static {}

impl<T> NetPeerId for T where T: Clone + Eq + Hash + Send + Sync + Debug + 'static {}
