//! Protocol identifier value type.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use libp2p::StreamProtocol;
use serde::{Deserialize, Serialize};

/// Opaque protocol name, e.g. `/ipfs/id/1.0.0`.
///
/// Cheap to clone; the same name is stored once per map it appears in. Hashes and compares as
/// the underlying string, so maps keyed by `ProtocolId` can be queried with a `&str`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProtocolId(Arc<str>);

impl ProtocolId {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ProtocolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for ProtocolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProtocolId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ProtocolId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProtocolId {
    fn from(name: &str) -> Self {
        Self(Arc::from(name))
    }
}

impl From<String> for ProtocolId {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl From<&String> for ProtocolId {
    fn from(name: &String) -> Self {
        Self::new(name)
    }
}

impl From<&ProtocolId> for ProtocolId {
    fn from(id: &ProtocolId) -> Self {
        id.clone()
    }
}

impl From<StreamProtocol> for ProtocolId {
    fn from(protocol: StreamProtocol) -> Self {
        Self::new(protocol)
    }
}

impl From<&StreamProtocol> for ProtocolId {
    fn from(protocol: &StreamProtocol) -> Self {
        Self::new(protocol)
    }
}

impl PartialEq<str> for ProtocolId {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for ProtocolId {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_equality_is_by_value() {
        let a = ProtocolId::from("/chat/1.0");
        let b = ProtocolId::from(String::from("/chat/1.0"));

        assert_eq!(a, b);
        assert_eq!(a, "/chat/1.0");
        assert_ne!(a, ProtocolId::from("/chat/2.0"));
    }

    #[test]
    fn test_lookup_by_str() {
        let mut map = HashMap::new();
        map.insert(ProtocolId::from("/file/1.0"), 7);

        assert_eq!(map.get("/file/1.0"), Some(&7));
        assert_eq!(map.get("/file/2.0"), None);
    }

    #[test]
    fn test_from_stream_protocol() {
        let protocol = StreamProtocol::new("/ipfs/ping/1.0.0");
        let id = ProtocolId::from(&protocol);

        assert_eq!(id.as_str(), "/ipfs/ping/1.0.0");
        assert_eq!(id.to_string(), "/ipfs/ping/1.0.0");
    }

    #[test]
    fn test_serde_transparent() {
        let id = ProtocolId::from("/ipfs/id/1.0.0");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"/ipfs/id/1.0.0\"");

        let back: ProtocolId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
