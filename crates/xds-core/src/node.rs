//! Proxy identity.
//!
//! Every snapshot is published for one proxy node. [`NodeId`] keeps the
//! human-readable id for logs; [`NodeHash`] is the FNV-1a key the snapshot
//! cache is indexed by.

use std::fmt;
use std::hash::{Hash, Hasher};

use fnv::FnvHasher;

/// Hash of a proxy node id, used as the snapshot cache key.
///
/// # Example
///
/// ```rust
/// use xds_core::NodeHash;
///
/// let a = NodeHash::from_id("seldon-mesh");
/// let b = NodeHash::from_id("seldon-mesh");
/// assert_eq!(a, b);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHash(u64);

impl NodeHash {
    /// Hash a node id string with FNV-1a.
    #[must_use]
    pub fn from_id(node_id: &str) -> Self {
        let mut hasher = FnvHasher::default();
        node_id.hash(&mut hasher);
        Self(hasher.finish())
    }

    /// Get the raw hash value.
    #[must_use]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// A proxy node identity: the id the proxy announces plus its hash.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeId {
    id: String,
    hash: NodeHash,
}

impl NodeId {
    /// Create a node identity from the id the proxy announces.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let hash = NodeHash::from_id(&id);
        Self { id, hash }
    }

    /// The node id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The cache key for this node.
    #[must_use]
    pub fn hash(&self) -> NodeHash {
        self.hash
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_hash_deterministic() {
        let a = NodeHash::from_id("seldon-mesh");
        let b = NodeHash::from_id("seldon-mesh");
        assert_eq!(a, b);
        assert_ne!(a, NodeHash::from_id("seldon-mesh-2"));
    }

    #[test]
    fn test_node_id_carries_hash() {
        let node = NodeId::new("seldon-mesh");
        assert_eq!(node.hash(), NodeHash::from_id("seldon-mesh"));
        assert_eq!(node.to_string(), "seldon-mesh");
    }

    #[test]
    fn test_hash_display_is_hex() {
        let display = NodeHash::from_id("seldon-mesh").to_string();
        assert_eq!(display.len(), 16);
        assert!(display.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
