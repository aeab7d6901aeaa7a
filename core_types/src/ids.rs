//! Unique identifiers for namespace entities

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a node in the namespace tree
///
/// Node identifiers are allocated sequentially by the tree that owns the
/// node, so replaying the same operations always yields the same ids.
/// The root directory always has id [`NodeId::ROOT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    /// The root directory
    pub const ROOT: NodeId = NodeId(1);

    /// Creates a node ID from its raw value
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw value
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Returns the id allocated after this one
    pub const fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns true for the root directory
    pub fn is_root(&self) -> bool {
        *self == Self::ROOT
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}
