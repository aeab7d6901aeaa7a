//! Namespace nodes and their versioned state
//!
//! A node's mutable fields live in a [`NodeState`] value that is never
//! modified once published. Each node owns a [`VersionedNode`] cell: an
//! ordered list of states, each tagged with the tree epoch it was written in.
//! A snapshot taken at epoch `e` keeps reading the state that was current at
//! `e`, while the live tree reads the newest one.

use core_types::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use storage_policy::PolicyId;

/// Logical clock of the tree, advanced by every snapshot creation
pub type Epoch = u64;

/// What a node is
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    File {
        replication: u16,
    },
    Directory {
        /// Child name -> child node, in byte-wise name order
        children: BTreeMap<String, NodeId>,
    },
}

/// One immutable version of a node's state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeState {
    pub name: String,
    /// Back-reference to the parent; the tree owns both nodes
    pub parent: Option<NodeId>,
    /// Explicit policy, or `UNSPECIFIED` to inherit
    pub storage_policy: PolicyId,
    pub kind: NodeKind,
}

impl NodeState {
    pub fn directory(name: impl Into<String>, parent: Option<NodeId>) -> Self {
        Self {
            name: name.into(),
            parent,
            storage_policy: PolicyId::UNSPECIFIED,
            kind: NodeKind::Directory {
                children: BTreeMap::new(),
            },
        }
    }

    pub fn file(name: impl Into<String>, parent: NodeId, replication: u16) -> Self {
        Self {
            name: name.into(),
            parent: Some(parent),
            storage_policy: PolicyId::UNSPECIFIED,
            kind: NodeKind::File { replication },
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self.kind, NodeKind::Directory { .. })
    }

    /// Returns the children of a directory, `None` for files
    pub fn children(&self) -> Option<&BTreeMap<String, NodeId>> {
        match &self.kind {
            NodeKind::Directory { children } => Some(children),
            NodeKind::File { .. } => None,
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut BTreeMap<String, NodeId>> {
        match &mut self.kind {
            NodeKind::Directory { children } => Some(children),
            NodeKind::File { .. } => None,
        }
    }

    /// Looks up a child by name
    pub fn child(&self, name: &str) -> Option<NodeId> {
        self.children().and_then(|c| c.get(name).copied())
    }

    /// Replication factor of a file, 0 for directories
    pub fn replication(&self) -> u16 {
        match self.kind {
            NodeKind::File { replication } => replication,
            NodeKind::Directory { .. } => 0,
        }
    }
}

/// A node state and the epoch from which it is current
///
/// `state == None` marks the node as deleted from that epoch on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeVersion {
    pub since: Epoch,
    pub state: Option<Arc<NodeState>>,
}

/// Copy-on-write cell holding every retained version of one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedNode {
    /// Ascending by `since`, never empty
    versions: Vec<NodeVersion>,
}

impl VersionedNode {
    pub fn new(since: Epoch, state: NodeState) -> Self {
        Self {
            versions: vec![NodeVersion {
                since,
                state: Some(Arc::new(state)),
            }],
        }
    }

    /// Rebuilds a cell from stored versions
    ///
    /// Returns `None` unless the versions are non-empty and strictly ascending.
    pub fn from_versions(versions: Vec<NodeVersion>) -> Option<Self> {
        let ascending = versions.windows(2).all(|w| w[0].since < w[1].since);
        if versions.is_empty() || !ascending {
            return None;
        }
        Some(Self { versions })
    }

    pub fn versions(&self) -> &[NodeVersion] {
        &self.versions
    }

    /// The live state, `None` once the node is deleted
    pub fn current(&self) -> Option<&Arc<NodeState>> {
        self.versions.last().and_then(|v| v.state.as_ref())
    }

    /// The state that was current at `epoch`
    pub fn at(&self, epoch: Epoch) -> Option<&Arc<NodeState>> {
        self.versions
            .iter()
            .rev()
            .find(|v| v.since <= epoch)
            .and_then(|v| v.state.as_ref())
    }

    /// Publishes a new live state
    ///
    /// A version written in the same epoch has not been captured by any
    /// snapshot and is replaced; otherwise the new version is appended and
    /// the older one stays visible to snapshots.
    pub fn write(&mut self, epoch: Epoch, state: Option<Arc<NodeState>>) {
        match self.versions.last_mut() {
            Some(last) if last.since == epoch => last.state = state,
            _ => self.versions.push(NodeVersion {
                since: epoch,
                state,
            }),
        }
    }

    /// Returns true if no retained version holds a state
    pub fn is_gone(&self) -> bool {
        self.versions.iter().all(|v| v.state.is_none())
    }

    /// Drops versions that neither the live tree nor any snapshot can see
    pub fn prune(&mut self, snapshot_epochs: &BTreeSet<Epoch>) {
        let count = self.versions.len();
        let mut kept = Vec::with_capacity(count);
        for (i, version) in self.versions.iter().enumerate() {
            let until = self.versions.get(i + 1).map(|next| next.since);
            let seen_by_snapshot = snapshot_epochs
                .range(version.since..)
                .next()
                .map_or(false, |&e| until.map_or(true, |u| e < u));
            if until.is_none() || seen_by_snapshot {
                kept.push(version.clone());
            }
        }
        self.versions = kept;
    }
}
