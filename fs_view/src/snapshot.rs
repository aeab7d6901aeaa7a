//! Snapshots of namespace subtrees
//!
//! A snapshot is a name, the directory it was taken of, and the tree epoch
//! at which it was taken. Creating one copies nothing: the versioned node
//! cells already retain every state a snapshot can observe.

use core_types::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use storage_policy::PolicyId;

use crate::node::Epoch;

/// A read-only, point-in-time view of a directory subtree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub name: String,
    /// The snapshotted directory
    pub root: NodeId,
    pub epoch: Epoch,
    /// Effective policy the root inherited from outside the subtree when the
    /// snapshot was taken
    pub inherited_policy: PolicyId,
}

/// Which version of the tree a read observes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Live,
    Snapshot {
        root: NodeId,
        epoch: Epoch,
        inherited_policy: PolicyId,
    },
}

impl Layer {
    pub fn is_live(&self) -> bool {
        matches!(self, Layer::Live)
    }
}

impl From<&Snapshot> for Layer {
    fn from(snapshot: &Snapshot) -> Self {
        Layer::Snapshot {
            root: snapshot.root,
            epoch: snapshot.epoch,
            inherited_policy: snapshot.inherited_policy,
        }
    }
}

/// Registry of snapshots, keyed by snapshotted directory then name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotManager {
    by_root: BTreeMap<NodeId, BTreeMap<String, Snapshot>>,
}

impl SnapshotManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, root: NodeId, name: &str) -> Option<&Snapshot> {
        self.by_root.get(&root).and_then(|snaps| snaps.get(name))
    }

    pub fn contains(&self, root: NodeId, name: &str) -> bool {
        self.get(root, name).is_some()
    }

    /// Snapshots of one directory, in name order
    pub fn of(&self, root: NodeId) -> impl Iterator<Item = &Snapshot> {
        self.by_root.get(&root).into_iter().flat_map(|s| s.values())
    }

    /// Returns true if `root` has at least one snapshot
    pub fn has_snapshots(&self, root: NodeId) -> bool {
        self.by_root.get(&root).map_or(false, |s| !s.is_empty())
    }

    pub(crate) fn insert(&mut self, snapshot: Snapshot) {
        self.by_root
            .entry(snapshot.root)
            .or_default()
            .insert(snapshot.name.clone(), snapshot);
    }

    pub(crate) fn remove(&mut self, root: NodeId, name: &str) -> Option<Snapshot> {
        let snaps = self.by_root.get_mut(&root)?;
        let removed = snaps.remove(name);
        if snaps.is_empty() {
            self.by_root.remove(&root);
        }
        removed
    }

    /// Every snapshot, ordered by directory then name
    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.by_root.values().flat_map(|s| s.values())
    }

    /// Epochs some snapshot still reads at
    pub fn epochs(&self) -> BTreeSet<Epoch> {
        self.iter().map(|s| s.epoch).collect()
    }

    pub fn len(&self) -> usize {
        self.by_root.values().map(|s| s.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_root.is_empty()
    }
}
