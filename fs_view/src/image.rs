//! Serializable image of a whole namespace
//!
//! The image holds every retained node version and every snapshot, so a
//! namespace restored from it answers live and snapshot reads exactly like
//! the one it was taken from.

use crate::error::NamespaceError;
use crate::namespace::Namespace;
use crate::node::{Epoch, NodeState, NodeVersion, VersionedNode};
use crate::snapshot::{Snapshot, SnapshotManager};
use core_types::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// One stored version of a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub since: Epoch,
    /// `None` marks the node deleted from `since` on
    pub state: Option<NodeState>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub versions: Vec<VersionRecord>,
}

/// Namespace image, ordered by node id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceImage {
    pub epoch: Epoch,
    pub next_id: NodeId,
    pub nodes: Vec<NodeRecord>,
    pub snapshots: Vec<Snapshot>,
}

impl Namespace {
    /// Captures the namespace as an image
    pub fn to_image(&self) -> NamespaceImage {
        let nodes = self
            .nodes
            .iter()
            .map(|(&id, cell)| NodeRecord {
                id,
                versions: cell
                    .versions()
                    .iter()
                    .map(|v| VersionRecord {
                        since: v.since,
                        state: v.state.as_deref().cloned(),
                    })
                    .collect(),
            })
            .collect();

        NamespaceImage {
            epoch: self.epoch,
            next_id: self.next_id,
            nodes,
            snapshots: self.snapshots.iter().cloned().collect(),
        }
    }

    /// Restores a namespace from an image
    ///
    /// Rejects images without a live root directory, with duplicate or
    /// out-of-range node ids, with unordered versions, or with snapshots of
    /// unknown directories.
    pub fn from_image(image: NamespaceImage) -> Result<Self, NamespaceError> {
        let corrupt = |msg: String| NamespaceError::CorruptImage(msg);

        let mut nodes = BTreeMap::new();
        for record in image.nodes {
            if record.id >= image.next_id {
                return Err(corrupt(format!(
                    "{} is not below the next id {}",
                    record.id, image.next_id
                )));
            }
            let versions = record
                .versions
                .into_iter()
                .map(|v| NodeVersion {
                    since: v.since,
                    state: v.state.map(Arc::new),
                })
                .collect();
            let cell = VersionedNode::from_versions(versions)
                .ok_or_else(|| corrupt(format!("{} has unordered or no versions", record.id)))?;
            if nodes.insert(record.id, cell).is_some() {
                return Err(corrupt(format!("{} appears twice", record.id)));
            }
        }

        let root_is_dir = nodes
            .get(&NodeId::ROOT)
            .and_then(|cell| cell.current())
            .map_or(false, |state| state.is_directory());
        if !root_is_dir {
            return Err(corrupt("root directory is missing".to_string()));
        }

        let mut snapshots = SnapshotManager::new();
        for snapshot in image.snapshots {
            if !nodes.contains_key(&snapshot.root) || snapshot.epoch >= image.epoch {
                return Err(corrupt(format!(
                    "snapshot {} of {} does not match the tree",
                    snapshot.name, snapshot.root
                )));
            }
            snapshots.insert(snapshot);
        }

        Ok(Namespace {
            nodes,
            snapshots,
            epoch: image.epoch,
            next_id: image.next_id,
        })
    }
}
