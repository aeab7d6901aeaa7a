//! Logical namespace operations
//!
//! Every mutation of the tree is described by a [`NamespaceOp`]. The same
//! value is journaled by the durability layer and replayed on restart, so
//! applying a sequence of operations to an empty tree always rebuilds the
//! same tree, node ids included.

use core_types::NodeId;
use serde::{Deserialize, Serialize};
use storage_policy::PolicyId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum NamespaceOp {
    /// Create a directory and any missing ancestors
    Mkdirs { path: String },
    /// Create a file, creating missing parent directories
    CreateFile { path: String, replication: u16 },
    Delete { path: String, recursive: bool },
    SetStoragePolicy { path: String, policy_id: PolicyId },
    CreateSnapshot { path: String, name: String },
    DeleteSnapshot { path: String, name: String },
}

impl NamespaceOp {
    /// The path the operation addresses
    pub fn path(&self) -> &str {
        match self {
            NamespaceOp::Mkdirs { path }
            | NamespaceOp::CreateFile { path, .. }
            | NamespaceOp::Delete { path, .. }
            | NamespaceOp::SetStoragePolicy { path, .. }
            | NamespaceOp::CreateSnapshot { path, .. }
            | NamespaceOp::DeleteSnapshot { path, .. } => path,
        }
    }
}

/// An operation that has been validated against the tree
///
/// Produced by [`crate::Namespace::prepare`] and consumed by
/// [`crate::Namespace::execute`], which cannot fail. Nothing may mutate the
/// tree between the two calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreparedOp {
    Mkdirs {
        parent: NodeId,
        missing: Vec<String>,
    },
    CreateFile {
        parent: NodeId,
        missing: Vec<String>,
        name: String,
        replication: u16,
    },
    Delete {
        parent: NodeId,
        name: String,
        target: NodeId,
    },
    SetStoragePolicy {
        target: NodeId,
        policy_id: PolicyId,
    },
    CreateSnapshot {
        root: NodeId,
        name: String,
    },
    DeleteSnapshot {
        root: NodeId,
        name: String,
    },
}
