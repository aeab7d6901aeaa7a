//! Listing entries

use core_types::NodeId;
use serde::{Deserialize, Serialize};
use storage_policy::PolicyId;

/// Kind of a listed entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    File,
    Directory,
}

/// Status of one namespace entry as reported by listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStatus {
    /// Entry name; empty for the root directory
    pub name: String,
    pub node_id: NodeId,
    pub kind: FileKind,
    /// Replication factor, 0 for directories
    pub replication: u16,
    /// Number of children, 0 for files
    pub children_num: usize,
    /// Effective (inherited or explicit) policy; `UNSPECIFIED` if none
    pub storage_policy: PolicyId,
}

impl FileStatus {
    pub fn is_directory(&self) -> bool {
        self.kind == FileKind::Directory
    }

    /// Effective policy id in its wire form
    pub fn storage_policy_id(&self) -> u8 {
        self.storage_policy.as_u8()
    }
}
