//! Namespace errors

use crate::path::PathError;
use thiserror::Error;

/// Errors that can occur during namespace operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NamespaceError {
    /// Path syntax error
    #[error("Path error: {0}")]
    PathError(#[from] PathError),

    /// No node exists at the path
    #[error("File/Directory does not exist: {0}")]
    PathNotFound(String),

    /// A path component that must be a directory is a file
    #[error("Not a directory: {0}")]
    NotADirectory(String),

    /// A node already exists at the path
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Non-recursive delete of a non-empty directory
    #[error("Directory is not empty: {0}")]
    DirectoryNotEmpty(String),

    /// Mutation addressed through a snapshot path
    #[error("Modification on a read-only snapshot is disallowed: {0}")]
    SnapshotReadOnly(String),

    /// Snapshot name already used for this directory
    #[error("Snapshot {name} already exists for {path}")]
    SnapshotExists { path: String, name: String },

    /// No snapshot with this name for this directory
    #[error("Cannot find snapshot {name} of {path}")]
    SnapshotNotFound { path: String, name: String },

    /// Delete of a directory that still has snapshots
    #[error("The directory {0} cannot be deleted since it has snapshot(s)")]
    HasSnapshots(String),

    /// Operation not allowed on this node
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Checkpoint image is inconsistent
    #[error("Corrupt namespace image: {0}")]
    CorruptImage(String),
}
