//! # Filesystem View
//!
//! An in-memory hierarchical namespace whose nodes carry storage policies.
//!
//! ## Design
//!
//! - Every file and directory is a node in one arena, addressed by [`NodeId`](core_types::NodeId)
//! - A node stores only its *explicit* policy; the effective policy is
//!   resolved by walking towards the root
//! - Snapshots are read-only views of a directory subtree, reached through
//!   `<dir>/.snapshot/<name>/...` paths
//! - Mutations are [`NamespaceOp`] values, validated before anything changes
//!   so a failed operation leaves the tree untouched
//!
//! ```
//! use fs_view::{Namespace, NamespaceOp};
//! use storage_policy::PolicyId;
//!
//! let mut ns = Namespace::new();
//! ns.apply(&NamespaceOp::CreateFile { path: "/dir/f".into(), replication: 3 }).unwrap();
//! ns.apply(&NamespaceOp::SetStoragePolicy {
//!     path: "/dir".into(),
//!     policy_id: PolicyId::from_raw(8),
//! })
//! .unwrap();
//!
//! let listing = ns.list("/dir").unwrap();
//! assert_eq!(listing[0].storage_policy, PolicyId::from_raw(8));
//! ```

pub mod error;
pub mod image;
pub mod namespace;
pub mod node;
pub mod ops;
pub mod path;
pub mod snapshot;
pub mod status;

pub use error::NamespaceError;
pub use image::{NamespaceImage, NodeRecord, VersionRecord};
pub use namespace::{Namespace, Resolved};
pub use node::{Epoch, NodeKind, NodeState};
pub use ops::{NamespaceOp, PreparedOp};
pub use path::{PathError, PathResolver, SNAPSHOT_DIR};
pub use snapshot::{Layer, Snapshot, SnapshotManager};
pub use status::{FileKind, FileStatus};
