//! # Core Types
//!
//! This crate defines the fundamental value types shared by the storage-tier
//! policy workspace.
//!
//! ## Philosophy
//!
//! - **Values, not behavior**: Nothing here knows about policies or trees.
//! - **Type safety first**: Node identifiers and media kinds cannot be confused
//!   with raw integers or strings.
//!
//! ## Key Types
//!
//! - [`StorageType`]: A physical storage medium (DISK, SSD, ARCHIVE, RAM_DISK)
//! - [`NodeId`]: Identifier of a namespace node (file or directory)
//! - [`new_uuid`]: Source of random identifiers for journal transactions

pub mod ids;
pub mod storage_type;
mod uuid_tools;

pub use ids::NodeId;
pub use storage_type::{ParseStorageTypeError, StorageType};
pub use uuid_tools::new_uuid;
