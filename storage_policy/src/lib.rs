//! # Storage Policy Engine
//!
//! This crate defines storage tier policies and the pure algorithms that turn
//! a policy into concrete storage media.
//!
//! ## Philosophy
//!
//! - **Policies are values**: A [`StoragePolicy`] is immutable once its suite
//!   is loaded.
//! - **One suite, passed explicitly**: A [`PolicySuite`] is built once from
//!   configuration and shared by reference; there is no global table.
//! - **Total resolution**: Choosing media and fallbacks never fails. "No
//!   fallback" is a valid answer, not an error.
//!
//! ## Core Concepts
//!
//! - [`PolicyId`]: Small integer id, with [`PolicyId::UNSPECIFIED`] meaning
//!   "no explicit policy"
//! - [`StoragePolicy`]: Preferred media plus creation/replication fallbacks
//! - [`PolicySuite`]: Registry of all policies and the default one
//! - [`PolicySuiteConfig`]: Serializable configuration the suite is built from
//!
//! ## Example
//!
//! ```
//! use core_types::StorageType;
//! use storage_policy::PolicySuite;
//! use std::collections::BTreeSet;
//!
//! let suite = PolicySuite::builtin();
//! let warm = suite.policy_by_name("WARM").unwrap();
//! assert_eq!(
//!     warm.choose_storage_types(3),
//!     vec![StorageType::Disk, StorageType::Archive, StorageType::Archive]
//! );
//!
//! let unavailable: BTreeSet<_> = [StorageType::Disk].into_iter().collect();
//! assert_eq!(warm.creation_fallback(&unavailable), Some(StorageType::Archive));
//! ```

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod config;
pub mod error;
pub mod policy;
pub mod resolver;
pub mod suite;

pub use config::{NameMatching, PolicyConfig, PolicySuiteConfig};
pub use error::PolicyError;
pub use policy::{PolicyId, StoragePolicy};
pub use suite::PolicySuite;
