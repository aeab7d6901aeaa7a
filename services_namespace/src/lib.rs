//! # Namespace Service
//!
//! The administrative and listing surface over the policy-annotated
//! namespace, with durability and restart.
//!
//! ## Design
//!
//! - One [`PolicySuite`](storage_policy::PolicySuite), loaded from
//!   configuration at start and shared read-only
//! - Every mutation is validated, journaled, then applied; a failure at any
//!   step leaves both the tree and the journal unchanged
//! - [`Namesystem::open`] rebuilds the tree from the latest checkpoint plus
//!   the committed journal records after it
//! - [`SharedNamesystem`] puts one writer and many readers behind a lock

pub mod config;
pub mod error;
pub mod namesystem;
pub mod placement;
pub mod shared;

pub use config::NamesystemConfig;
pub use error::NamesystemError;
pub use namesystem::{FileNamesystem, MemoryNamesystem, Namesystem};
pub use placement::Placement;
pub use shared::SharedNamesystem;
