//! Storage policy values

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core_types::StorageType;
use serde::{Deserialize, Serialize};

/// Identifier of a storage policy
///
/// Explicit policies use ids in `1..=PolicyId::MAX`. The value `0` is
/// [`PolicyId::UNSPECIFIED`]: a node carrying it has no explicit policy and
/// inherits from its ancestors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyId(u8);

impl PolicyId {
    /// "No explicit policy"
    pub const UNSPECIFIED: PolicyId = PolicyId(0);

    /// Largest id an explicit policy may use (ids fit in four bits)
    pub const MAX: u8 = 15;

    /// Creates a policy id from its raw value
    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    /// Returns the raw value as reported in listings
    pub const fn as_u8(&self) -> u8 {
        self.0
    }

    /// Returns true for the sentinel
    pub const fn is_unspecified(&self) -> bool {
        self.0 == Self::UNSPECIFIED.0
    }

    /// Returns true if an explicit policy may use this id
    pub const fn is_valid_explicit(&self) -> bool {
        self.0 >= 1 && self.0 <= Self::MAX
    }
}

impl Default for PolicyId {
    fn default() -> Self {
        Self::UNSPECIFIED
    }
}

impl fmt::Display for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named storage tier policy
///
/// Immutable once its suite has been loaded. The media lists are consulted
/// by the resolver:
/// - `storage_types` assigns media to replicas `1..N`
/// - `creation_fallbacks` is scanned when a new replica's medium is unavailable
/// - `replication_fallbacks` is scanned when re-replicating an existing block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoragePolicy {
    id: PolicyId,
    name: String,
    storage_types: Vec<StorageType>,
    creation_fallbacks: Vec<StorageType>,
    replication_fallbacks: Vec<StorageType>,
}

impl StoragePolicy {
    /// Creates a policy
    ///
    /// Only the suite loader calls this; it validates the id range and that
    /// `storage_types` is non-empty before doing so.
    pub(crate) fn new(
        id: PolicyId,
        name: String,
        storage_types: Vec<StorageType>,
        creation_fallbacks: Vec<StorageType>,
        replication_fallbacks: Vec<StorageType>,
    ) -> Self {
        Self {
            id,
            name,
            storage_types,
            creation_fallbacks,
            replication_fallbacks,
        }
    }

    pub fn id(&self) -> PolicyId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Preferred media, in replica order
    pub fn storage_types(&self) -> &[StorageType] {
        &self.storage_types
    }

    pub fn creation_fallbacks(&self) -> &[StorageType] {
        &self.creation_fallbacks
    }

    pub fn replication_fallbacks(&self) -> &[StorageType] {
        &self.replication_fallbacks
    }
}

struct MediaList<'a>(&'a [StorageType]);

impl fmt::Display for MediaList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, t) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", t)?;
        }
        f.write_str("]")
    }
}

impl fmt::Display for StoragePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StoragePolicy{{{}:{}, storageTypes={}, creationFallbacks={}, replicationFallbacks={}}}",
            self.name,
            self.id,
            MediaList(&self.storage_types),
            MediaList(&self.creation_fallbacks),
            MediaList(&self.replication_fallbacks),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use alloc::vec;

    #[test]
    fn test_unspecified_sentinel() {
        assert!(PolicyId::UNSPECIFIED.is_unspecified());
        assert!(!PolicyId::UNSPECIFIED.is_valid_explicit());
        assert_eq!(PolicyId::default(), PolicyId::UNSPECIFIED);
        assert_eq!(PolicyId::UNSPECIFIED.as_u8(), 0);
    }

    #[test]
    fn test_explicit_id_range() {
        assert!(PolicyId::from_raw(1).is_valid_explicit());
        assert!(PolicyId::from_raw(15).is_valid_explicit());
        assert!(!PolicyId::from_raw(16).is_valid_explicit());
    }

    #[test]
    fn test_policy_display() {
        let policy = StoragePolicy::new(
            PolicyId::from_raw(8),
            "WARM".to_string(),
            vec![StorageType::Disk, StorageType::Archive],
            vec![StorageType::Disk, StorageType::Archive],
            vec![],
        );
        assert_eq!(
            policy.to_string(),
            "StoragePolicy{WARM:8, storageTypes=[DISK, ARCHIVE], \
             creationFallbacks=[DISK, ARCHIVE], replicationFallbacks=[]}"
        );
    }

    #[test]
    fn test_policy_id_serializes_as_integer() {
        let json = serde_json::to_string(&PolicyId::from_raw(12)).unwrap();
        assert_eq!(json, "12");
    }
}
