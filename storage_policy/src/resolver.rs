//! Resolution of a policy into concrete media
//!
//! Everything here is a pure function of the policy and its arguments.

use crate::StoragePolicy;
use alloc::collections::BTreeSet;
use alloc::vec::Vec;
use core_types::StorageType;

impl StoragePolicy {
    /// Returns the medium for each of `replication` replicas
    ///
    /// Replica `i` gets `storage_types[i]`; once the list is exhausted every
    /// remaining replica gets its last entry. A policy without media yields
    /// nothing.
    pub fn choose_storage_types(&self, replication: u16) -> Vec<StorageType> {
        let types = self.storage_types();
        let last = types.len().saturating_sub(1);
        (0..usize::from(replication))
            .filter_map(|i| types.get(i.min(last)).copied())
            .collect()
    }

    /// Returns the media still needed when some replicas already exist
    ///
    /// Computes the full sequence for `replication` replicas and removes one
    /// occurrence of every medium in `chosen`. Media in `chosen` that the
    /// sequence does not expect are ignored.
    pub fn choose_remaining_storage_types(
        &self,
        replication: u16,
        chosen: &[StorageType],
    ) -> Vec<StorageType> {
        let mut expected = self.choose_storage_types(replication);
        for medium in chosen {
            if let Some(pos) = expected.iter().position(|t| t == medium) {
                expected.remove(pos);
            }
        }
        expected
    }

    /// Returns the medium to use for a new replica when some are unavailable
    pub fn creation_fallback(&self, unavailable: &BTreeSet<StorageType>) -> Option<StorageType> {
        first_available(self.creation_fallbacks(), unavailable)
    }

    /// Returns the medium to use when re-replicating and some are unavailable
    pub fn replication_fallback(
        &self,
        unavailable: &BTreeSet<StorageType>,
    ) -> Option<StorageType> {
        first_available(self.replication_fallbacks(), unavailable)
    }
}

fn first_available(
    fallbacks: &[StorageType],
    unavailable: &BTreeSet<StorageType>,
) -> Option<StorageType> {
    fallbacks
        .iter()
        .copied()
        .find(|t| !unavailable.contains(t))
}

#[cfg(test)]
mod tests {
    use crate::PolicySuite;
    use core_types::StorageType::{self, Archive, Disk};
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    const COLD: u8 = 4;
    const WARM: u8 = 8;
    const HOT: u8 = 12;

    fn set(types: &[StorageType]) -> BTreeSet<StorageType> {
        types.iter().copied().collect()
    }

    fn policy(id: u8) -> crate::StoragePolicy {
        PolicySuite::builtin()
            .policy(crate::PolicyId::from_raw(id))
            .cloned()
            .unwrap()
    }

    fn assert_storage_types(policy: &crate::StoragePolicy, answers: &[StorageType]) {
        for replication in 1u16..6 {
            let computed = policy.choose_storage_types(replication);
            assert_eq!(computed.len(), usize::from(replication));
            let last = answers[answers.len() - 1];
            for (i, t) in computed.iter().enumerate() {
                let expected = if i < answers.len() { answers[i] } else { last };
                assert_eq!(*t, expected, "replica {} of {}", i, replication);
            }
        }
    }

    fn assert_creation_fallback(
        policy: &crate::StoragePolicy,
        none_expected: Option<StorageType>,
        archive_expected: Option<StorageType>,
        disk_expected: Option<StorageType>,
    ) {
        assert_eq!(policy.creation_fallback(&set(&[])), none_expected);
        assert_eq!(policy.creation_fallback(&set(&[Archive])), archive_expected);
        assert_eq!(policy.creation_fallback(&set(&[Disk])), disk_expected);
        assert_eq!(policy.creation_fallback(&set(&[Disk, Archive])), None);
    }

    fn assert_replication_fallback(
        policy: &crate::StoragePolicy,
        none_expected: Option<StorageType>,
        archive_expected: Option<StorageType>,
        disk_expected: Option<StorageType>,
    ) {
        assert_eq!(policy.replication_fallback(&set(&[])), none_expected);
        assert_eq!(policy.replication_fallback(&set(&[Archive])), archive_expected);
        assert_eq!(policy.replication_fallback(&set(&[Disk])), disk_expected);
        assert_eq!(policy.replication_fallback(&set(&[Disk, Archive])), None);
    }

    #[test]
    fn test_cold_policy() {
        let cold = policy(COLD);
        assert_storage_types(&cold, &[Archive]);
        assert_creation_fallback(&cold, None, None, None);
        assert_replication_fallback(&cold, None, None, None);
    }

    #[test]
    fn test_warm_policy() {
        let warm = policy(WARM);
        assert_storage_types(&warm, &[Disk, Archive]);
        assert_creation_fallback(&warm, Some(Disk), Some(Disk), Some(Archive));
        assert_replication_fallback(&warm, Some(Disk), Some(Disk), Some(Archive));
    }

    #[test]
    fn test_hot_policy() {
        let hot = policy(HOT);
        assert_storage_types(&hot, &[Disk]);
        assert_creation_fallback(&hot, None, None, None);
        assert_replication_fallback(&hot, Some(Archive), None, Some(Archive));
    }

    #[test]
    fn test_zero_replication_is_empty() {
        assert!(policy(WARM).choose_storage_types(0).is_empty());
    }

    #[test]
    fn test_policy_without_media_yields_nothing() {
        let empty = crate::StoragePolicy::new(
            crate::PolicyId::from_raw(3),
            "EMPTY".into(),
            vec![],
            vec![],
            vec![],
        );
        assert!(empty.choose_storage_types(3).is_empty());
        assert!(empty.choose_remaining_storage_types(2, &[Disk]).is_empty());
    }

    #[test]
    fn test_remaining_storage_types() {
        let warm = policy(WARM);
        assert_eq!(
            warm.choose_remaining_storage_types(3, &[Archive]),
            vec![Disk, Archive]
        );
        assert_eq!(
            warm.choose_remaining_storage_types(3, &[Disk, Archive, Archive]),
            vec![]
        );
        // SSD replicas are not expected by WARM and do not count
        assert_eq!(
            warm.choose_remaining_storage_types(2, &[StorageType::Ssd]),
            vec![Disk, Archive]
        );
    }

    proptest! {
        #[test]
        fn prop_sequence_length_and_shape(replication in 1u16..64, id in prop::sample::select(vec![COLD, WARM, HOT])) {
            let policy = policy(id);
            let types = policy.storage_types();
            let computed = policy.choose_storage_types(replication);
            prop_assert_eq!(computed.len(), usize::from(replication));
            for (i, t) in computed.iter().enumerate() {
                let expected = types[i.min(types.len() - 1)];
                prop_assert_eq!(*t, expected);
            }
        }

        #[test]
        fn prop_no_fallback_when_disk_and_archive_unavailable(id in prop::sample::select(vec![COLD, WARM, HOT])) {
            let policy = policy(id);
            let both = set(&[Disk, Archive]);
            prop_assert_eq!(policy.creation_fallback(&both), None);
            prop_assert_eq!(policy.replication_fallback(&both), None);
        }
    }
}
