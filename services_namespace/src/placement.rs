//! Media selection for a file's replicas
//!
//! This is the only place the suite's default policy stands in for an
//! unspecified one.

use core_types::StorageType;
use std::collections::BTreeSet;
use storage_policy::{PolicyId, PolicySuite, StoragePolicy};
use tracing::warn;

/// Media chosen for the replicas of one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Policy the media were chosen by
    pub policy: PolicyId,
    pub policy_name: String,
    /// True if the path had no effective policy and the default was used
    pub defaulted: bool,
    /// One medium per replica, unavailable media already substituted
    pub storage_types: Vec<StorageType>,
    pub creation_fallback: Option<StorageType>,
    pub replication_fallback: Option<StorageType>,
}

impl Placement {
    /// Chooses media under the effective policy `effective`
    ///
    /// An `UNSPECIFIED` or unregistered id falls back to the suite default.
    /// Replicas whose medium is in `unavailable` get the creation fallback
    /// instead, or are dropped when there is none.
    pub fn resolve(
        suite: &PolicySuite,
        effective: PolicyId,
        replication: u16,
        unavailable: &BTreeSet<StorageType>,
    ) -> Self {
        let (policy, defaulted) = match suite.policy(effective) {
            Some(policy) => (policy, false),
            None => {
                if !effective.is_unspecified() {
                    warn!(
                        policy_id = effective.as_u8(),
                        "policy id is not in the suite, using the default"
                    );
                }
                (suite.default_policy(), true)
            }
        };
        Self::with_policy(policy, defaulted, replication, unavailable)
    }

    fn with_policy(
        policy: &StoragePolicy,
        defaulted: bool,
        replication: u16,
        unavailable: &BTreeSet<StorageType>,
    ) -> Self {
        let creation_fallback = policy.creation_fallback(unavailable);
        let storage_types = policy
            .choose_storage_types(replication)
            .into_iter()
            .filter_map(|medium| {
                if unavailable.contains(&medium) {
                    creation_fallback
                } else {
                    Some(medium)
                }
            })
            .collect();

        Self {
            policy: policy.id(),
            policy_name: policy.name().to_string(),
            defaulted,
            storage_types,
            creation_fallback,
            replication_fallback: policy.replication_fallback(unavailable),
        }
    }
}
