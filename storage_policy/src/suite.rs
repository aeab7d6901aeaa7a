//! The policy suite: every known policy plus the default

use crate::config::{NameMatching, PolicySuiteConfig};
use crate::{PolicyError, PolicyId, StoragePolicy};
use alloc::format;
use alloc::vec::Vec;

/// Immutable registry of storage policies
///
/// Built once from a [`PolicySuiteConfig`] and never mutated afterwards.
/// Lookups by id index straight into a table sized for every valid id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicySuite {
    /// Indexed by raw policy id; slot 0 (UNSPECIFIED) is always empty
    policies: Vec<Option<StoragePolicy>>,
    default_policy: PolicyId,
    name_matching: NameMatching,
}

impl PolicySuite {
    /// Builds and validates a suite
    ///
    /// Fails if the table is empty, an id is outside `1..=PolicyId::MAX`, an
    /// id or name is used twice (names compared with the configured
    /// matching), a name or `storage_types` list is empty, or the named
    /// default is missing or not registered.
    pub fn load(config: &PolicySuiteConfig) -> Result<Self, PolicyError> {
        if config.policies.is_empty() {
            return Err(PolicyError::MalformedConfiguration(
                "no storage policies are defined".into(),
            ));
        }

        let mut policies: Vec<Option<StoragePolicy>> =
            (0..=PolicyId::MAX).map(|_| None).collect();

        for (index, entry) in config.policies.iter().enumerate() {
            let id = PolicyId::from_raw(entry.id);
            if !id.is_valid_explicit() {
                return Err(PolicyError::MalformedConfiguration(format!(
                    "policy {} has id {} outside 1..={}",
                    entry.name,
                    entry.id,
                    PolicyId::MAX
                )));
            }
            if entry.name.trim().is_empty() {
                return Err(PolicyError::MalformedConfiguration(format!(
                    "policy with id {} has an empty name",
                    entry.id
                )));
            }
            if entry.storage_types.is_empty() {
                return Err(PolicyError::MalformedConfiguration(format!(
                    "policy {} has no storage types",
                    entry.name
                )));
            }
            if policies[usize::from(entry.id)].is_some() {
                return Err(PolicyError::MalformedConfiguration(format!(
                    "duplicate policy id {}",
                    entry.id
                )));
            }
            let name_taken = config.policies[..index]
                .iter()
                .any(|other| config.name_matching.matches(&other.name, &entry.name));
            if name_taken {
                return Err(PolicyError::MalformedConfiguration(format!(
                    "duplicate policy name {}",
                    entry.name
                )));
            }

            policies[usize::from(entry.id)] = Some(StoragePolicy::new(
                id,
                entry.name.clone(),
                entry.storage_types.clone(),
                entry.creation_fallbacks.clone(),
                entry.replication_fallbacks.clone(),
            ));
        }

        let name = config.default_policy.as_deref().ok_or_else(|| {
            PolicyError::MalformedConfiguration("no default storage policy is named".into())
        })?;
        let default_policy = config
            .policies
            .iter()
            .find(|p| config.name_matching.matches(&p.name, name))
            .map(|p| PolicyId::from_raw(p.id))
            .ok_or_else(|| {
                PolicyError::MalformedConfiguration(format!(
                    "default policy {} is not defined",
                    name
                ))
            })?;

        Ok(Self {
            policies,
            default_policy,
            name_matching: config.name_matching,
        })
    }

    /// The built-in HOT/WARM/COLD suite
    pub fn builtin() -> Self {
        match Self::load(&PolicySuiteConfig::default()) {
            Ok(suite) => suite,
            Err(e) => panic!("built-in storage policy table is invalid: {}", e),
        }
    }

    /// Looks up a policy by id
    ///
    /// Returns `None` for [`PolicyId::UNSPECIFIED`] and for ids that are not
    /// registered.
    pub fn policy(&self, id: PolicyId) -> Option<&StoragePolicy> {
        self.policies
            .get(usize::from(id.as_u8()))
            .and_then(|slot| slot.as_ref())
    }

    /// Returns the default policy
    pub fn default_policy(&self) -> &StoragePolicy {
        match self.policy(self.default_policy) {
            Some(policy) => policy,
            // load() only accepts a default it has registered
            None => unreachable!("default policy {} missing from suite", self.default_policy),
        }
    }

    /// Looks up a policy by name
    ///
    /// Never substitutes another policy for an unknown name.
    pub fn policy_by_name(&self, name: &str) -> Result<&StoragePolicy, PolicyError> {
        self.policies()
            .find(|p| self.name_matching.matches(p.name(), name))
            .ok_or_else(|| PolicyError::UnknownPolicyName(name.into()))
    }

    /// Returns every policy in ascending id order
    pub fn policies(&self) -> impl Iterator<Item = &StoragePolicy> {
        self.policies.iter().filter_map(|slot| slot.as_ref())
    }

    /// Returns true if `id` names a registered policy
    pub fn contains(&self, id: PolicyId) -> bool {
        self.policy(id).is_some()
    }

    pub fn name_matching(&self) -> NameMatching {
        self.name_matching
    }
}
