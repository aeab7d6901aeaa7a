//! Policy suite configuration
//!
//! The suite is described by a static table, normally read from a JSON
//! document once at process start:
//!
//! ```json
//! {
//!   "default_policy": "HOT",
//!   "name_matching": "ignore_ascii_case",
//!   "policies": [
//!     { "id": 12, "name": "HOT", "storage_types": ["DISK"],
//!       "replication_fallbacks": ["ARCHIVE"] }
//!   ]
//! }
//! ```

use crate::PolicyError;
use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;
use core_types::StorageType;
use serde::{Deserialize, Serialize};

/// How policy names are compared on lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameMatching {
    /// Names must match byte for byte
    Exact,
    /// Names match ignoring ASCII case
    #[default]
    IgnoreAsciiCase,
}

impl NameMatching {
    /// Returns true if `a` and `b` name the same policy
    pub fn matches(&self, a: &str, b: &str) -> bool {
        match self {
            NameMatching::Exact => a == b,
            NameMatching::IgnoreAsciiCase => a.eq_ignore_ascii_case(b),
        }
    }
}

/// One entry of the policy table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub id: u8,
    pub name: String,
    pub storage_types: Vec<StorageType>,
    #[serde(default)]
    pub creation_fallbacks: Vec<StorageType>,
    #[serde(default)]
    pub replication_fallbacks: Vec<StorageType>,
}

impl PolicyConfig {
    pub fn new(id: u8, name: impl Into<String>, storage_types: Vec<StorageType>) -> Self {
        Self {
            id,
            name: name.into(),
            storage_types,
            creation_fallbacks: Vec::new(),
            replication_fallbacks: Vec::new(),
        }
    }

    pub fn with_creation_fallbacks(mut self, fallbacks: Vec<StorageType>) -> Self {
        self.creation_fallbacks = fallbacks;
        self
    }

    pub fn with_replication_fallbacks(mut self, fallbacks: Vec<StorageType>) -> Self {
        self.replication_fallbacks = fallbacks;
        self
    }
}

/// The whole policy table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySuiteConfig {
    /// Name of the default policy; loading fails when absent
    #[serde(default)]
    pub default_policy: Option<String>,
    #[serde(default)]
    pub name_matching: NameMatching,
    pub policies: Vec<PolicyConfig>,
}

impl PolicySuiteConfig {
    /// Parses a configuration document
    ///
    /// Only the syntax is checked here; [`crate::PolicySuite::load`] validates
    /// the contents.
    pub fn from_json(bytes: &[u8]) -> Result<Self, PolicyError> {
        serde_json::from_slice(bytes)
            .map_err(|e| PolicyError::MalformedConfiguration(e.to_string()))
    }

    /// Serializes the configuration as JSON
    pub fn to_json(&self) -> Result<Vec<u8>, PolicyError> {
        serde_json::to_vec(self).map_err(|e| PolicyError::MalformedConfiguration(e.to_string()))
    }
}

impl Default for PolicySuiteConfig {
    /// The built-in HOT/WARM/COLD table, with HOT as default
    fn default() -> Self {
        use StorageType::{Archive, Disk};

        Self {
            default_policy: Some("HOT".to_string()),
            name_matching: NameMatching::default(),
            policies: vec![
                PolicyConfig::new(12, "HOT", vec![Disk])
                    .with_replication_fallbacks(vec![Archive]),
                PolicyConfig::new(8, "WARM", vec![Disk, Archive])
                    .with_creation_fallbacks(vec![Disk, Archive])
                    .with_replication_fallbacks(vec![Disk, Archive]),
                PolicyConfig::new(4, "COLD", vec![Archive]),
            ],
        }
    }
}
