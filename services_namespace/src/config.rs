//! Process-level configuration

use crate::error::NamesystemError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use storage_policy::PolicySuiteConfig;

/// Edit log file name inside the storage directory
pub const EDIT_LOG_FILE: &str = "edits.log";
/// Checkpoint image file name inside the storage directory
pub const CHECKPOINT_FILE: &str = "fsimage.json";

fn default_replication() -> u16 {
    3
}

/// Configuration of a namesystem
///
/// ```
/// use services_namespace::NamesystemConfig;
///
/// let config = NamesystemConfig::from_json(r#"{ "default_replication": 2 }"#).unwrap();
/// assert_eq!(config.default_replication, 2);
/// assert!(config.storage_dir.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamesystemConfig {
    /// Storage policy table; the built-in HOT/WARM/COLD suite if omitted
    #[serde(default)]
    pub policies: PolicySuiteConfig,

    /// Replication for files created without an explicit factor
    #[serde(default = "default_replication")]
    pub default_replication: u16,

    /// Directory holding the edit log and checkpoint image
    #[serde(default)]
    pub storage_dir: Option<PathBuf>,
}

impl NamesystemConfig {
    pub fn from_json(json: &str) -> Result<Self, NamesystemError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| NamesystemError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, NamesystemError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| {
            NamesystemError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }

    pub fn validate(&self) -> Result<(), NamesystemError> {
        if self.default_replication == 0 {
            return Err(NamesystemError::Config(
                "default_replication must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn edit_log_path(&self) -> Option<PathBuf> {
        self.storage_dir.as_ref().map(|dir| dir.join(EDIT_LOG_FILE))
    }

    pub fn checkpoint_path(&self) -> Option<PathBuf> {
        self.storage_dir.as_ref().map(|dir| dir.join(CHECKPOINT_FILE))
    }
}

impl Default for NamesystemConfig {
    fn default() -> Self {
        Self {
            policies: PolicySuiteConfig::default(),
            default_replication: default_replication(),
            storage_dir: None,
        }
    }
}
