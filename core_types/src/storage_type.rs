//! Physical storage media

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A physical storage medium
///
/// The set is closed. There is no global ordering between media; the only
/// meaningful order is the one a storage policy lists them in. `Ord` is
/// derived so media can live in ordered sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StorageType {
    /// Rotational or general purpose disk
    Disk,
    /// Solid state drive
    Ssd,
    /// High density, low cost archival storage
    Archive,
    /// Memory-backed volume
    RamDisk,
}

impl StorageType {
    /// Every medium, in declaration order
    pub const ALL: [StorageType; 4] = [
        StorageType::Disk,
        StorageType::Ssd,
        StorageType::Archive,
        StorageType::RamDisk,
    ];

    /// Returns the canonical upper-case name
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageType::Disk => "DISK",
            StorageType::Ssd => "SSD",
            StorageType::Archive => "ARCHIVE",
            StorageType::RamDisk => "RAM_DISK",
        }
    }

    /// Returns true if data on this medium does not survive a restart
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageType::RamDisk)
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a medium name is not recognized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStorageTypeError(pub String);

impl fmt::Display for ParseStorageTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown storage type: {}", self.0)
    }
}

impl std::error::Error for ParseStorageTypeError {}

impl FromStr for StorageType {
    type Err = ParseStorageTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        StorageType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseStorageTypeError(trimmed.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names() {
        assert_eq!(StorageType::Disk.to_string(), "DISK");
        assert_eq!(StorageType::RamDisk.to_string(), "RAM_DISK");
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("archive".parse::<StorageType>(), Ok(StorageType::Archive));
        assert_eq!(" Ssd ".parse::<StorageType>(), Ok(StorageType::Ssd));
        assert_eq!("ram_disk".parse::<StorageType>(), Ok(StorageType::RamDisk));
    }

    #[test]
    fn test_parse_unknown() {
        let err = "TAPE".parse::<StorageType>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown storage type: TAPE");
    }

    #[test]
    fn test_serde_uses_upper_case_names() {
        let json = serde_json::to_string(&vec![StorageType::Disk, StorageType::RamDisk]).unwrap();
        assert_eq!(json, r#"["DISK","RAM_DISK"]"#);
        let back: Vec<StorageType> = serde_json::from_str(r#"["ARCHIVE","SSD"]"#).unwrap();
        assert_eq!(back, vec![StorageType::Archive, StorageType::Ssd]);
    }

    #[test]
    fn test_transient_media() {
        assert!(StorageType::RamDisk.is_transient());
        assert!(!StorageType::Archive.is_transient());
    }
}
