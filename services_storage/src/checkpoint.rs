//! Checkpoint images
//!
//! A checkpoint holds a serialized namespace together with the txid of the
//! last edit it contains. Images carry a CRC32 over both, and are replaced
//! atomically on disk.

use crate::error::StorageError;
use crate::journal::Txid;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointImage {
    /// Last txid folded into `payload`
    pub txid: Txid,
    pub payload: String,
    /// CRC32 of `txid` and `payload`
    pub checksum: u32,
}

impl CheckpointImage {
    pub fn new(txid: Txid, payload: String) -> Self {
        let checksum = Self::compute_checksum(txid, &payload);
        Self {
            txid,
            payload,
            checksum,
        }
    }

    fn compute_checksum(txid: Txid, payload: &str) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&txid.to_le_bytes());
        hasher.update(payload.as_bytes());
        hasher.finalize()
    }

    pub fn is_valid(&self) -> bool {
        Self::compute_checksum(self.txid, &self.payload) == self.checksum
    }

    fn verified(self) -> Result<Self, StorageError> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(StorageError::ChecksumMismatch { txid: self.txid })
        }
    }
}

/// Trait for checkpoint persistence
pub trait CheckpointStore {
    /// Replaces the stored checkpoint
    fn save(&mut self, image: &CheckpointImage) -> Result<(), StorageError>;

    /// Returns the stored checkpoint, `None` if there is none yet
    fn load(&self) -> Result<Option<CheckpointImage>, StorageError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryCheckpointStore {
    image: Option<CheckpointImage>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn save(&mut self, image: &CheckpointImage) -> Result<(), StorageError> {
        self.image = Some(image.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<CheckpointImage>, StorageError> {
        self.image.clone().map(CheckpointImage::verified).transpose()
    }
}

/// Checkpoint stored as one JSON file
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    path: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CheckpointStore for FileCheckpointStore {
    fn save(&mut self, image: &CheckpointImage) -> Result<(), StorageError> {
        let tmp = self.path.with_extension("tmp");
        {
            let mut out = File::create(&tmp)?;
            out.write_all(&serde_json::to_vec(image)?)?;
            out.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), txid = image.txid, "saved checkpoint");
        Ok(())
    }

    fn load(&self) -> Result<Option<CheckpointImage>, StorageError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&self.path)?;
        let image: CheckpointImage = serde_json::from_slice(&bytes)?;
        image.verified().map(Some)
    }
}
