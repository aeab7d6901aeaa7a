//! Storage errors

use crate::journal::Txid;
use crate::transaction::TransactionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Transaction error: {0}")]
    Transaction(#[from] TransactionError),

    /// Checkpoint image failed its checksum
    #[error("Checkpoint at txid {txid} failed checksum validation")]
    ChecksumMismatch { txid: Txid },

    /// Stored data cannot be interpreted
    #[error("Corrupt storage: {0}")]
    Corrupt(String),

    /// A failed append could not be removed from the log at this path
    #[error("Edit log {0} is unusable until it is reopened")]
    LogFailed(String),
}
