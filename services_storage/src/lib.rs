//! # Storage Service
//!
//! Durability for the namespace: an edit log of committed records and a
//! checkpoint image that lets the log be truncated.
//!
//! ## Design
//!
//! - **Transactions**: every record is written inside a [`Transaction`];
//!   only records whose transaction committed survive recovery
//! - **Transaction ids**: each commit is assigned the next [`Txid`], so a
//!   checkpoint can say exactly which records it already contains
//! - **Checksums**: file-backed log lines and checkpoint images carry a
//!   CRC32; a torn or corrupt log tail is discarded on open
//! - **Failed appends**: cut back off the log file before the error is
//!   returned, so an acknowledged commit never sits behind a torn line
//! - **Backends**: in-memory logs and stores for tests and embedding,
//!   file-backed ones for restarts

pub mod checkpoint;
pub mod error;
pub mod failing_sink;
pub mod file_journal;
pub mod journal;
pub mod log_sink;
pub mod transaction;

pub use checkpoint::{CheckpointImage, CheckpointStore, FileCheckpointStore, MemoryCheckpointStore};
pub use error::StorageError;
pub use failing_sink::{FailingSink, FailurePolicy};
pub use file_journal::FileEditLog;
pub use journal::{CommittedRecord, EditLog, JournalEntry, MemoryEditLog, Txid};
pub use log_sink::LogSink;
pub use transaction::{Transaction, TransactionError, TransactionId, TransactionState};
