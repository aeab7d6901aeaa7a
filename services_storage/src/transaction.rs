//! Transactions over the edit log

use core_types::new_uuid;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(Uuid);

impl TransactionId {
    pub fn new() -> Self {
        Self(new_uuid())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "tx:{}", self.0)
    }
}

/// Errors that can occur during transactions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    /// Transaction already committed or rolled back
    AlreadyFinalized,

    /// Transaction was not begun on this log
    UnknownTransaction(TransactionId),
}

impl core::fmt::Display for TransactionError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TransactionError::AlreadyFinalized => write!(f, "Transaction already finalized"),
            TransactionError::UnknownTransaction(id) => {
                write!(f, "Transaction {} is not active on this log", id)
            }
        }
    }
}

impl std::error::Error for TransactionError {}

/// Transaction state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Transaction is active
    Active,
    /// Transaction has been committed
    Committed,
    /// Transaction has been rolled back
    RolledBack,
}

/// A unit of atomic journaling
///
/// Records written inside a transaction become visible to recovery only
/// once the transaction commits.
///
/// ## Example
///
/// ```
/// use services_storage::{Transaction, TransactionState};
///
/// let mut tx = Transaction::new();
/// assert_eq!(tx.state(), TransactionState::Active);
///
/// tx.record_write().unwrap();
/// tx.commit().unwrap();
/// assert_eq!(tx.state(), TransactionState::Committed);
/// assert_eq!(tx.writes(), 1);
/// ```
#[derive(Debug)]
pub struct Transaction {
    id: TransactionId,
    state: TransactionState,
    /// Records written so far
    writes: usize,
}

impl Transaction {
    pub fn new() -> Self {
        Self {
            id: TransactionId::new(),
            state: TransactionState::Active,
            writes: 0,
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == TransactionState::Active
    }

    /// Counts one record written in this transaction
    pub fn record_write(&mut self) -> Result<(), TransactionError> {
        if !self.is_active() {
            return Err(TransactionError::AlreadyFinalized);
        }
        self.writes += 1;
        Ok(())
    }

    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn commit(&mut self) -> Result<(), TransactionError> {
        if !self.is_active() {
            return Err(TransactionError::AlreadyFinalized);
        }
        self.state = TransactionState::Committed;
        Ok(())
    }

    /// Rolls back the transaction, discarding its records
    pub fn rollback(&mut self) -> Result<(), TransactionError> {
        if !self.is_active() {
            return Err(TransactionError::AlreadyFinalized);
        }
        self.state = TransactionState::RolledBack;
        self.writes = 0;
        Ok(())
    }
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}
