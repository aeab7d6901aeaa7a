//! Edit log with crash-consistent recovery
//!
//! The log is a sequence of [`JournalEntry`] values. A transaction appends
//! one `Write` per record and then a `Commit` carrying the next [`Txid`].
//! Recovery only ever returns records whose commit made it into the log;
//! writes of transactions that rolled back or never committed are skipped.

use crate::error::StorageError;
use crate::transaction::{Transaction, TransactionError, TransactionId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Sequence number assigned to each committed transaction, starting at 1
pub type Txid = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "entry", rename_all = "snake_case")]
pub enum JournalEntry {
    Write {
        tx_id: TransactionId,
        payload: String,
    },
    Commit {
        tx_id: TransactionId,
        txid: Txid,
    },
    /// Every transaction up to `txid` has been folded into a checkpoint
    Checkpoint { txid: Txid },
}

/// Payloads of one committed transaction, in write order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedRecord {
    pub txid: Txid,
    pub payloads: Vec<String>,
}

/// Trait for durable, transactional record logs
pub trait EditLog {
    /// Begins a new transaction
    fn begin(&mut self) -> Transaction;

    /// Appends a record to an active transaction
    fn write(&mut self, tx: &mut Transaction, payload: &str) -> Result<(), StorageError>;

    /// Commits a transaction and returns its txid
    ///
    /// Once this returns, the transaction's records survive a restart.
    fn commit(&mut self, tx: &mut Transaction) -> Result<Txid, StorageError>;

    /// Abandons a transaction; its records are never replayed
    fn rollback(&mut self, tx: &mut Transaction) -> Result<(), StorageError>;

    /// Committed transactions with a txid above `after`, in commit order
    fn committed_since(&self, after: Txid) -> Vec<CommittedRecord>;

    /// Txid of the newest commit or checkpoint, 0 for a fresh log
    fn last_txid(&self) -> Txid;

    /// Drops every transaction committed at or below `txid`
    ///
    /// Later commits keep counting up from the current txid.
    fn purge_through(&mut self, txid: Txid) -> Result<(), StorageError>;
}

/// In-memory edit log
#[derive(Debug, Clone, Default)]
pub struct MemoryEditLog {
    entries: Vec<JournalEntry>,
    last_txid: Txid,
    active: BTreeSet<TransactionId>,
}

impl MemoryEditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconstructs a log from persisted entries
    ///
    /// Transactions that were active when the entries were captured are
    /// treated as abandoned.
    pub fn from_entries(entries: Vec<JournalEntry>) -> Self {
        let mut log = Self::new();
        log.replace_entries(entries);
        log
    }

    /// Returns the journal entries (for testing).
    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    pub(crate) fn check_active(&self, tx: &Transaction) -> Result<(), TransactionError> {
        if !tx.is_active() {
            return Err(TransactionError::AlreadyFinalized);
        }
        if !self.active.contains(&tx.id()) {
            return Err(TransactionError::UnknownTransaction(tx.id()));
        }
        Ok(())
    }

    pub(crate) fn register(&mut self, tx: &Transaction) {
        self.active.insert(tx.id());
    }

    /// Forgets `tx_id` and drops the records it wrote
    pub(crate) fn discard(&mut self, tx_id: TransactionId) {
        self.active.remove(&tx_id);
        self.entries.retain(|entry| {
            !matches!(entry, JournalEntry::Write { tx_id: id, .. } if *id == tx_id)
        });
    }

    /// Builds the entry that records `payload` for `tx`
    pub(crate) fn write_entry(
        &self,
        tx: &Transaction,
        payload: &str,
    ) -> Result<JournalEntry, TransactionError> {
        self.check_active(tx)?;
        Ok(JournalEntry::Write {
            tx_id: tx.id(),
            payload: payload.to_string(),
        })
    }

    /// Builds the entry that commits `tx` with the next txid
    pub(crate) fn commit_entry(&self, tx: &Transaction) -> Result<JournalEntry, TransactionError> {
        self.check_active(tx)?;
        Ok(JournalEntry::Commit {
            tx_id: tx.id(),
            txid: self.last_txid + 1,
        })
    }

    /// Appends an entry that has already been made durable
    pub(crate) fn record(&mut self, entry: JournalEntry) {
        match &entry {
            JournalEntry::Write { .. } => {}
            JournalEntry::Commit { tx_id, txid } => {
                self.active.remove(tx_id);
                self.last_txid = self.last_txid.max(*txid);
            }
            JournalEntry::Checkpoint { txid } => {
                self.last_txid = self.last_txid.max(*txid);
            }
        }
        self.entries.push(entry);
    }

    /// Entries left after purging everything committed at or below `through`
    pub(crate) fn purged_entries(&self, through: Txid) -> Vec<JournalEntry> {
        let commits: BTreeMap<TransactionId, Txid> = self
            .entries
            .iter()
            .filter_map(|entry| match entry {
                JournalEntry::Commit { tx_id, txid } => Some((*tx_id, *txid)),
                _ => None,
            })
            .collect();

        let checkpoint = self
            .entries
            .iter()
            .filter_map(|entry| match entry {
                JournalEntry::Checkpoint { txid } => Some(*txid),
                _ => None,
            })
            .fold(through, Txid::max);

        let mut kept = vec![JournalEntry::Checkpoint { txid: checkpoint }];
        kept.extend(
            self.entries
                .iter()
                .filter(|entry| match entry {
                    JournalEntry::Write { tx_id, .. } => match commits.get(tx_id) {
                        Some(txid) => *txid > through,
                        None => self.active.contains(tx_id),
                    },
                    JournalEntry::Commit { txid, .. } => *txid > through,
                    JournalEntry::Checkpoint { .. } => false,
                })
                .cloned(),
        );
        kept
    }

    pub(crate) fn replace_entries(&mut self, entries: Vec<JournalEntry>) {
        self.entries = Vec::with_capacity(entries.len());
        for entry in entries {
            self.record(entry);
        }
    }
}

impl EditLog for MemoryEditLog {
    fn begin(&mut self) -> Transaction {
        let tx = Transaction::new();
        self.register(&tx);
        tx
    }

    fn write(&mut self, tx: &mut Transaction, payload: &str) -> Result<(), StorageError> {
        let entry = self.write_entry(tx, payload)?;
        self.record(entry);
        tx.record_write()?;
        Ok(())
    }

    fn commit(&mut self, tx: &mut Transaction) -> Result<Txid, StorageError> {
        let entry = self.commit_entry(tx)?;
        self.record(entry);
        tx.commit()?;
        Ok(self.last_txid)
    }

    fn rollback(&mut self, tx: &mut Transaction) -> Result<(), StorageError> {
        self.check_active(tx)?;
        tx.rollback()?;
        self.discard(tx.id());
        Ok(())
    }

    fn committed_since(&self, after: Txid) -> Vec<CommittedRecord> {
        let mut writes: BTreeMap<TransactionId, Vec<String>> = BTreeMap::new();
        let mut records = Vec::new();

        for entry in &self.entries {
            match entry {
                JournalEntry::Write { tx_id, payload } => {
                    writes.entry(*tx_id).or_default().push(payload.clone());
                }
                JournalEntry::Commit { tx_id, txid } => {
                    let payloads = writes.remove(tx_id).unwrap_or_default();
                    if *txid > after {
                        records.push(CommittedRecord {
                            txid: *txid,
                            payloads,
                        });
                    }
                }
                JournalEntry::Checkpoint { .. } => {}
            }
        }

        records
    }

    fn last_txid(&self) -> Txid {
        self.last_txid
    }

    fn purge_through(&mut self, txid: Txid) -> Result<(), StorageError> {
        let kept = self.purged_entries(txid);
        self.replace_entries(kept);
        Ok(())
    }
}
