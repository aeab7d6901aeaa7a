//! Mutations whose journal write fails leave no trace
//!
//! Neither the live tree nor the log seen after a restart may reflect an
//! edit that was reported as failed.

use services_namespace::{Namesystem, NamesystemConfig, NamesystemError};
use services_storage::{
    CheckpointStore, CommittedRecord, EditLog, FailingSink, FailurePolicy, FileCheckpointStore,
    FileEditLog, MemoryCheckpointStore, MemoryEditLog, StorageError, Transaction, Txid,
};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::tempdir;

const UNSPECIFIED: u8 = 0;

/// In-memory log whose commits fail while `reject` is set
#[derive(Debug, Default)]
struct RejectingLog {
    inner: MemoryEditLog,
    reject: Arc<AtomicBool>,
}

impl EditLog for RejectingLog {
    fn begin(&mut self) -> Transaction {
        self.inner.begin()
    }

    fn write(&mut self, tx: &mut Transaction, payload: &str) -> Result<(), StorageError> {
        self.inner.write(tx, payload)
    }

    fn commit(&mut self, tx: &mut Transaction) -> Result<Txid, StorageError> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(io::Error::other("no space left on device").into());
        }
        self.inner.commit(tx)
    }

    fn rollback(&mut self, tx: &mut Transaction) -> Result<(), StorageError> {
        self.inner.rollback(tx)
    }

    fn committed_since(&self, after: Txid) -> Vec<CommittedRecord> {
        self.inner.committed_since(after)
    }

    fn last_txid(&self) -> Txid {
        self.inner.last_txid()
    }

    fn purge_through(&mut self, txid: Txid) -> Result<(), StorageError> {
        self.inner.purge_through(txid)
    }
}

fn policies<L: EditLog, C: CheckpointStore>(ns: &Namesystem<L, C>, path: &str) -> Vec<u8> {
    ns.list_status(path)
        .unwrap()
        .iter()
        .map(|s| s.storage_policy_id())
        .collect()
}

#[test]
fn test_rejected_commit_changes_nothing() {
    let log = RejectingLog::default();
    let reject = Arc::clone(&log.reject);
    let mut ns =
        Namesystem::open(&NamesystemConfig::default(), log, MemoryCheckpointStore::new()).unwrap();
    ns.create_file("/dir/foo", None).unwrap();
    let before = ns.last_txid();

    reject.store(true, Ordering::SeqCst);
    let err = ns.set_storage_policy("/dir/foo", "COLD").unwrap_err();
    assert!(matches!(err, NamesystemError::Storage(StorageError::Io(_))));
    assert!(ns.mkdirs("/other").is_err());

    assert_eq!(ns.last_txid(), before);
    assert_eq!(policies(&ns, "/dir"), vec![UNSPECIFIED]);
    assert!(ns.file_info("/other").is_err());

    reject.store(false, Ordering::SeqCst);
    let (log, checkpoints) = ns.into_parts();
    let ns = Namesystem::open(&NamesystemConfig::default(), log, checkpoints).unwrap();
    assert_eq!(ns.last_txid(), before);
    assert_eq!(policies(&ns, "/dir"), vec![UNSPECIFIED]);
}

#[test]
fn test_torn_commit_is_not_replayed() {
    let dir = tempdir().unwrap();
    let log_path = dir.path().join("edits.log");
    let checkpoint_path = dir.path().join("fsimage.json");
    let config = NamesystemConfig::default();

    let log = FileEditLog::open(&log_path)
        .unwrap()
        .with_sink(|file| FailingSink::new(file, FailurePolicy::Never));
    let mut ns = Namesystem::open(&config, log, FileCheckpointStore::new(&checkpoint_path)).unwrap();
    ns.create_file("/dir/foo", None).unwrap();
    let before = ns.last_txid();

    // The next edit's write lands, its commit line is torn
    let (mut log, checkpoints) = ns.into_parts();
    log.sink_mut().set_policy(FailurePolicy::TornAppendAfter(1));
    let mut ns = Namesystem::open(&config, log, checkpoints).unwrap();

    assert!(ns.set_storage_policy("/dir/foo", "COLD").is_err());
    assert_eq!(ns.last_txid(), before);
    assert_eq!(policies(&ns, "/dir"), vec![UNSPECIFIED]);

    // Later edits are acknowledged and survive a restart
    let (mut log, checkpoints) = ns.into_parts();
    log.sink_mut().set_policy(FailurePolicy::Never);
    let mut ns = Namesystem::open(&config, log, checkpoints).unwrap();
    ns.mkdirs("/later").unwrap();
    let acknowledged = ns.last_txid();
    drop(ns);

    let ns = Namesystem::open(
        &config,
        FileEditLog::open(&log_path).unwrap(),
        FileCheckpointStore::new(&checkpoint_path),
    )
    .unwrap();
    assert_eq!(ns.last_txid(), acknowledged);
    assert!(ns.file_info("/later").unwrap().is_directory());
    assert_eq!(policies(&ns, "/dir"), vec![UNSPECIFIED]);
}
