//! File-backed edit log
//!
//! One entry per line, framed as `<crc32 hex> <json>`. Every append is
//! synced before the in-memory log is updated, so an entry that is visible
//! is also durable. An append that fails is cut back off the file before the
//! error is returned; if even that fails, the log refuses further appends
//! until it is reopened or purged. On open, the log is read up to the first
//! line that is torn or fails its checksum; that tail is cut off.

use crate::error::StorageError;
use crate::journal::{CommittedRecord, EditLog, JournalEntry, MemoryEditLog, Txid};
use crate::log_sink::LogSink;
use crate::transaction::Transaction;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

#[derive(Debug)]
pub struct FileEditLog<S: LogSink = File> {
    path: PathBuf,
    sink: S,
    inner: MemoryEditLog,
    /// Set when a failed append could not be cut off again
    failed: bool,
}

impl FileEditLog {
    /// Opens the log at `path`, creating an empty one if needed
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let (entries, valid_len, total_len) = if path.exists() {
            read_entries(&path)?
        } else {
            (Vec::new(), 0, 0)
        };

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        if valid_len < total_len {
            warn!(
                path = %path.display(),
                discarded_bytes = total_len - valid_len,
                "discarding torn edit log tail"
            );
            file.set_len(valid_len)?;
            file.sync_all()?;
        }

        let inner = MemoryEditLog::from_entries(entries);
        debug!(
            path = %path.display(),
            entries = inner.entries().len(),
            last_txid = inner.last_txid(),
            "opened edit log"
        );
        Ok(Self {
            path,
            sink: file,
            inner,
            failed: false,
        })
    }
}

impl<S: LogSink> FileEditLog<S> {
    /// Routes appends through `wrap(sink)`
    pub fn with_sink<T: LogSink>(self, wrap: impl FnOnce(S) -> T) -> FileEditLog<T> {
        FileEditLog {
            path: self.path,
            sink: wrap(self.sink),
            inner: self.inner,
            failed: self.failed,
        }
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[JournalEntry] {
        self.inner.entries()
    }

    /// Returns true if a failed append is still on disk
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    fn persist(&mut self, entry: &JournalEntry) -> Result<(), StorageError> {
        if self.failed {
            return Err(StorageError::LogFailed(self.path.display().to_string()));
        }
        let line = encode_line(entry)?;
        let start = self.sink.size()?;

        let appended = self
            .sink
            .append(line.as_bytes())
            .and_then(|()| self.sink.sync());
        if let Err(err) = appended {
            let restored = self.sink.truncate(start).and_then(|()| self.sink.sync());
            match restored {
                Ok(()) => warn!(path = %self.path.display(), error = %err, "edit log append failed"),
                Err(truncate_err) => {
                    error!(
                        path = %self.path.display(),
                        error = %err,
                        truncate_error = %truncate_err,
                        "cannot cut failed append off the edit log"
                    );
                    self.failed = true;
                }
            }
            return Err(err.into());
        }
        Ok(())
    }
}

impl<S: LogSink> EditLog for FileEditLog<S> {
    fn begin(&mut self) -> Transaction {
        self.inner.begin()
    }

    fn write(&mut self, tx: &mut Transaction, payload: &str) -> Result<(), StorageError> {
        let entry = self.inner.write_entry(tx, payload)?;
        self.persist(&entry)?;
        self.inner.record(entry);
        tx.record_write()?;
        Ok(())
    }

    fn commit(&mut self, tx: &mut Transaction) -> Result<Txid, StorageError> {
        let entry = self.inner.commit_entry(tx)?;
        self.persist(&entry)?;
        self.inner.record(entry);
        tx.commit()?;
        Ok(self.inner.last_txid())
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
        let kept = self.inner.purged_entries(txid);

        let tmp = self.path.with_extension("tmp");
        {
            let mut out = File::create(&tmp)?;
            for entry in &kept {
                out.write_all(encode_line(entry)?.as_bytes())?;
            }
            out.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        self.sink.reopen(&self.path)?;
        self.failed = false;

        debug!(
            path = %self.path.display(),
            through = txid,
            remaining = kept.len(),
            "purged edit log"
        );
        self.inner.replace_entries(kept);
        Ok(())
    }
}

fn encode_line(entry: &JournalEntry) -> Result<String, StorageError> {
    let json = serde_json::to_string(entry)?;
    Ok(format!("{:08x} {}\n", crc32fast::hash(json.as_bytes()), json))
}

fn decode_line(line: &str) -> Option<JournalEntry> {
    let (checksum, json) = line.split_once(' ')?;
    let checksum = u32::from_str_radix(checksum, 16).ok()?;
    if crc32fast::hash(json.as_bytes()) != checksum {
        return None;
    }
    serde_json::from_str(json).ok()
}

/// Reads every intact entry, returning them with the byte length they span
/// and the total file length
fn read_entries(path: &Path) -> Result<(Vec<JournalEntry>, u64, u64), StorageError> {
    let contents = fs::read(path)?;
    let mut entries = Vec::new();
    let mut valid_len = 0usize;

    for line in contents.split_inclusive(|&b| b == b'\n') {
        let Some(body) = line.strip_suffix(b"\n") else {
            break;
        };
        let Some(entry) = std::str::from_utf8(body).ok().and_then(decode_line) else {
            break;
        };
        entries.push(entry);
        valid_len += line.len();
    }

    Ok((entries, valid_len as u64, contents.len() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failing_sink::{FailingSink, FailurePolicy};
    use tempfile::tempdir;

    fn commit_one<S: LogSink>(log: &mut FileEditLog<S>, payload: &str) -> Txid {
        let mut tx = log.begin();
        log.write(&mut tx, payload).unwrap();
        log.commit(&mut tx).unwrap()
    }

    #[test]
    fn test_persistence_across_open() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("edits.log");
        {
            let mut log = FileEditLog::open(&path).unwrap();
            commit_one(&mut log, "one");
            commit_one(&mut log, "two");
        }

        let log = FileEditLog::open(&path).unwrap();
        assert_eq!(log.last_txid(), 2);
        let payloads: Vec<String> = log
            .committed_since(0)
            .into_iter()
            .flat_map(|r| r.payloads)
            .collect();
        assert_eq!(payloads, vec!["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn test_uncommitted_write_not_recovered() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("edits.log");
        {
            let mut log = FileEditLog::open(&path).unwrap();
            commit_one(&mut log, "kept");
            let mut tx = log.begin();
            log.write(&mut tx, "lost").unwrap();
            // Crash before commit
        }

        let log = FileEditLog::open(&path).unwrap();
        let records = log.committed_since(0);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].payloads, vec!["kept".to_string()]);
    }

    #[test]
    fn test_torn_tail_discarded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("edits.log");
        {
            let mut log = FileEditLog::open(&path).unwrap();
            commit_one(&mut log, "kept");
        }
        let intact = fs::metadata(&path).unwrap().len();
        {
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            file.write_all(b"0000abcd {\"entry\":\"comm").unwrap();
        }

        let mut log = FileEditLog::open(&path).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().len(), intact);
        assert_eq!(log.last_txid(), 1);

        // Appends continue cleanly after the cut
        assert_eq!(commit_one(&mut log, "next"), 2);
        let reopened = FileEditLog::open(&path).unwrap();
        assert_eq!(reopened.committed_since(0).len(), 2);
    }

    #[test]
    fn test_checksum_mismatch_ends_log() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("edits.log");
        {
            let mut log = FileEditLog::open(&path).unwrap();
            commit_one(&mut log, "first");
            commit_one(&mut log, "second");
        }
        let text = fs::read_to_string(&path).unwrap();
        fs::write(&path, text.replacen("second", "SECOND", 1)).unwrap();

        let log = FileEditLog::open(&path).unwrap();
        // The corrupted write is dropped along with everything after it
        assert_eq!(log.last_txid(), 1);
        assert_eq!(log.committed_since(0).len(), 1);
    }

    #[test]
    fn test_purge_rewrites_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("edits.log");
        {
            let mut log = FileEditLog::open(&path).unwrap();
            commit_one(&mut log, "a");
            commit_one(&mut log, "b");
            log.purge_through(2).unwrap();
            commit_one(&mut log, "c");
        }

        let log = FileEditLog::open(&path).unwrap();
        assert_eq!(log.last_txid(), 3);
        let records = log.committed_since(0);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].txid, 3);
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_torn_append_is_cut_before_later_commits() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("edits.log");
        let mut log = FileEditLog::open(&path)
            .unwrap()
            .with_sink(|file| FailingSink::new(file, FailurePolicy::Never));
        commit_one(&mut log, "a");
        let intact = fs::metadata(&path).unwrap().len();

        log.sink_mut().set_policy(FailurePolicy::TornAppendAfter(0));
        let mut tx = log.begin();
        assert!(matches!(log.write(&mut tx, "lost"), Err(StorageError::Io(_))));
        assert_eq!(fs::metadata(&path).unwrap().len(), intact);
        log.rollback(&mut tx).unwrap();

        log.sink_mut().set_policy(FailurePolicy::Never);
        assert_eq!(commit_one(&mut log, "b"), 2);
        drop(log);

        let reopened = FileEditLog::open(&path).unwrap();
        assert_eq!(reopened.last_txid(), 2);
        let payloads: Vec<String> = reopened
            .committed_since(0)
            .into_iter()
            .flat_map(|r| r.payloads)
            .collect();
        assert_eq!(payloads, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_failed_sync_leaves_no_commit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("edits.log");
        let mut log = FileEditLog::open(&path)
            .unwrap()
            .with_sink(|file| FailingSink::new(file, FailurePolicy::Never));
        commit_one(&mut log, "a");

        let mut tx = log.begin();
        log.write(&mut tx, "unsynced").unwrap();
        log.sink_mut().set_policy(FailurePolicy::SyncAfter(0));
        assert!(log.commit(&mut tx).is_err());
        assert_eq!(log.last_txid(), 1);
        // The cut could not be synced either
        assert!(log.is_failed());
        log.rollback(&mut tx).unwrap();
        drop(log);

        let reopened = FileEditLog::open(&path).unwrap();
        assert_eq!(reopened.last_txid(), 1);
        assert_eq!(reopened.committed_since(0).len(), 1);
    }

    #[test]
    fn test_uncut_failure_blocks_appends_until_purge() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("edits.log");
        let mut log = FileEditLog::open(&path).unwrap().with_sink(|file| {
            FailingSink::new(file, FailurePolicy::TornAppendAfter(2)).with_failing_truncate()
        });
        commit_one(&mut log, "a");

        let mut tx = log.begin();
        assert!(log.write(&mut tx, "torn").is_err());
        log.rollback(&mut tx).unwrap();
        assert!(log.is_failed());

        log.sink_mut().set_policy(FailurePolicy::Never);
        let mut tx = log.begin();
        assert!(matches!(
            log.write(&mut tx, "refused"),
            Err(StorageError::LogFailed(_))
        ));
        log.rollback(&mut tx).unwrap();

        // Rewriting the file drops the torn fragment
        log.purge_through(0).unwrap();
        assert!(!log.is_failed());
        assert_eq!(commit_one(&mut log, "b"), 2);
        drop(log);

        let reopened = FileEditLog::open(&path).unwrap();
        assert_eq!(reopened.last_txid(), 2);
        assert_eq!(reopened.committed_since(0).len(), 2);
    }

    #[test]
    fn test_decode_line_rejects_bad_frames() {
        assert!(decode_line("not-hex {}").is_none());
        assert!(decode_line("nospace").is_none());
        let good = encode_line(&JournalEntry::Checkpoint { txid: 1 }).unwrap();
        assert!(decode_line(good.trim_end()).is_some());
    }
}
