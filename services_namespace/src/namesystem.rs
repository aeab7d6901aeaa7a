//! The namesystem: policy suite, namespace tree and durability in one place

use crate::config::NamesystemConfig;
use crate::error::NamesystemError;
use crate::placement::Placement;
use core_types::{NodeId, StorageType};
use fs_view::{
    FileStatus, Namespace, NamespaceError, NamespaceImage, NamespaceOp, PathResolver,
    PreparedOp, Snapshot, SNAPSHOT_DIR,
};
use services_storage::{
    CheckpointImage, CheckpointStore, EditLog, FileCheckpointStore, FileEditLog,
    MemoryCheckpointStore, MemoryEditLog, StorageError, Txid,
};
use std::collections::BTreeSet;
use std::fs;
use std::sync::Arc;
use storage_policy::{PolicySuite, StoragePolicy};
use tracing::{debug, info, warn};

/// Namesystem backed by in-memory storage
pub type MemoryNamesystem = Namesystem<MemoryEditLog, MemoryCheckpointStore>;
/// Namesystem backed by files in the configured storage directory
pub type FileNamesystem = Namesystem<FileEditLog, FileCheckpointStore>;

/// Namespace tree with journaled mutations and a shared policy suite
///
/// Mutating calls take `&mut self`, reads take `&self`. Wrap the namesystem
/// in a [`crate::SharedNamesystem`] to serve concurrent readers.
#[derive(Debug)]
pub struct Namesystem<L: EditLog, C: CheckpointStore> {
    namespace: Namespace,
    suite: Arc<PolicySuite>,
    default_replication: u16,
    log: L,
    checkpoints: C,
    /// Txid of the last edit reflected in `namespace`
    last_applied: Txid,
}

impl MemoryNamesystem {
    /// Creates an empty namesystem with in-memory storage
    pub fn in_memory(config: &NamesystemConfig) -> Result<Self, NamesystemError> {
        Self::open(config, MemoryEditLog::new(), MemoryCheckpointStore::new())
    }
}

impl FileNamesystem {
    /// Opens the namesystem stored in `config.storage_dir`, creating it if
    /// the directory is empty
    pub fn open_dir(config: &NamesystemConfig) -> Result<Self, NamesystemError> {
        let (Some(dir), Some(log_path), Some(checkpoint_path)) = (
            config.storage_dir.as_ref(),
            config.edit_log_path(),
            config.checkpoint_path(),
        ) else {
            return Err(NamesystemError::Config(
                "storage_dir is required for a file-backed namesystem".to_string(),
            ));
        };
        fs::create_dir_all(dir).map_err(StorageError::from)?;

        let log = FileEditLog::open(log_path)?;
        let checkpoints = FileCheckpointStore::new(checkpoint_path);
        Self::open(config, log, checkpoints)
    }
}

impl<L: EditLog, C: CheckpointStore> Namesystem<L, C> {
    /// Loads the suite, then rebuilds the namespace from storage
    ///
    /// Starts from the checkpoint image if there is one and replays every
    /// committed edit with a txid above the image's.
    pub fn open(config: &NamesystemConfig, mut log: L, checkpoints: C) -> Result<Self, NamesystemError> {
        config.validate()?;
        let suite = Arc::new(PolicySuite::load(&config.policies)?);

        let (mut namespace, image_txid) = match checkpoints.load()? {
            Some(image) => {
                let payload: NamespaceImage =
                    serde_json::from_str(&image.payload).map_err(StorageError::from)?;
                (Namespace::from_image(payload)?, image.txid)
            }
            None => (Namespace::new(), 0),
        };

        // A log older than the image must not hand out txids the image covers
        if log.last_txid() < image_txid {
            warn!(
                log_txid = log.last_txid(),
                image_txid, "edit log is behind the checkpoint"
            );
            log.purge_through(image_txid)?;
        }

        let records = log.committed_since(image_txid);
        let mut last_applied = image_txid;
        for record in &records {
            for payload in &record.payloads {
                let op: NamespaceOp = serde_json::from_str(payload).map_err(|e| {
                    StorageError::Corrupt(format!("edit at txid {}: {}", record.txid, e))
                })?;
                namespace.apply(&op).map_err(|e| {
                    NamespaceError::CorruptImage(format!("replaying txid {}: {}", record.txid, e))
                })?;
            }
            last_applied = record.txid;
        }

        info!(
            image_txid,
            replayed = records.len(),
            last_txid = last_applied,
            policies = suite.policies().count(),
            "namesystem opened"
        );

        Ok(Self {
            namespace,
            suite,
            default_replication: config.default_replication,
            log,
            checkpoints,
            last_applied,
        })
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn suite(&self) -> &Arc<PolicySuite> {
        &self.suite
    }

    pub fn last_txid(&self) -> Txid {
        self.last_applied
    }

    /// Hands back the storage backends, e.g. to reopen after a restart
    pub fn into_parts(self) -> (L, C) {
        (self.log, self.checkpoints)
    }

    /// Journals a validated operation, then applies it
    fn commit(&mut self, op: &NamespaceOp, prepared: PreparedOp) -> Result<NodeId, NamesystemError> {
        let payload = serde_json::to_string(op).map_err(StorageError::from)?;

        let mut tx = self.log.begin();
        let journaled = self
            .log
            .write(&mut tx, &payload)
            .and_then(|()| self.log.commit(&mut tx));
        let txid = match journaled {
            Ok(txid) => txid,
            Err(err) => {
                if tx.is_active() {
                    if let Err(rollback_err) = self.log.rollback(&mut tx) {
                        warn!(error = %rollback_err, "failed to roll back journal transaction");
                    }
                }
                return Err(err.into());
            }
        };

        let node = self.namespace.execute(prepared);
        self.last_applied = txid;
        debug!(txid, path = op.path(), node = %node, "applied namespace edit");
        Ok(node)
    }

    fn apply(&mut self, op: NamespaceOp) -> Result<NodeId, NamesystemError> {
        let prepared = self.namespace.prepare(&op)?;
        self.commit(&op, prepared)
    }

    /// Creates a directory and any missing ancestors
    pub fn mkdirs(&mut self, path: &str) -> Result<NodeId, NamesystemError> {
        self.apply(NamespaceOp::Mkdirs {
            path: path.to_string(),
        })
    }

    /// Creates a file, creating missing parent directories
    ///
    /// Without a `replication` factor the configured default is used.
    pub fn create_file(
        &mut self,
        path: &str,
        replication: Option<u16>,
    ) -> Result<NodeId, NamesystemError> {
        self.apply(NamespaceOp::CreateFile {
            path: path.to_string(),
            replication: replication.unwrap_or(self.default_replication),
        })
    }

    /// Deletes a file or directory
    ///
    /// Returns `false` if nothing exists at `path`.
    pub fn delete(&mut self, path: &str, recursive: bool) -> Result<bool, NamesystemError> {
        let op = NamespaceOp::Delete {
            path: path.to_string(),
            recursive,
        };
        match self.namespace.prepare(&op) {
            Ok(prepared) => self.commit(&op, prepared).map(|_| true),
            Err(NamespaceError::PathNotFound(_)) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Sets the explicit storage policy of one node, by policy name
    ///
    /// Descendants are not touched; those without their own policy inherit
    /// the new one.
    pub fn set_storage_policy(&mut self, path: &str, policy_name: &str) -> Result<(), NamesystemError> {
        let policy_id = self.suite.policy_by_name(policy_name)?.id();
        self.apply(NamespaceOp::SetStoragePolicy {
            path: path.to_string(),
            policy_id,
        })?;
        info!(path, policy = policy_name, policy_id = policy_id.as_u8(), "set storage policy");
        Ok(())
    }

    /// Every policy in the suite, in id order
    pub fn storage_policies(&self) -> Vec<StoragePolicy> {
        self.suite.policies().cloned().collect()
    }

    /// Lists a directory, or returns the entry of a file
    pub fn list_status(&self, path: &str) -> Result<Vec<FileStatus>, NamesystemError> {
        Ok(self.namespace.list(path)?)
    }

    pub fn file_info(&self, path: &str) -> Result<FileStatus, NamesystemError> {
        Ok(self.namespace.file_info(path)?)
    }

    /// Takes a snapshot of a directory and returns the snapshot's path
    pub fn create_snapshot(&mut self, path: &str, name: &str) -> Result<String, NamesystemError> {
        self.apply(NamespaceOp::CreateSnapshot {
            path: path.to_string(),
            name: name.to_string(),
        })?;
        info!(path, snapshot = name, "created snapshot");
        Ok(PathResolver::join(&PathResolver::join(path, SNAPSHOT_DIR), name))
    }

    pub fn delete_snapshot(&mut self, path: &str, name: &str) -> Result<(), NamesystemError> {
        self.apply(NamespaceOp::DeleteSnapshot {
            path: path.to_string(),
            name: name.to_string(),
        })?;
        info!(path, snapshot = name, "deleted snapshot");
        Ok(())
    }

    /// Snapshots of a directory, in name order
    pub fn snapshots(&self, path: &str) -> Result<Vec<Snapshot>, NamesystemError> {
        Ok(self
            .namespace
            .snapshots_of(path)?
            .into_iter()
            .cloned()
            .collect())
    }

    /// Status of `subpath` as captured by snapshot `name` of directory `path`
    pub fn resolve_in_snapshot(
        &self,
        path: &str,
        name: &str,
        subpath: &str,
    ) -> Result<FileStatus, NamesystemError> {
        let resolved = self.namespace.resolve_in_snapshot(path, name, subpath)?;
        Ok(self.namespace.status_of(&resolved))
    }

    /// Chooses media for the replicas of the file at `path`
    ///
    /// For a directory, chooses for a new file with the default
    /// replication.
    pub fn placement(
        &self,
        path: &str,
        unavailable: &BTreeSet<StorageType>,
    ) -> Result<Placement, NamesystemError> {
        let status = self.namespace.file_info(path)?;
        let replication = if status.is_directory() {
            self.default_replication
        } else {
            status.replication
        };
        Ok(Placement::resolve(
            &self.suite,
            status.storage_policy,
            replication,
            unavailable,
        ))
    }

    /// Writes a checkpoint image and drops the edits it covers
    ///
    /// Returns the txid the image was taken at.
    pub fn save_namespace(&mut self) -> Result<Txid, NamesystemError> {
        let txid = self.last_applied;
        let payload = serde_json::to_string(&self.namespace.to_image()).map_err(StorageError::from)?;
        self.checkpoints.save(&CheckpointImage::new(txid, payload))?;
        self.log.purge_through(txid)?;
        info!(txid, nodes = self.namespace.retained_nodes(), "saved namespace");
        Ok(txid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage_policy::PolicyId;

    fn namesystem() -> MemoryNamesystem {
        MemoryNamesystem::in_memory(&NamesystemConfig::default()).unwrap()
    }

    #[test]
    fn test_unknown_policy_name() {
        let mut ns = namesystem();
        ns.create_file("/foo", None).unwrap();
        let err = ns.set_storage_policy("/foo", "INVALID-POLICY").unwrap_err();
        assert!(matches!(err, NamesystemError::UnknownPolicyName(_)));
        assert!(err.to_string().contains("INVALID-POLICY"));
    }

    #[test]
    fn test_missing_path() {
        let mut ns = namesystem();
        let err = ns.set_storage_policy("/invalidPath", "WARM").unwrap_err();
        assert!(matches!(err, NamesystemError::PathNotFound(_)));
        assert!(err.to_string().contains("/invalidPath"));
    }

    #[test]
    fn test_failed_mutation_is_not_journaled() {
        let mut ns = namesystem();
        ns.create_file("/foo", None).unwrap();
        let before = ns.last_txid();

        assert!(ns.set_storage_policy("/nope", "COLD").is_err());
        assert!(ns.set_storage_policy("/foo", "LUKEWARM").is_err());
        assert!(ns.create_file("/foo", None).is_err());
        assert_eq!(ns.last_txid(), before);

        let (log, _) = ns.into_parts();
        assert_eq!(log.committed_since(0).len(), 1);
    }

    #[test]
    fn test_delete_missing_returns_false() {
        let mut ns = namesystem();
        assert!(!ns.delete("/absent", true).unwrap());
        ns.create_file("/present", Some(1)).unwrap();
        assert!(ns.delete("/present", false).unwrap());
        assert!(ns.list_status("/").unwrap().is_empty());
    }

    #[test]
    fn test_default_replication_applies() {
        let mut ns = namesystem();
        ns.create_file("/a", None).unwrap();
        ns.create_file("/b", Some(5)).unwrap();
        assert_eq!(ns.file_info("/a").unwrap().replication, 3);
        assert_eq!(ns.file_info("/b").unwrap().replication, 5);
    }

    #[test]
    fn test_storage_policies_listing() {
        let ns = namesystem();
        let names: Vec<String> = ns
            .storage_policies()
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(names, vec!["COLD", "WARM", "HOT"]);
    }

    #[test]
    fn test_placement_defaults_only_there() {
        let mut ns = namesystem();
        ns.create_file("/dir/f", Some(2)).unwrap();

        let status = ns.file_info("/dir/f").unwrap();
        assert_eq!(status.storage_policy, PolicyId::UNSPECIFIED);

        let placement = ns.placement("/dir/f", &BTreeSet::new()).unwrap();
        assert!(placement.defaulted);
        assert_eq!(placement.storage_types, vec![StorageType::Disk; 2]);

        ns.set_storage_policy("/dir", "cold").unwrap();
        let placement = ns.placement("/dir/f", &BTreeSet::new()).unwrap();
        assert_eq!(placement.policy_name, "COLD");
        assert_eq!(placement.storage_types, vec![StorageType::Archive; 2]);
    }

    #[test]
    fn test_create_snapshot_returns_path() {
        let mut ns = namesystem();
        ns.mkdirs("/dir").unwrap();
        assert_eq!(ns.create_snapshot("/dir", "s1").unwrap(), "/dir/.snapshot/s1");
        assert_eq!(ns.create_snapshot("/", "s0").unwrap(), "/.snapshot/s0");
        assert_eq!(ns.snapshots("/dir").unwrap().len(), 1);
    }

    #[test]
    fn test_malformed_policy_table_is_fatal() {
        let mut config = NamesystemConfig::default();
        config.policies.policies.clear();
        assert!(matches!(
            MemoryNamesystem::in_memory(&config),
            Err(NamesystemError::MalformedPolicyConfiguration(_))
        ));

        let mut config = NamesystemConfig::default();
        config.policies.default_policy = None;
        assert!(matches!(
            MemoryNamesystem::in_memory(&config),
            Err(NamesystemError::MalformedPolicyConfiguration(_))
        ));
    }

    #[test]
    fn test_undecodable_edit_is_corrupt() {
        let mut log = MemoryEditLog::new();
        let mut tx = log.begin();
        log.write(&mut tx, "not an edit").unwrap();
        log.commit(&mut tx).unwrap();

        let result =
            MemoryNamesystem::open(&NamesystemConfig::default(), log, MemoryCheckpointStore::new());
        assert!(matches!(
            result,
            Err(NamesystemError::Storage(StorageError::Corrupt(_)))
        ));
    }

    #[test]
    fn test_open_dir_requires_storage_dir() {
        assert!(matches!(
            FileNamesystem::open_dir(&NamesystemConfig::default()),
            Err(NamesystemError::Config(_))
        ));
    }
}
