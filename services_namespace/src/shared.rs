//! A namesystem shared between threads
//!
//! Writers take the lock exclusively and so run one at a time; readers share
//! it and always observe the state between two complete mutations.

use crate::error::NamesystemError;
use crate::namesystem::Namesystem;
use crate::placement::Placement;
use core_types::{NodeId, StorageType};
use fs_view::FileStatus;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use services_storage::{CheckpointStore, EditLog, Txid};
use std::collections::BTreeSet;
use std::sync::Arc;
use storage_policy::StoragePolicy;

pub struct SharedNamesystem<L: EditLog, C: CheckpointStore> {
    inner: Arc<RwLock<Namesystem<L, C>>>,
}

impl<L: EditLog, C: CheckpointStore> Clone for SharedNamesystem<L, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L: EditLog, C: CheckpointStore> SharedNamesystem<L, C> {
    pub fn new(namesystem: Namesystem<L, C>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(namesystem)),
        }
    }

    /// Shared access for several reads against one state
    pub fn read(&self) -> RwLockReadGuard<'_, Namesystem<L, C>> {
        self.inner.read()
    }

    /// Exclusive access for a sequence of mutations
    pub fn write(&self) -> RwLockWriteGuard<'_, Namesystem<L, C>> {
        self.inner.write()
    }

    pub fn mkdirs(&self, path: &str) -> Result<NodeId, NamesystemError> {
        self.inner.write().mkdirs(path)
    }

    pub fn create_file(&self, path: &str, replication: Option<u16>) -> Result<NodeId, NamesystemError> {
        self.inner.write().create_file(path, replication)
    }

    pub fn delete(&self, path: &str, recursive: bool) -> Result<bool, NamesystemError> {
        self.inner.write().delete(path, recursive)
    }

    pub fn set_storage_policy(&self, path: &str, policy_name: &str) -> Result<(), NamesystemError> {
        self.inner.write().set_storage_policy(path, policy_name)
    }

    pub fn create_snapshot(&self, path: &str, name: &str) -> Result<String, NamesystemError> {
        self.inner.write().create_snapshot(path, name)
    }

    pub fn delete_snapshot(&self, path: &str, name: &str) -> Result<(), NamesystemError> {
        self.inner.write().delete_snapshot(path, name)
    }

    pub fn save_namespace(&self) -> Result<Txid, NamesystemError> {
        self.inner.write().save_namespace()
    }

    pub fn storage_policies(&self) -> Vec<StoragePolicy> {
        self.inner.read().storage_policies()
    }

    pub fn list_status(&self, path: &str) -> Result<Vec<FileStatus>, NamesystemError> {
        self.inner.read().list_status(path)
    }

    pub fn file_info(&self, path: &str) -> Result<FileStatus, NamesystemError> {
        self.inner.read().file_info(path)
    }

    pub fn placement(
        &self,
        path: &str,
        unavailable: &BTreeSet<StorageType>,
    ) -> Result<Placement, NamesystemError> {
        self.inner.read().placement(path, unavailable)
    }

    /// Unwraps the namesystem once no other handle is left
    pub fn try_into_inner(self) -> Result<Namesystem<L, C>, Self> {
        Arc::try_unwrap(self.inner)
            .map(RwLock::into_inner)
            .map_err(|inner| Self { inner })
    }
}
