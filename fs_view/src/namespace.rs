//! The namespace tree
//!
//! All nodes live in one arena keyed by [`NodeId`]. Directories own their
//! children by id; children point back at their parent by id. Every node's
//! state sits in a [`VersionedNode`] cell, so the live tree and all
//! snapshots share unchanged states and diverge only where the live tree has
//! been written since.
//!
//! Mutations go through [`NamespaceOp`]: [`Namespace::prepare`] validates an
//! operation without touching the tree, [`Namespace::execute`] applies it
//! and cannot fail. A caller that must record the operation durably does so
//! between the two steps.

use crate::error::NamespaceError;
use crate::node::{Epoch, NodeState, VersionedNode};
use crate::ops::{NamespaceOp, PreparedOp};
use crate::path::{PathError, PathResolver, SNAPSHOT_DIR};
use crate::snapshot::{Layer, Snapshot, SnapshotManager};
use crate::status::{FileKind, FileStatus};
use core_types::NodeId;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use storage_policy::PolicyId;

/// Outcome of resolving a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// A node, as seen by the live tree or by a snapshot
    Node {
        id: NodeId,
        layer: Layer,
        state: Arc<NodeState>,
    },
    /// The `.snapshot` directory of `dir`, listing its snapshots
    SnapshotDir { dir: NodeId },
}

/// Hierarchical namespace with explicit per-node storage policies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    pub(crate) nodes: BTreeMap<NodeId, VersionedNode>,
    pub(crate) snapshots: SnapshotManager,
    pub(crate) epoch: Epoch,
    pub(crate) next_id: NodeId,
}

impl Namespace {
    /// Creates a namespace holding only the root directory
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(
            NodeId::ROOT,
            VersionedNode::new(0, NodeState::directory("", None)),
        );
        Self {
            nodes,
            snapshots: SnapshotManager::new(),
            epoch: 0,
            next_id: NodeId::ROOT.next(),
        }
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn snapshots(&self) -> &SnapshotManager {
        &self.snapshots
    }

    /// Number of node cells retained, including nodes kept only for snapshots
    pub fn retained_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Returns a node's state as seen through `layer`
    pub fn state(&self, id: NodeId, layer: Layer) -> Option<&Arc<NodeState>> {
        let cell = self.nodes.get(&id)?;
        match layer {
            Layer::Live => cell.current(),
            Layer::Snapshot { epoch, .. } => cell.at(epoch),
        }
    }

    /// Resolves the effective storage policy of a node
    ///
    /// Walks from the node towards the root and returns the first explicit
    /// policy. Through a snapshot the walk follows the frozen parent links
    /// and ends at the snapshot root, where the policy inherited at snapshot
    /// time applies. Returns `UNSPECIFIED` when nothing on the way is set;
    /// the suite default is never substituted here.
    pub fn effective_policy(&self, id: NodeId, layer: Layer) -> PolicyId {
        let mut current = Some(id);
        while let Some(node) = current {
            let Some(state) = self.state(node, layer) else {
                break;
            };
            if !state.storage_policy.is_unspecified() {
                return state.storage_policy;
            }
            if let Layer::Snapshot {
                root,
                inherited_policy,
                ..
            } = layer
            {
                if node == root {
                    return inherited_policy;
                }
            }
            current = state.parent;
        }
        PolicyId::UNSPECIFIED
    }

    /// Resolves a path, entering snapshots at `.snapshot/<name>` components
    pub fn resolve(&self, path: &str) -> Result<Resolved, NamespaceError> {
        let components = PathResolver::split_path(path)?;
        let not_found = || NamespaceError::PathNotFound(path.to_string());

        let mut id = NodeId::ROOT;
        let mut layer = Layer::Live;
        let mut state = self.state(id, layer).ok_or_else(not_found)?;

        let mut i = 0;
        while i < components.len() {
            let component = components[i];

            if component == SNAPSHOT_DIR && layer.is_live() {
                if !state.is_directory() {
                    return Err(NamespaceError::NotADirectory(path.to_string()));
                }
                let Some(name) = components.get(i + 1) else {
                    return Ok(Resolved::SnapshotDir { dir: id });
                };
                let snapshot = self.snapshots.get(id, name).ok_or_else(not_found)?;
                layer = Layer::from(snapshot);
                state = self.state(id, layer).ok_or_else(not_found)?;
                i += 2;
                continue;
            }

            let children = state
                .children()
                .ok_or_else(|| NamespaceError::NotADirectory(path.to_string()))?;
            let child = children.get(component).copied().ok_or_else(not_found)?;
            state = self.state(child, layer).ok_or_else(not_found)?;
            id = child;
            i += 1;
        }

        Ok(Resolved::Node {
            id,
            layer,
            state: Arc::clone(state),
        })
    }

    /// Resolves `subpath` inside snapshot `name` of directory `dir`
    pub fn resolve_in_snapshot(
        &self,
        dir: &str,
        name: &str,
        subpath: &str,
    ) -> Result<Resolved, NamespaceError> {
        if !PathResolver::is_valid_name(name) {
            return Err(PathError::InvalidName(name.to_string()).into());
        }
        let snapshot_root =
            PathResolver::join(&PathResolver::join(dir, SNAPSHOT_DIR), name);
        let rest = subpath.trim_start_matches('/');
        if rest.is_empty() {
            self.resolve(&snapshot_root)
        } else {
            self.resolve(&PathResolver::join(&snapshot_root, rest))
        }
    }

    /// Returns the effective storage policy of the node at `path`
    pub fn effective_policy_of(&self, path: &str) -> Result<PolicyId, NamespaceError> {
        Ok(match self.resolve(path)? {
            Resolved::Node { id, layer, .. } => self.effective_policy(id, layer),
            Resolved::SnapshotDir { dir } => self.effective_policy(dir, Layer::Live),
        })
    }

    /// Lists a directory, or returns the single entry of a file
    ///
    /// Directory entries come back in byte-wise name order, each carrying
    /// its effective policy.
    pub fn list(&self, path: &str) -> Result<Vec<FileStatus>, NamespaceError> {
        match self.resolve(path)? {
            Resolved::SnapshotDir { dir } => Ok(self
                .snapshots
                .of(dir)
                .filter_map(|s| self.snapshot_root_status(s))
                .collect()),
            Resolved::Node { id, layer, state } => match state.children() {
                None => Ok(vec![self.status(id, &state, layer)]),
                Some(children) => Ok(children
                    .values()
                    .filter_map(|&child| {
                        let child_state = self.state(child, layer)?;
                        Some(self.status(child, child_state, layer))
                    })
                    .collect()),
            },
        }
    }

    /// Returns the status of the node at `path` itself
    pub fn file_info(&self, path: &str) -> Result<FileStatus, NamespaceError> {
        Ok(self.status_of(&self.resolve(path)?))
    }

    /// Status of a resolved node
    pub fn status_of(&self, resolved: &Resolved) -> FileStatus {
        match resolved {
            Resolved::Node { id, layer, state } => self.status(*id, state, *layer),
            Resolved::SnapshotDir { dir } => FileStatus {
                name: SNAPSHOT_DIR.to_string(),
                node_id: *dir,
                kind: FileKind::Directory,
                replication: 0,
                children_num: self.snapshots.of(*dir).count(),
                storage_policy: self.effective_policy(*dir, Layer::Live),
            },
        }
    }

    /// Returns the snapshots of the live directory at `path`, in name order
    pub fn snapshots_of(&self, path: &str) -> Result<Vec<&Snapshot>, NamespaceError> {
        let components = self.live_components(path)?;
        let dir = self.live_directory(path, &components)?;
        Ok(self.snapshots.of(dir).collect())
    }

    fn status(&self, id: NodeId, state: &NodeState, layer: Layer) -> FileStatus {
        // A snapshot root goes by the snapshot's name
        let snapshot_name = match layer {
            Layer::Snapshot { root, epoch, .. } if root == id => self
                .snapshots
                .of(root)
                .find(|s| s.epoch == epoch)
                .map(|s| s.name.clone()),
            _ => None,
        };
        FileStatus {
            name: snapshot_name.unwrap_or_else(|| state.name.clone()),
            node_id: id,
            kind: if state.is_directory() {
                FileKind::Directory
            } else {
                FileKind::File
            },
            replication: state.replication(),
            children_num: state.children().map_or(0, |c| c.len()),
            storage_policy: self.effective_policy(id, layer),
        }
    }

    fn snapshot_root_status(&self, snapshot: &Snapshot) -> Option<FileStatus> {
        let layer = Layer::from(snapshot);
        let state = self.state(snapshot.root, layer)?;
        Some(self.status(snapshot.root, state, layer))
    }

    /// Applies an operation: validate, then execute
    pub fn apply(&mut self, op: &NamespaceOp) -> Result<NodeId, NamespaceError> {
        let prepared = self.prepare(op)?;
        Ok(self.execute(prepared))
    }

    /// Validates an operation against the current tree
    pub fn prepare(&self, op: &NamespaceOp) -> Result<PreparedOp, NamespaceError> {
        match op {
            NamespaceOp::Mkdirs { path } => {
                let components = self.live_components(path)?;
                let (parent, depth) = self.walk_live(path, &components)?;
                if depth == components.len() && !self.live(parent, path)?.is_directory() {
                    return Err(NamespaceError::AlreadyExists(path.clone()));
                }
                let missing = Self::new_names(&components[depth..])?;
                Ok(PreparedOp::Mkdirs { parent, missing })
            }

            NamespaceOp::CreateFile { path, replication } => {
                let components = self.live_components(path)?;
                let Some((name, dirs)) = components.split_last() else {
                    return Err(NamespaceError::InvalidOperation(format!(
                        "{} is the root directory",
                        path
                    )));
                };
                if *replication == 0 {
                    return Err(NamespaceError::InvalidOperation(format!(
                        "replication of {} must be at least 1",
                        path
                    )));
                }
                let (parent, depth) = self.walk_live(path, dirs)?;
                if depth == dirs.len() {
                    let parent_state = self.live(parent, path)?;
                    if !parent_state.is_directory() {
                        return Err(NamespaceError::NotADirectory(path.clone()));
                    }
                    if parent_state.child(name).is_some() {
                        return Err(NamespaceError::AlreadyExists(path.clone()));
                    }
                }
                let missing = Self::new_names(&dirs[depth..])?;
                let name = Self::new_names(&[*name])?.remove(0);
                Ok(PreparedOp::CreateFile {
                    parent,
                    missing,
                    name,
                    replication: *replication,
                })
            }

            NamespaceOp::Delete { path, recursive } => {
                let components = self.live_components(path)?;
                let Some(name) = components.last() else {
                    return Err(NamespaceError::InvalidOperation(
                        "the root directory cannot be deleted".to_string(),
                    ));
                };
                let target = self.live_node(path, &components)?;
                let state = self.live(target, path)?;
                let parent = state
                    .parent
                    .ok_or_else(|| NamespaceError::PathNotFound(path.clone()))?;
                let has_children = state.children().map_or(false, |c| !c.is_empty());
                if has_children && !recursive {
                    return Err(NamespaceError::DirectoryNotEmpty(path.clone()));
                }
                if self
                    .live_subtree(target)
                    .into_iter()
                    .any(|id| self.snapshots.has_snapshots(id))
                {
                    return Err(NamespaceError::HasSnapshots(path.clone()));
                }
                Ok(PreparedOp::Delete {
                    parent,
                    name: name.to_string(),
                    target,
                })
            }

            NamespaceOp::SetStoragePolicy { path, policy_id } => {
                let components = self.live_components(path)?;
                let target = self.live_node(path, &components)?;
                Ok(PreparedOp::SetStoragePolicy {
                    target,
                    policy_id: *policy_id,
                })
            }

            NamespaceOp::CreateSnapshot { path, name } => {
                let components = self.live_components(path)?;
                let root = self.live_directory(path, &components)?;
                if !PathResolver::is_valid_name(name) {
                    return Err(PathError::InvalidName(name.clone()).into());
                }
                if self.snapshots.contains(root, name) {
                    return Err(NamespaceError::SnapshotExists {
                        path: path.clone(),
                        name: name.clone(),
                    });
                }
                Ok(PreparedOp::CreateSnapshot {
                    root,
                    name: name.clone(),
                })
            }

            NamespaceOp::DeleteSnapshot { path, name } => {
                let components = self.live_components(path)?;
                let root = self.live_directory(path, &components)?;
                if !self.snapshots.contains(root, name) {
                    return Err(NamespaceError::SnapshotNotFound {
                        path: path.clone(),
                        name: name.clone(),
                    });
                }
                Ok(PreparedOp::DeleteSnapshot {
                    root,
                    name: name.clone(),
                })
            }
        }
    }

    /// Executes a prepared operation and returns the node it addressed
    pub fn execute(&mut self, prepared: PreparedOp) -> NodeId {
        match prepared {
            PreparedOp::Mkdirs { parent, missing } => self.create_dirs(parent, missing),
            PreparedOp::CreateFile {
                parent,
                missing,
                name,
                replication,
            } => {
                let parent = self.create_dirs(parent, missing);
                self.add_child(parent, NodeState::file(name, parent, replication))
            }
            PreparedOp::Delete {
                parent,
                name,
                target,
            } => {
                self.remove_subtree(parent, &name, target);
                target
            }
            PreparedOp::SetStoragePolicy { target, policy_id } => {
                self.update(target, |state| state.storage_policy = policy_id);
                target
            }
            PreparedOp::CreateSnapshot { root, name } => {
                let inherited_policy = self
                    .state(root, Layer::Live)
                    .and_then(|state| state.parent)
                    .map_or(PolicyId::UNSPECIFIED, |parent| {
                        self.effective_policy(parent, Layer::Live)
                    });
                self.snapshots.insert(Snapshot {
                    name,
                    root,
                    epoch: self.epoch,
                    inherited_policy,
                });
                self.epoch += 1;
                root
            }
            PreparedOp::DeleteSnapshot { root, name } => {
                self.snapshots.remove(root, &name);
                self.prune();
                root
            }
        }
    }

    fn live(&self, id: NodeId, path: &str) -> Result<&NodeState, NamespaceError> {
        self.state(id, Layer::Live)
            .map(|state| state.as_ref())
            .ok_or_else(|| NamespaceError::PathNotFound(path.to_string()))
    }

    /// Splits a path that a mutation may address
    fn live_components<'p>(&self, path: &'p str) -> Result<Vec<&'p str>, NamespaceError> {
        let components = PathResolver::split_path(path)?;
        if PathResolver::is_snapshot_path(&components) {
            return Err(NamespaceError::SnapshotReadOnly(path.to_string()));
        }
        Ok(components)
    }

    /// Walks the live tree as far as `components` exist
    ///
    /// Returns the deepest existing node and how many components it
    /// consumed.
    fn walk_live(
        &self,
        path: &str,
        components: &[&str],
    ) -> Result<(NodeId, usize), NamespaceError> {
        let mut id = NodeId::ROOT;
        for (depth, component) in components.iter().enumerate() {
            let children = self
                .live(id, path)?
                .children()
                .ok_or_else(|| NamespaceError::NotADirectory(path.to_string()))?;
            match children.get(*component) {
                Some(&child) => id = child,
                None => return Ok((id, depth)),
            }
        }
        Ok((id, components.len()))
    }

    fn live_node(&self, path: &str, components: &[&str]) -> Result<NodeId, NamespaceError> {
        let (id, depth) = self.walk_live(path, components)?;
        if depth < components.len() {
            return Err(NamespaceError::PathNotFound(path.to_string()));
        }
        Ok(id)
    }

    fn live_directory(&self, path: &str, components: &[&str]) -> Result<NodeId, NamespaceError> {
        let id = self.live_node(path, components)?;
        if !self.live(id, path)?.is_directory() {
            return Err(NamespaceError::NotADirectory(path.to_string()));
        }
        Ok(id)
    }

    fn new_names(components: &[&str]) -> Result<Vec<String>, NamespaceError> {
        components
            .iter()
            .map(|c| {
                if PathResolver::is_valid_name(c) {
                    Ok(c.to_string())
                } else {
                    Err(PathError::InvalidName(c.to_string()).into())
                }
            })
            .collect()
    }

    /// Ids of `root` and every live descendant
    fn live_subtree(&self, root: NodeId) -> Vec<NodeId> {
        let mut ids = Vec::new();
        let mut queue = VecDeque::from([root]);
        while let Some(id) = queue.pop_front() {
            ids.push(id);
            if let Some(children) = self.state(id, Layer::Live).and_then(|s| s.children()) {
                queue.extend(children.values().copied());
            }
        }
        ids
    }

    fn allocate_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id = id.next();
        id
    }

    /// Publishes a modified copy of a node's live state
    fn update(&mut self, id: NodeId, f: impl FnOnce(&mut NodeState)) {
        let epoch = self.epoch;
        if let Some(cell) = self.nodes.get_mut(&id) {
            if let Some(current) = cell.current() {
                let mut next = NodeState::clone(current);
                f(&mut next);
                cell.write(epoch, Some(Arc::new(next)));
            }
        }
    }

    fn add_child(&mut self, parent: NodeId, state: NodeState) -> NodeId {
        let id = self.allocate_id();
        let name = state.name.clone();
        self.nodes.insert(id, VersionedNode::new(self.epoch, state));
        self.update(parent, |p| {
            if let Some(children) = p.children_mut() {
                children.insert(name, id);
            }
        });
        id
    }

    fn create_dirs(&mut self, parent: NodeId, missing: Vec<String>) -> NodeId {
        let mut current = parent;
        for name in missing {
            current = self.add_child(current, NodeState::directory(name, Some(current)));
        }
        current
    }

    fn remove_subtree(&mut self, parent: NodeId, name: &str, target: NodeId) {
        let doomed = self.live_subtree(target);
        self.update(parent, |p| {
            if let Some(children) = p.children_mut() {
                children.remove(name);
            }
        });

        let epoch = self.epoch;
        for id in doomed {
            let gone = match self.nodes.get_mut(&id) {
                Some(cell) => {
                    cell.write(epoch, None);
                    cell.is_gone()
                }
                None => false,
            };
            if gone {
                self.nodes.remove(&id);
            }
        }
    }

    /// Drops node versions no remaining snapshot can observe
    fn prune(&mut self) {
        let epochs = self.snapshots.epochs();
        self.nodes.retain(|_, cell| {
            cell.prune(&epochs);
            !cell.is_gone()
        });
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Self::new()
    }
}
