//! In-memory session for tests
//!
//! Behaves like a single-server ensemble: parents must exist, versions are
//! checked, non-empty deletes are rejected and data watches fire once on
//! change or deletion. A few knobs let tests inject failures.

use crate::acl::Acl;
use crate::error::{NotificationError, RemoteError};
use crate::path::NodePath;
use crate::session::{EventChannel, EventSender, Session};
use crate::types::{CreateMode, EventKind, Stat, Version, WatchEvent};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;

const SESSION_ID: i64 = 0x5eed;

type ScriptedBatch = Vec<Result<WatchEvent, NotificationError>>;

#[derive(Debug)]
struct Node {
    data: Vec<u8>,
    stat: Stat,
    acl: Vec<Acl>,
    children: BTreeSet<String>,
    watchers: Vec<EventSender>,
}

impl Node {
    fn new(data: &[u8], acl: Vec<Acl>, zxid: i64, ephemeral_owner: i64) -> Self {
        let now = now_millis();
        Self {
            data: data.to_vec(),
            stat: Stat {
                czxid: zxid,
                mzxid: zxid,
                ctime: now,
                mtime: now,
                version: 0,
                cversion: 0,
                aversion: 0,
                ephemeral_owner,
                data_length: data.len() as i32,
                num_children: 0,
                pzxid: zxid,
            },
            acl,
            children: BTreeSet::new(),
            watchers: Vec::new(),
        }
    }

    fn fire(&mut self, event: WatchEvent) {
        for tx in self.watchers.drain(..) {
            let _ = tx.send(Ok(event.clone()));
        }
    }
}

#[derive(Debug, Default)]
struct State {
    nodes: BTreeMap<NodePath, Node>,
    zxid: i64,
    closed: bool,
    deletes_until_close: Option<usize>,
    watches_until_close: Option<usize>,
    bump_after_get: HashSet<NodePath>,
    scripted: VecDeque<ScriptedBatch>,
    deleted: Vec<NodePath>,
    watch_calls: usize,
}

impl State {
    fn ensure_open(&self) -> Result<(), RemoteError> {
        if self.closed {
            Err(RemoteError::SessionClosed)
        } else {
            Ok(())
        }
    }

    fn next_zxid(&mut self) -> i64 {
        self.zxid += 1;
        self.zxid
    }

    fn node_mut(&mut self, path: &NodePath) -> Result<&mut Node, RemoteError> {
        self.nodes
            .get_mut(path)
            .ok_or_else(|| RemoteError::NoNode(path.to_string()))
    }

    fn check_version(path: &NodePath, node: &Node, version: Version) -> Result<(), RemoteError> {
        match version.expected() {
            Some(v) if v != node.stat.version => Err(RemoteError::BadVersion(path.to_string())),
            _ => Ok(()),
        }
    }
}

/// In-memory [`Session`] backed by a `BTreeMap` of nodes
#[derive(Debug)]
pub struct MemorySession {
    state: Mutex<State>,
}

impl Default for MemorySession {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySession {
    /// Create a session holding only the root node
    pub fn new() -> Self {
        let mut state = State::default();
        state
            .nodes
            .insert(NodePath::root(), Node::new(&[], Vec::new(), 0, 0));
        Self {
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Close the session once `n` more deletes have gone through
    pub fn close_after_deletes(&self, n: usize) {
        self.lock().deletes_until_close = Some(n);
    }

    /// Let `n` more watches be armed, then fail every call
    pub fn close_after_watches(&self, n: usize) {
        self.lock().watches_until_close = Some(n);
    }

    /// Simulate another client writing to `path` right after our next read
    pub fn bump_version_after_get(&self, path: &NodePath) {
        self.lock().bump_after_get.insert(path.clone());
    }

    /// Queue event batches; each armed watch consumes one batch instead of
    /// waiting for a real change
    pub fn script_watch_events(&self, batches: Vec<ScriptedBatch>) {
        self.lock().scripted.extend(batches);
    }

    /// Paths deleted so far, in order
    pub fn deleted(&self) -> Vec<NodePath> {
        self.lock().deleted.clone()
    }

    /// Number of `get_watch` calls, successful or not
    pub fn watch_calls(&self) -> usize {
        self.lock().watch_calls
    }

    /// ACL stored on a node
    pub fn acl(&self, path: &NodePath) -> Option<Vec<Acl>> {
        self.lock().nodes.get(path).map(|n| n.acl.clone())
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

#[async_trait]
impl Session for MemorySession {
    async fn create(
        &self,
        path: &NodePath,
        data: &[u8],
        mode: CreateMode,
        acl: &[Acl],
    ) -> Result<NodePath, RemoteError> {
        let mut state = self.lock();
        state.ensure_open()?;

        if acl.is_empty() {
            return Err(RemoteError::InvalidAcl(path.to_string()));
        }
        let parent_path = path
            .parent()
            .ok_or_else(|| RemoteError::NodeExists(path.to_string()))?;

        let zxid = state.next_zxid();
        let parent = state.node_mut(&parent_path)?;
        if parent.stat.ephemeral_owner != 0 {
            return Err(RemoteError::Other(format!(
                "ephemeral node {} cannot have children",
                parent_path
            )));
        }

        let created = if mode.is_sequential() {
            NodePath::from_cli(&format!("{}{:010}", path, parent.stat.cversion))
        } else {
            path.clone()
        };
        if parent.children.contains(created.name()) {
            return Err(RemoteError::NodeExists(created.to_string()));
        }

        parent.children.insert(created.name().to_string());
        parent.stat.cversion += 1;
        parent.stat.num_children += 1;
        parent.stat.pzxid = zxid;

        let owner = if mode.is_ephemeral() { SESSION_ID } else { 0 };
        state
            .nodes
            .insert(created.clone(), Node::new(data, acl.to_vec(), zxid, owner));

        Ok(created)
    }

    async fn get(&self, path: &NodePath) -> Result<(Vec<u8>, Stat), RemoteError> {
        let mut state = self.lock();
        state.ensure_open()?;

        let bump = state.bump_after_get.remove(path);
        let zxid = state.next_zxid();
        let node = state.node_mut(path)?;
        let result = (node.data.clone(), node.stat);

        if bump {
            node.stat.version += 1;
            node.stat.mzxid = zxid;
        }

        Ok(result)
    }

    async fn set(
        &self,
        path: &NodePath,
        data: &[u8],
        version: Version,
    ) -> Result<Stat, RemoteError> {
        let mut state = self.lock();
        state.ensure_open()?;

        let zxid = state.next_zxid();
        let node = state.node_mut(path)?;
        State::check_version(path, node, version)?;

        node.data = data.to_vec();
        node.stat.version += 1;
        node.stat.mzxid = zxid;
        node.stat.mtime = now_millis();
        node.stat.data_length = data.len() as i32;
        node.fire(WatchEvent::new(EventKind::NodeDataChanged, path.clone()));

        Ok(node.stat)
    }

    async fn children(&self, path: &NodePath) -> Result<Vec<String>, RemoteError> {
        let mut state = self.lock();
        state.ensure_open()?;

        let node = state.node_mut(path)?;
        Ok(node.children.iter().cloned().collect())
    }

    async fn delete(&self, path: &NodePath, version: Version) -> Result<(), RemoteError> {
        let mut state = self.lock();
        state.ensure_open()?;

        let parent_path = path
            .parent()
            .ok_or_else(|| RemoteError::Other("cannot delete the root node".to_string()))?;

        let node = state.node_mut(path)?;
        State::check_version(path, node, version)?;
        if !node.children.is_empty() {
            return Err(RemoteError::NotEmpty(path.to_string()));
        }

        if let Some(mut node) = state.nodes.remove(path) {
            node.fire(WatchEvent::new(EventKind::NodeDeleted, path.clone()));
        }

        let zxid = state.next_zxid();
        let parent = state.node_mut(&parent_path)?;
        parent.children.remove(path.name());
        parent.stat.cversion += 1;
        parent.stat.num_children -= 1;
        parent.stat.pzxid = zxid;

        state.deleted.push(path.clone());
        let exhausted = match state.deletes_until_close.as_mut() {
            Some(remaining) => {
                *remaining = remaining.saturating_sub(1);
                *remaining == 0
            }
            None => false,
        };
        if exhausted {
            state.closed = true;
        }

        Ok(())
    }

    async fn get_watch(
        &self,
        path: &NodePath,
    ) -> Result<(Vec<u8>, Stat, EventChannel), RemoteError> {
        let mut state = self.lock();
        state.watch_calls += 1;

        let exhausted = match state.watches_until_close.as_mut() {
            Some(0) => true,
            Some(remaining) => {
                *remaining -= 1;
                false
            }
            None => false,
        };
        if exhausted {
            state.closed = true;
        }
        state.ensure_open()?;

        let (tx, rx) = mpsc::unbounded_channel();
        let scripted = state.scripted.pop_front();
        let node = state.node_mut(path)?;
        let result = (node.data.clone(), node.stat);

        match scripted {
            Some(batch) => {
                for event in batch {
                    let _ = tx.send(event);
                }
            }
            None => node.watchers.push(tx),
        }

        Ok((result.0, result.1, rx))
    }

    async fn close(&self) -> Result<(), RemoteError> {
        let mut state = self.lock();
        state.ensure_open()?;

        state.closed = true;
        for node in state.nodes.values_mut() {
            node.watchers.clear();
        }
        Ok(())
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
