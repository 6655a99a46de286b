//! Core data types for nodes, versions and change events

use crate::error::{Result, ZkCtlError};
use crate::path::NodePath;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Optimistic-concurrency token for writes and deletes.
///
/// Negative values skip the version check on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(pub i32);

impl Version {
    /// Match whatever version the node currently has
    pub const ANY: Version = Version(-1);

    /// Version to send to the server, `None` when no check is wanted
    pub fn expected(self) -> Option<i32> {
        if self.0 < 0 {
            None
        } else {
            Some(self.0)
        }
    }

    pub fn is_any(self) -> bool {
        self.0 < 0
    }
}

impl Default for Version {
    fn default() -> Self {
        Version::ANY
    }
}

impl From<i32> for Version {
    fn from(v: i32) -> Self {
        Version(v)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Node metadata returned alongside reads and writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Stat {
    /// Transaction id that created the node
    pub czxid: i64,
    /// Transaction id that last modified the node
    pub mzxid: i64,
    /// Creation time, milliseconds since the epoch
    pub ctime: i64,
    /// Last modification time, milliseconds since the epoch
    pub mtime: i64,
    /// Data version
    pub version: i32,
    /// Children version
    pub cversion: i32,
    /// ACL version
    pub aversion: i32,
    /// Session id owning the node if ephemeral, zero otherwise
    pub ephemeral_owner: i64,
    pub data_length: i32,
    pub num_children: i32,
    /// Transaction id that last modified the children
    pub pzxid: i64,
}

/// How a node is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreateMode {
    #[default]
    Persistent,
    Ephemeral,
    PersistentSequential,
    EphemeralSequential,
}

impl CreateMode {
    const EPHEMERAL_FLAG: i32 = 1;
    const SEQUENTIAL_FLAG: i32 = 2;

    /// Decode the create flag word (bit 0 ephemeral, bit 1 sequential)
    pub fn from_flags(flags: i32) -> Result<Self> {
        match flags {
            0 => Ok(CreateMode::Persistent),
            Self::EPHEMERAL_FLAG => Ok(CreateMode::Ephemeral),
            Self::SEQUENTIAL_FLAG => Ok(CreateMode::PersistentSequential),
            3 => Ok(CreateMode::EphemeralSequential),
            other => Err(ZkCtlError::InvalidInput(format!(
                "invalid create flags {}: must be 0 (persistent), 1 (ephemeral), 2 (sequential) or 3 (ephemeral sequential)",
                other
            ))),
        }
    }

    pub fn is_ephemeral(self) -> bool {
        matches!(self, CreateMode::Ephemeral | CreateMode::EphemeralSequential)
    }

    pub fn is_sequential(self) -> bool {
        matches!(
            self,
            CreateMode::PersistentSequential | CreateMode::EphemeralSequential
        )
    }
}

/// Kind of change reported by a watch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    NodeCreated,
    NodeDeleted,
    NodeDataChanged,
    NodeChildrenChanged,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::NodeCreated => "EventNodeCreated",
            EventKind::NodeDeleted => "EventNodeDeleted",
            EventKind::NodeDataChanged => "EventNodeDataChanged",
            EventKind::NodeChildrenChanged => "EventNodeChildrenChanged",
        };
        f.write_str(name)
    }
}

/// Change notification delivered on a watch channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchEvent {
    pub kind: EventKind,
    pub path: NodePath,
}

impl WatchEvent {
    pub fn new(kind: EventKind, path: NodePath) -> Self {
        Self { kind, path }
    }
}

impl fmt::Display for WatchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.path)
    }
}
