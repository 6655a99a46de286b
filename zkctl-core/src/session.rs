//! Session abstraction over the coordination service
//!
//! This trait enables testing of the tree operations without a running
//! ensemble by allowing in-memory implementations.

use crate::acl::Acl;
use crate::error::{NotificationError, RemoteError};
use crate::path::NodePath;
use crate::types::{CreateMode, Stat, Version, WatchEvent};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Receiving end of a single-shot watch.
///
/// Closes once the watch has fired and the notification has been delivered.
pub type EventChannel = mpsc::UnboundedReceiver<std::result::Result<WatchEvent, NotificationError>>;

/// Sending end handed to whatever fires the watch
pub type EventSender = mpsc::UnboundedSender<std::result::Result<WatchEvent, NotificationError>>;

/// Connected session to the coordination service
#[async_trait]
pub trait Session: Send + Sync {
    /// Create a node, returning the path actually created (differs for
    /// sequential nodes)
    async fn create(
        &self,
        path: &NodePath,
        data: &[u8],
        mode: CreateMode,
        acl: &[Acl],
    ) -> Result<NodePath, RemoteError>;

    /// Read a node's value and metadata
    async fn get(&self, path: &NodePath) -> Result<(Vec<u8>, Stat), RemoteError>;

    /// Overwrite a node's value
    async fn set(&self, path: &NodePath, data: &[u8], version: Version)
        -> Result<Stat, RemoteError>;

    /// Names of the immediate children
    async fn children(&self, path: &NodePath) -> Result<Vec<String>, RemoteError>;

    /// Delete a node that has no children
    async fn delete(&self, path: &NodePath, version: Version) -> Result<(), RemoteError>;

    /// Read a node and arm a one-shot watch on it
    async fn get_watch(
        &self,
        path: &NodePath,
    ) -> Result<(Vec<u8>, Stat, EventChannel), RemoteError>;

    /// Close the session
    async fn close(&self) -> Result<(), RemoteError>;
}
