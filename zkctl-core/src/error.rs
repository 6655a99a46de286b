//! Error types for zkctl

use thiserror::Error;

/// Failure returned by the coordination service for a single call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The node does not exist
    #[error("node does not exist: {0}")]
    NoNode(String),

    /// A node already exists at the path
    #[error("node already exists: {0}")]
    NodeExists(String),

    /// Optimistic version check failed
    #[error("version mismatch for node: {0}")]
    BadVersion(String),

    /// Delete rejected because the node still has children
    #[error("node has children: {0}")]
    NotEmpty(String),

    /// The ACL supplied on create was rejected
    #[error("invalid ACL for node: {0}")]
    InvalidAcl(String),

    /// The connection to the ensemble was lost
    #[error("connection lost")]
    ConnectionLoss,

    /// The session expired on the server side
    #[error("session expired")]
    SessionExpired,

    /// The session was closed locally
    #[error("session closed")]
    SessionClosed,

    /// Anything else reported by the client library
    #[error("{0}")]
    Other(String),
}

impl RemoteError {
    /// Whether the error means the node was not found
    pub fn is_no_node(&self) -> bool {
        matches!(self, RemoteError::NoNode(_))
    }
}

/// Error delivered inline on a watch channel
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotificationError {
    /// Session state change instead of a node event
    #[error("session state changed: {0}")]
    Session(String),

    /// Event the client does not know how to report
    #[error("unexpected notification: {0}")]
    Unexpected(String),
}

/// Core error type for zkctl operations
#[derive(Error, Debug)]
pub enum ZkCtlError {
    /// Remote call failed
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Invalid input or arguments
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for zkctl operations
pub type Result<T> = std::result::Result<T, ZkCtlError>;
