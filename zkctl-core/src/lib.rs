//! zkctl Core Library
//!
//! Shared types and tree operations for the zkctl coordination-service client.
//! The CLI crate supplies a connected [`Session`]; everything in [`ops`] is
//! written against that trait only.

pub mod acl;
pub mod error;
pub mod ops;
pub mod path;
pub mod session;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod memory;

// Re-export commonly used types
pub use acl::{Acl, Permission, Permissions, PERMISSION_TABLE};
pub use error::*;
pub use path::NodePath;
pub use session::{EventChannel, EventSender, Session};
pub use types::*;
