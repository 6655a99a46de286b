//! zkctl CLI Library
//!
//! This library provides the core functionality for the zkctl CLI tool.
//!
//! # Public API
//!
//! The primary public API is [`client::ZkSession`], a [`zkctl_core::Session`]
//! backed by a live ZooKeeper ensemble. Configuration types are also
//! available via [`config::CliConfig`] and [`config::ConfigBuilder`].
//!
//! ```no_run
//! use std::time::Duration;
//! use zkctl::client::ZkSession;
//! use zkctl_core::{NodePath, Session};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let session = ZkSession::connect(&["127.0.0.1".to_string()], Duration::from_secs(2)).await?;
//!
//! let (data, stat) = session.get(&NodePath::from_cli("/config")).await?;
//! println!("{} bytes at version {}", data.len(), stat.version);
//! session.close().await?;
//! # Ok(())
//! # }
//! ```

// Internal CLI implementation - not part of public API
#[doc(hidden)]
pub mod cli;

/// ZooKeeper-backed session.
pub mod client;

/// Configuration types for the CLI tool.
pub mod config;

// Internal formatting functions - not part of public API
#[doc(hidden)]
pub mod format;
