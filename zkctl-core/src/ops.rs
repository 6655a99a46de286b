//! Tree operations built on top of a [`Session`]
//!
//! - [`resolve_version`] reads the current version stamp of a node
//! - [`delete_recursive`] removes a whole subtree, children first
//! - [`watch`] prints change notifications, optionally re-arming forever

use crate::error::RemoteError;
use crate::path::NodePath;
use crate::session::Session;
use crate::types::{Stat, Version, WatchEvent};
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, warn};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Fetch the current version stamp of a node.
///
/// Read-only. Fails if the node does not exist or the read fails.
pub async fn resolve_version<S>(session: &S, path: &NodePath) -> Result<Version, RemoteError>
where
    S: Session + ?Sized,
{
    let (_, stat) = session.get(path).await?;
    Ok(Version(stat.version))
}

/// Delete `path` and everything below it.
///
/// Children are removed before their parent, each parent with the version
/// read right before its own delete. The first failure aborts the walk and
/// leaves whatever was already deleted in place; a missing `path` is an
/// error, not a no-op.
pub fn delete_recursive<'a, S>(
    session: &'a S,
    path: &'a NodePath,
) -> BoxFuture<'a, Result<(), RemoteError>>
where
    S: Session + ?Sized,
{
    Box::pin(async move {
        let children = session.children(path).await?;

        for child in children {
            let child_path = path.join(&child);
            delete_recursive(session, &child_path).await?;
        }

        let version = resolve_version(session, path).await?;
        session.delete(path, version).await?;
        debug!(path = %path, version = %version, "deleted node");

        Ok(())
    })
}

/// Delete a single node, or a subtree when `recursive` is set.
///
/// `recursive` ignores `version` and `auto`. With `auto` the current version
/// is resolved immediately before the delete.
pub async fn delete<S>(
    session: &S,
    path: &NodePath,
    version: Version,
    auto: bool,
    recursive: bool,
) -> Result<(), RemoteError>
where
    S: Session + ?Sized,
{
    if recursive {
        return delete_recursive(session, path).await;
    }

    let version = if auto {
        resolve_version(session, path).await?
    } else {
        version
    };

    session.delete(path, version).await
}

/// Write `data` to a node, resolving the version first when `auto` is set.
pub async fn set<S>(
    session: &S,
    path: &NodePath,
    data: &[u8],
    version: Version,
    auto: bool,
) -> Result<Stat, RemoteError>
where
    S: Session + ?Sized,
{
    let version = if auto {
        resolve_version(session, path).await?
    } else {
        version
    };

    session.set(path, data, version).await
}

/// Watch a node and hand every change event to `on_event`.
///
/// Each pass arms one watch and drains its channel until it closes.
/// Notification errors are logged and skipped. Without `follow` the loop
/// ends after the first channel closes; with it a fresh watch is armed every
/// time, until arming fails.
///
/// Returns the number of watches armed.
pub async fn watch<S, F>(
    session: &S,
    path: &NodePath,
    follow: bool,
    mut on_event: F,
) -> Result<usize, RemoteError>
where
    S: Session + ?Sized,
    F: FnMut(&WatchEvent),
{
    let mut armed = 0;

    loop {
        let (_, stat, mut events) = session.get_watch(path).await?;
        armed += 1;
        debug!(path = %path, version = stat.version, armed, "watch armed");

        while let Some(event) = events.recv().await {
            match event {
                Ok(event) => on_event(&event),
                Err(e) => warn!(path = %path, "watch notification error: {}", e),
            }
        }

        if !follow {
            return Ok(armed);
        }
        debug!(path = %path, "watch fired, re-arming");
    }
}
