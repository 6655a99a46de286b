//! ZooKeeper-backed session.
//!
//! Wraps the blocking `zookeeper` client behind the async [`Session`] trait.
//! Every call runs on tokio's blocking pool; watches are bridged from the
//! client's one-shot callback into an [`EventChannel`].

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;
use zkctl_core::{
    Acl, CreateMode, EventChannel, EventKind, NodePath, NotificationError, Permissions,
    RemoteError, Session, Stat, Version, WatchEvent,
};
use zookeeper::{WatchedEvent, WatchedEventType, Watcher, ZkError, ZooKeeper};

/// Port used when an address does not name one
pub const DEFAULT_PORT: u16 = 2181;

/// Append the default port to addresses that lack one
fn with_default_port(addr: &str) -> String {
    let has_port = if let Some(rest) = addr.strip_prefix('[') {
        // Bracketed IPv6 literal
        rest.contains("]:")
    } else {
        addr.matches(':').count() == 1
    };

    if has_port {
        addr.to_string()
    } else {
        format!("{}:{}", addr, DEFAULT_PORT)
    }
}

/// Build the client connect string from a list of server addresses
pub fn connect_string(servers: &[String]) -> String {
    servers
        .iter()
        .map(|s| with_default_port(s.trim()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Map a client error onto the remote error taxonomy
fn remote_error(err: ZkError, path: &str) -> RemoteError {
    match err {
        ZkError::NoNode => RemoteError::NoNode(path.to_string()),
        ZkError::NodeExists => RemoteError::NodeExists(path.to_string()),
        ZkError::BadVersion => RemoteError::BadVersion(path.to_string()),
        ZkError::NotEmpty => RemoteError::NotEmpty(path.to_string()),
        ZkError::InvalidACL => RemoteError::InvalidAcl(path.to_string()),
        ZkError::ConnectionLoss => RemoteError::ConnectionLoss,
        ZkError::SessionExpired => RemoteError::SessionExpired,
        other => RemoteError::Other(format!("{:?} ({})", other, path)),
    }
}

fn convert_stat(stat: zookeeper::Stat) -> Stat {
    Stat {
        czxid: stat.czxid,
        mzxid: stat.mzxid,
        ctime: stat.ctime,
        mtime: stat.mtime,
        version: stat.version,
        cversion: stat.cversion,
        aversion: stat.aversion,
        ephemeral_owner: stat.ephemeral_owner,
        data_length: stat.data_length,
        num_children: stat.num_children,
        pzxid: stat.pzxid,
    }
}

fn convert_mode(mode: CreateMode) -> zookeeper::CreateMode {
    match mode {
        CreateMode::Persistent => zookeeper::CreateMode::Persistent,
        CreateMode::Ephemeral => zookeeper::CreateMode::Ephemeral,
        CreateMode::PersistentSequential => zookeeper::CreateMode::PersistentSequential,
        CreateMode::EphemeralSequential => zookeeper::CreateMode::EphemeralSequential,
    }
}

fn convert_permissions(permissions: Permissions) -> zookeeper::Permission {
    const BITS: [(Permissions, zookeeper::Permission); 5] = [
        (Permissions::READ, zookeeper::Permission::READ),
        (Permissions::WRITE, zookeeper::Permission::WRITE),
        (Permissions::CREATE, zookeeper::Permission::CREATE),
        (Permissions::DELETE, zookeeper::Permission::DELETE),
        (Permissions::ADMIN, zookeeper::Permission::ADMIN),
    ];

    BITS.iter()
        .filter(|(ours, _)| permissions.contains(*ours))
        .fold(zookeeper::Permission::NONE, |acc, (_, theirs)| acc | *theirs)
}

fn convert_acl(acl: &[Acl]) -> Vec<zookeeper::Acl> {
    acl.iter()
        .map(|entry| zookeeper::Acl {
            perms: convert_permissions(entry.permissions),
            scheme: entry.scheme.clone(),
            id: entry.id.clone(),
        })
        .collect()
}

/// Turn a fired watch into a node event, or an inline error for state-only
/// notifications
fn convert_event(event: WatchedEvent) -> Result<WatchEvent, NotificationError> {
    let kind = match event.event_type {
        WatchedEventType::NodeCreated => EventKind::NodeCreated,
        WatchedEventType::NodeDeleted => EventKind::NodeDeleted,
        WatchedEventType::NodeDataChanged => EventKind::NodeDataChanged,
        WatchedEventType::NodeChildrenChanged => EventKind::NodeChildrenChanged,
        // State changes go to the session watcher; a node watch only sees
        // this if the client ever routes one here
        WatchedEventType::None => {
            return Err(NotificationError::Session(format!("{:?}", event.keeper_state)))
        }
        other => return Err(NotificationError::Unexpected(format!("{:?}", other))),
    };

    let path = event.path.unwrap_or_default();
    Ok(WatchEvent::new(kind, NodePath::from_cli(&path)))
}

/// Logs session-level state changes
struct SessionWatcher;

impl Watcher for SessionWatcher {
    fn handle(&self, event: WatchedEvent) {
        debug!(state = ?event.keeper_state, "session event");
    }
}

/// Connected ZooKeeper session
#[derive(Clone)]
pub struct ZkSession {
    zk: Arc<ZooKeeper>,
    connect_string: String,
}

impl std::fmt::Debug for ZkSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZkSession")
            .field("connect_string", &self.connect_string)
            .finish()
    }
}

impl ZkSession {
    /// Connect to the ensemble.
    ///
    /// # Arguments
    ///
    /// * `servers` - Server addresses; missing ports default to 2181
    /// * `timeout` - Session timeout negotiated with the server
    pub async fn connect(servers: &[String], timeout: Duration) -> Result<Self, RemoteError> {
        let connect_string = connect_string(servers);
        debug!(servers = %connect_string, ?timeout, "connecting");

        let target = connect_string.clone();
        let zk = tokio::task::spawn_blocking(move || {
            ZooKeeper::connect(&target, timeout, SessionWatcher)
        })
        .await
        .map_err(|e| RemoteError::Other(format!("connect task failed: {}", e)))?
        .map_err(|e| remote_error(e, &connect_string))?;

        Ok(Self {
            zk: Arc::new(zk),
            connect_string,
        })
    }

    pub fn connect_string(&self) -> &str {
        &self.connect_string
    }

    /// Run a blocking client call off the async runtime
    async fn call<T, F>(&self, path: &NodePath, f: F) -> Result<T, RemoteError>
    where
        T: Send + 'static,
        F: FnOnce(&ZooKeeper, &str) -> Result<T, ZkError> + Send + 'static,
    {
        let zk = Arc::clone(&self.zk);
        let target = path.to_string();

        let (result, target) = tokio::task::spawn_blocking(move || {
            let result = f(&zk, &target);
            (result, target)
        })
        .await
        .map_err(|e| RemoteError::Other(format!("session task failed: {}", e)))?;

        result.map_err(|e| remote_error(e, &target))
    }
}

#[async_trait]
impl Session for ZkSession {
    async fn create(
        &self,
        path: &NodePath,
        data: &[u8],
        mode: CreateMode,
        acl: &[Acl],
    ) -> Result<NodePath, RemoteError> {
        let data = data.to_vec();
        let acl = convert_acl(acl);
        let mode = convert_mode(mode);

        let created = self
            .call(path, move |zk, path| zk.create(path, data, acl, mode))
            .await?;
        Ok(NodePath::from_cli(&created))
    }

    async fn get(&self, path: &NodePath) -> Result<(Vec<u8>, Stat), RemoteError> {
        let (data, stat) = self
            .call(path, |zk, path| zk.get_data(path, false))
            .await?;
        Ok((data, convert_stat(stat)))
    }

    async fn set(
        &self,
        path: &NodePath,
        data: &[u8],
        version: Version,
    ) -> Result<Stat, RemoteError> {
        let data = data.to_vec();
        let expected = version.expected();

        let stat = self
            .call(path, move |zk, path| zk.set_data(path, data, expected))
            .await?;
        Ok(convert_stat(stat))
    }

    async fn children(&self, path: &NodePath) -> Result<Vec<String>, RemoteError> {
        self.call(path, |zk, path| zk.get_children(path, false))
            .await
    }

    async fn delete(&self, path: &NodePath, version: Version) -> Result<(), RemoteError> {
        let expected = version.expected();
        self.call(path, move |zk, path| zk.delete(path, expected))
            .await
    }

    async fn get_watch(
        &self,
        path: &NodePath,
    ) -> Result<(Vec<u8>, Stat, EventChannel), RemoteError> {
        let (tx, rx) = mpsc::unbounded_channel();

        // The sender lives inside the callback and is dropped once it fires,
        // which closes the channel.
        let (data, stat) = self
            .call(path, move |zk, path| {
                zk.get_data_w(path, move |event: WatchedEvent| {
                    let _ = tx.send(convert_event(event));
                })
            })
            .await?;

        Ok((data, convert_stat(stat), rx))
    }

    async fn close(&self) -> Result<(), RemoteError> {
        let zk = Arc::clone(&self.zk);
        tokio::task::spawn_blocking(move || zk.close())
            .await
            .map_err(|e| RemoteError::Other(format!("session task failed: {}", e)))?
            .map_err(|e| remote_error(e, &self.connect_string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zookeeper::KeeperState;

    #[test]
    fn test_connect_string_default_port() {
        let servers = vec![
            "127.0.0.1".to_string(),
            "zk1:2182".to_string(),
            " zk2 ".to_string(),
        ];
        assert_eq!(
            connect_string(&servers),
            "127.0.0.1:2181,zk1:2182,zk2:2181"
        );
    }

    #[test]
    fn test_connect_string_ipv6() {
        let servers = vec!["[::1]:2190".to_string(), "[::1]".to_string()];
        assert_eq!(connect_string(&servers), "[::1]:2190,[::1]:2181");
    }

    #[test]
    fn test_remote_error_mapping() {
        assert_eq!(
            remote_error(ZkError::NoNode, "/a"),
            RemoteError::NoNode("/a".to_string())
        );
        assert_eq!(
            remote_error(ZkError::BadVersion, "/a"),
            RemoteError::BadVersion("/a".to_string())
        );
        assert_eq!(
            remote_error(ZkError::NotEmpty, "/a"),
            RemoteError::NotEmpty("/a".to_string())
        );
        assert_eq!(
            remote_error(ZkError::SessionExpired, "/a"),
            RemoteError::SessionExpired
        );
        assert!(matches!(
            remote_error(ZkError::NoAuth, "/a"),
            RemoteError::Other(_)
        ));
    }

    #[test]
    fn test_convert_acl_bits() {
        let acl = convert_acl(&[Acl::world(Permissions::READ | Permissions::WRITE)]);

        assert_eq!(acl.len(), 1);
        assert_eq!(
            acl[0].perms,
            zookeeper::Permission::READ | zookeeper::Permission::WRITE
        );
        assert_eq!(acl[0].scheme, "world");
        assert_eq!(acl[0].id, "anyone");
    }

    #[test]
    fn test_convert_permissions() {
        assert_eq!(
            convert_permissions(Permissions::ALL),
            zookeeper::Permission::ALL
        );
        assert_eq!(
            convert_permissions(Permissions::NONE),
            zookeeper::Permission::NONE
        );
        assert_eq!(
            convert_permissions(Permissions::CREATE | Permissions::ADMIN),
            zookeeper::Permission::CREATE | zookeeper::Permission::ADMIN
        );
    }

    #[test]
    fn test_convert_event() {
        let event = WatchedEvent {
            event_type: WatchedEventType::NodeDataChanged,
            keeper_state: KeeperState::SyncConnected,
            path: Some("/a".to_string()),
        };
        assert_eq!(
            convert_event(event).unwrap(),
            WatchEvent::new(EventKind::NodeDataChanged, NodePath::from_cli("/a"))
        );

        let event = WatchedEvent {
            event_type: WatchedEventType::None,
            keeper_state: KeeperState::Disconnected,
            path: None,
        };
        assert!(matches!(
            convert_event(event),
            Err(NotificationError::Session(_))
        ));
    }

    #[tokio::test]
    #[ignore] // Requires running ZooKeeper on 127.0.0.1:2181
    async fn test_live_round_trip() {
        let session = ZkSession::connect(&["127.0.0.1".to_string()], Duration::from_secs(2))
            .await
            .unwrap();
        let path = NodePath::from_cli("/zkctl-client-test");
        let acl = vec![Acl::world(Permissions::ALL)];

        let _ = zkctl_core::ops::delete_recursive(&session, &path).await;
        session
            .create(&path, b"hello", CreateMode::Persistent, &acl)
            .await
            .unwrap();
        let (data, stat) = session.get(&path).await.unwrap();
        assert_eq!(data, b"hello".to_vec());
        assert_eq!(stat.version, 0);

        session.delete(&path, Version(stat.version)).await.unwrap();
        session.close().await.unwrap();
    }
}
