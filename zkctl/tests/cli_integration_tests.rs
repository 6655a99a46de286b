//! Integration tests for the zkctl binary and the ZooKeeper session
//!
//! Tests marked `#[ignore]` need a ZooKeeper server on 127.0.0.1:2181:
//! 1. Start one, e.g. `docker run --rm -p 2181:2181 zookeeper:3.8`
//! 2. Run tests: `cargo test --test cli_integration_tests -- --ignored`

use anyhow::Result;
use serde_json::Value;
use std::process::{Command, Output};
use std::time::Duration;
use zkctl::cli::{execute, AclArg, Commands};
use zkctl::client::ZkSession;
use zkctl::format::OutputFormat;
use zkctl_core::{ops, NodePath, RemoteError, Session, Version};

const TEST_ROOT: &str = "/zkctl-it";

fn zkctl(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_zkctl"))
        .args(args)
        .env_remove("ZKCTL_SERVERS")
        .env_remove("ZKCTL_TIMEOUT_MS")
        .env_remove("ZKCTL_DEBUG")
        .env_remove("ZKCTL_FORMAT")
        .output()
        .expect("failed to run zkctl")
}

async fn connect() -> Result<ZkSession> {
    Ok(ZkSession::connect(&["127.0.0.1".to_string()], Duration::from_secs(2)).await?)
}

async fn run(session: &ZkSession, command: Commands) -> Result<String> {
    let mut out = Vec::new();
    execute(session, command, &OutputFormat::Text, &mut out).await?;
    Ok(String::from_utf8(out)?)
}

/// Fresh, empty test root
async fn reset(session: &ZkSession) -> Result<NodePath> {
    let root = NodePath::from_cli(TEST_ROOT);
    match ops::delete_recursive(session, &root).await {
        Ok(()) | Err(RemoteError::NoNode(_)) => {}
        Err(e) => return Err(e.into()),
    }
    run(session, create(TEST_ROOT, "", vec![])).await?;
    Ok(root)
}

fn create(path: &str, value: &str, acl: Vec<AclArg>) -> Commands {
    Commands::Create {
        path: path.to_string(),
        value: value.to_string(),
        flags: 0,
        world: false,
        acl,
    }
}

#[test]
fn test_config_show_json() {
    let output = zkctl(&[
        "--no-config",
        "--zk",
        "zk1,zk2:2182",
        "-t",
        "750ms",
        "--format",
        "json",
        "config",
        "show",
    ]);
    assert!(output.status.success());

    let config: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(config["servers"][0], "zk1");
    assert_eq!(config["servers"][1], "zk2:2182");
    assert_eq!(config["timeout_ms"], 750);
}

#[test]
fn test_config_file_is_read() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "servers = [\"from-file\"]\n").unwrap();

    let output = zkctl(&[
        "--config",
        path.to_str().unwrap(),
        "--format",
        "json",
        "config",
        "show",
    ]);
    assert!(output.status.success());

    let config: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(config["servers"][0], "from-file");
}

#[test]
fn test_invalid_config_exits_non_zero() {
    let output = zkctl(&["--no-config", "-t", "0s", "config", "show"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Configuration error"));
}

#[test]
fn test_completion_script() {
    let output = zkctl(&["completion", "bash"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("zkctl"));
}

#[test]
fn test_unknown_permission_rejected() {
    let output = zkctl(&["--no-config", "create", "/a", "x", "--acl", "execute"]);
    assert!(!output.status.success());
}

#[tokio::test]
#[ignore] // Requires running server
async fn test_create_get_ls_delete_scenario() -> Result<()> {
    let session = connect().await?;
    let root = reset(&session).await?;
    let a = root.join("a");
    let b = a.join("b");

    run(&session, create(a.as_str(), "hello", vec![AclArg::Read, AclArg::Write])).await?;
    assert_eq!(
        run(&session, Commands::Get { path: a.to_string() }).await?,
        "hello"
    );

    run(&session, create(b.as_str(), "", vec![])).await?;
    assert_eq!(
        run(&session, Commands::Ls { path: root.to_string() }).await?,
        format!("{}\n", a)
    );

    // Non-recursive delete of a parent is refused
    let err = session.delete(&a, Version::ANY).await.unwrap_err();
    assert_eq!(err, RemoteError::NotEmpty(a.to_string()));

    run(
        &session,
        Commands::Delete {
            path: a.to_string(),
            node_version: -1,
            auto: false,
            recursive: true,
        },
    )
    .await?;
    assert!(session.get(&a).await.unwrap_err().is_no_node());
    assert!(session.get(&b).await.unwrap_err().is_no_node());

    ops::delete_recursive(&session, &root).await?;
    session.close().await?;
    Ok(())
}

#[tokio::test]
#[ignore] // Requires running server
async fn test_auto_version_conflict() -> Result<()> {
    let session = connect().await?;
    let root = reset(&session).await?;
    let node = root.join("versioned");
    run(&session, create(node.as_str(), "v0", vec![])).await?;

    let version = ops::resolve_version(&session, &node).await?;
    // Another writer sneaks in
    session.set(&node, b"theirs", Version::ANY).await?;

    let err = session.set(&node, b"mine", version).await.unwrap_err();
    assert_eq!(err, RemoteError::BadVersion(node.to_string()));

    let stat = ops::set(&session, &node, b"mine", Version::ANY, true).await?;
    assert_eq!(stat.version, 2);

    ops::delete_recursive(&session, &root).await?;
    session.close().await?;
    Ok(())
}

#[tokio::test]
#[ignore] // Requires running server
async fn test_watch_reports_change() -> Result<()> {
    let session = connect().await?;
    let root = reset(&session).await?;
    let node = root.join("watched");
    run(&session, create(node.as_str(), "", vec![])).await?;

    let writer = connect().await?;
    let target = node.clone();
    let handle = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        writer.set(&target, b"changed", Version::ANY).await.unwrap();
        writer.close().await.unwrap();
    });

    let mut seen = Vec::new();
    let armed = tokio::time::timeout(
        Duration::from_secs(10),
        ops::watch(&session, &node, false, |e| seen.push(e.clone())),
    )
    .await??;
    handle.await?;

    assert_eq!(armed, 1);
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].to_string(), format!("EventNodeDataChanged: {}", node));

    ops::delete_recursive(&session, &root).await?;
    session.close().await?;
    Ok(())
}
