//! Command execution handlers

use anyhow::{Context, Result};
use clap::CommandFactory;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info, warn};
use zkctl_core::{ops, Acl, CreateMode, NodePath, Permission, Permissions, Session, Version};

use crate::config::CliConfig;
use crate::format::{self, OutputFormat};

use super::commands::*;

/// Run a node command against a connected session
pub async fn execute<S, W>(
    session: &S,
    command: Commands,
    output: &OutputFormat,
    out: &mut W,
) -> Result<()>
where
    S: Session + ?Sized,
    W: Write,
{
    match command {
        Commands::Create {
            path,
            value,
            flags,
            world,
            acl,
        } => handle_create(session, &path, &value, flags, world, &acl, output, out).await,
        Commands::Set {
            path,
            value,
            node_version,
            auto,
        } => handle_set(session, &path, &value, node_version, auto, output, out).await,
        Commands::Get { path } => handle_get(session, &path, output, out).await,
        Commands::Ls { path } => handle_ls(session, &path, output, out).await,
        Commands::Delete {
            path,
            node_version,
            auto,
            recursive,
        } => handle_delete(session, &path, node_version, auto, recursive, output, out).await,
        Commands::Watch { path, follow } => handle_watch(session, &path, follow, output, out).await,
        Commands::Config { .. } | Commands::Completion { .. } => Err(anyhow::anyhow!(
            "command does not use a coordination-service session"
        )),
    }
}

/// ACL entries for the requested permission flags
pub fn build_acl(flags: &[AclArg]) -> Vec<Acl> {
    let permissions = Permissions::from_flags(flags.iter().copied().map(Permission::from));
    vec![Acl::world(permissions)]
}

/// Handle create command
#[allow(clippy::too_many_arguments)]
pub async fn handle_create<S, W>(
    session: &S,
    path: &str,
    value: &str,
    flags: i32,
    world: bool,
    acl: &[AclArg],
    output: &OutputFormat,
    out: &mut W,
) -> Result<()>
where
    S: Session + ?Sized,
    W: Write,
{
    let path = NodePath::from_cli(path);
    let mode = CreateMode::from_flags(flags)?;
    let acl = build_acl(acl);
    debug!(path = %path, mode = ?mode, world, permissions = acl[0].permissions.bits(), "creating node");

    let created = session
        .create(&path, value.as_bytes(), mode, &acl)
        .await
        .with_context(|| format!("create {}", path))?;

    if let Some(rendered) = format::format_created(&created, mode, output)? {
        out.write_all(rendered.as_bytes())?;
    }
    Ok(())
}

/// Handle set command
pub async fn handle_set<S, W>(
    session: &S,
    path: &str,
    value: &str,
    version: i32,
    auto: bool,
    output: &OutputFormat,
    out: &mut W,
) -> Result<()>
where
    S: Session + ?Sized,
    W: Write,
{
    let path = NodePath::from_cli(path);
    let stat = ops::set(session, &path, value.as_bytes(), Version(version), auto)
        .await
        .with_context(|| format!("set {}", path))?;
    debug!(path = %path, version = stat.version, "node updated");

    if let Some(rendered) = format::format_written(&path, &stat, output)? {
        out.write_all(rendered.as_bytes())?;
    }
    Ok(())
}

/// Handle get command
pub async fn handle_get<S, W>(
    session: &S,
    path: &str,
    output: &OutputFormat,
    out: &mut W,
) -> Result<()>
where
    S: Session + ?Sized,
    W: Write,
{
    let path = NodePath::from_cli(path);
    let (data, stat) = session
        .get(&path)
        .await
        .with_context(|| format!("get {}", path))?;
    debug!(version = stat.version, "node stats");

    out.write_all(&format::format_value(&path, &data, &stat, output)?)?;
    out.flush()?;
    Ok(())
}

/// Handle ls command
pub async fn handle_ls<S, W>(
    session: &S,
    path: &str,
    output: &OutputFormat,
    out: &mut W,
) -> Result<()>
where
    S: Session + ?Sized,
    W: Write,
{
    let path = NodePath::from_cli(path);
    let children = session
        .children(&path)
        .await
        .with_context(|| format!("ls {}", path))?;

    out.write_all(format::format_children(&path, &children, output)?.as_bytes())?;
    Ok(())
}

/// Handle delete command
pub async fn handle_delete<S, W>(
    session: &S,
    path: &str,
    version: i32,
    auto: bool,
    recursive: bool,
    output: &OutputFormat,
    out: &mut W,
) -> Result<()>
where
    S: Session + ?Sized,
    W: Write,
{
    let path = NodePath::from_cli(path);
    ops::delete(session, &path, Version(version), auto, recursive)
        .await
        .with_context(|| format!("delete {}", path))?;
    debug!(path = %path, recursive, "node deleted");

    if let Some(rendered) = format::format_deleted(&path, recursive, output)? {
        out.write_all(rendered.as_bytes())?;
    }
    Ok(())
}

/// Handle watch command
pub async fn handle_watch<S, W>(
    session: &S,
    path: &str,
    follow: bool,
    output: &OutputFormat,
    out: &mut W,
) -> Result<()>
where
    S: Session + ?Sized,
    W: Write,
{
    let path = NodePath::from_cli(path);
    info!(path = %path, follow, "watching node");

    let armed = ops::watch(session, &path, follow, |event| {
        let written = format::format_event(event, output).and_then(|line| {
            out.write_all(line.as_bytes())?;
            out.flush()?;
            Ok(())
        });
        if let Err(e) = written {
            warn!("failed to write event: {}", e);
        }
    })
    .await
    .with_context(|| format!("watch {}", path))?;

    debug!(path = %path, armed, "watch finished");
    Ok(())
}

/// Handle config commands
pub fn handle_config<W: Write>(
    command: ConfigCommands,
    current_config: &CliConfig,
    config_path: Option<&Path>,
    output: &OutputFormat,
    out: &mut W,
) -> Result<()> {
    let path = match config_path {
        Some(path) => path.to_path_buf(),
        None => CliConfig::default_path()?,
    };

    match command {
        ConfigCommands::Show => {
            out.write_all(format::format_config(current_config, output)?.as_bytes())?;
        }
        ConfigCommands::Path => {
            writeln!(out, "{}", path.display())?;
        }
        ConfigCommands::Init { force } => {
            if path.exists() && !force {
                return Err(anyhow::anyhow!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                ));
            }
            current_config.save(&path)?;
            info!("Wrote configuration to {}", path.display());
        }
    }

    Ok(())
}

/// Generate shell completion script
pub fn generate_completion<W: Write>(shell: clap_complete::Shell, out: &mut W) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, out);
}
