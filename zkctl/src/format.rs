//! Output formatting utilities for the CLI
//!
//! Text output stays close to what shell scripts expect: raw values, one
//! path per line. JSON output wraps the same data with node metadata.

use anyhow::Result;
use serde_json::json;
use zkctl_core::{CreateMode, NodePath, Stat, WatchEvent};

use crate::config::CliConfig;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    /// Parse a validated config value, falling back to text
    pub fn from_config(value: &str) -> Self {
        match value {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Text,
        }
    }
}

/// Render a node value. Text output is the raw bytes with nothing appended.
pub fn format_value(
    path: &NodePath,
    data: &[u8],
    stat: &Stat,
    format: &OutputFormat,
) -> Result<Vec<u8>> {
    match format {
        OutputFormat::Text => Ok(data.to_vec()),
        OutputFormat::Json => {
            let value = json!({
                "path": path,
                "data": String::from_utf8_lossy(data),
                "stat": stat,
            });
            let mut out = serde_json::to_vec_pretty(&value)?;
            out.push(b'\n');
            Ok(out)
        }
    }
}

/// Render the full paths of a node's immediate children
pub fn format_children(
    parent: &NodePath,
    children: &[String],
    format: &OutputFormat,
) -> Result<String> {
    let paths: Vec<NodePath> = children.iter().map(|c| parent.join(c)).collect();

    match format {
        OutputFormat::Text => Ok(paths.iter().map(|p| format!("{}\n", p)).collect()),
        OutputFormat::Json => Ok(format!("{}\n", serde_json::to_string_pretty(&paths)?)),
    }
}

/// Render one watch event as a single line
pub fn format_event(event: &WatchEvent, format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(format!("{}\n", event)),
        OutputFormat::Json => Ok(format!("{}\n", serde_json::to_string(event)?)),
    }
}

/// Render the result of a create.
///
/// Text output only names the node when the server picked the name.
pub fn format_created(
    created: &NodePath,
    mode: CreateMode,
    format: &OutputFormat,
) -> Result<Option<String>> {
    match format {
        OutputFormat::Text if mode.is_sequential() => Ok(Some(format!("{}\n", created))),
        OutputFormat::Text => Ok(None),
        OutputFormat::Json => {
            let value = json!({ "created": created, "mode": mode });
            Ok(Some(format!("{}\n", serde_json::to_string_pretty(&value)?)))
        }
    }
}

/// Render the result of a set
pub fn format_written(path: &NodePath, stat: &Stat, format: &OutputFormat) -> Result<Option<String>> {
    match format {
        OutputFormat::Text => Ok(None),
        OutputFormat::Json => {
            let value = json!({ "path": path, "stat": stat });
            Ok(Some(format!("{}\n", serde_json::to_string_pretty(&value)?)))
        }
    }
}

/// Render the result of a delete
pub fn format_deleted(
    path: &NodePath,
    recursive: bool,
    format: &OutputFormat,
) -> Result<Option<String>> {
    match format {
        OutputFormat::Text => Ok(None),
        OutputFormat::Json => {
            let value = json!({ "deleted": path, "recursive": recursive });
            Ok(Some(format!("{}\n", serde_json::to_string_pretty(&value)?)))
        }
    }
}

/// Render the effective configuration
pub fn format_config(config: &CliConfig, format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(format!("{}\n", serde_json::to_string_pretty(config)?)),
        OutputFormat::Text => {
            let mut output = String::new();
            output.push_str("CLI Configuration:\n");
            output.push_str(&format!("{:<20} Value\n", "Setting"));
            output.push_str(&format!("{}\n", "-".repeat(40)));
            output.push_str(&format!("{:<20} {}\n", "Servers", config.servers.join(",")));
            output.push_str(&format!("{:<20} {}ms\n", "Timeout", config.timeout_ms));
            output.push_str(&format!("{:<20} {}\n", "Debug", config.debug));
            output.push_str(&format!("{:<20} {}\n", "Output Format", config.output_format));
            Ok(output)
        }
    }
}
