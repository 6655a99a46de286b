//! CLI configuration management
//!
//! Handles loading and saving CLI-specific configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Longest accepted connection timeout
const MAX_TIMEOUT_MS: u64 = 300_000;

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CliConfig {
    /// Coordination service addresses (`host` or `host:port`)
    pub servers: Vec<String>,

    /// Connection timeout in milliseconds
    pub timeout_ms: u64,

    /// Enable debug logging by default
    pub debug: bool,

    /// Default output format
    pub output_format: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            servers: vec!["127.0.0.1".to_string()],
            timeout_ms: 2000,
            debug: false,
            output_format: "text".to_string(),
        }
    }
}

impl CliConfig {
    /// Load configuration from a file, or defaults if it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize CLI config")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;

        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(xdg_config)
        } else if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home).join(".config")
        } else {
            return Err(anyhow::anyhow!("Cannot determine config directory"));
        };

        Ok(config_dir.join("zkctl").join("config.toml"))
    }

    /// Connection timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Create a new builder for constructing configuration
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Parse a timeout such as `2s`, `500ms`, `1m` or a bare number of seconds
pub fn parse_timeout(raw: &str) -> std::result::Result<Duration, String> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split);

    let value: u64 = digits
        .parse()
        .map_err(|_| format!("invalid timeout '{}'", raw))?;

    match unit.trim() {
        "" | "s" => Ok(Duration::from_secs(value)),
        "ms" => Ok(Duration::from_millis(value)),
        "m" => value
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or_else(|| format!("timeout '{}' too large", raw)),
        other => Err(format!(
            "invalid timeout unit '{}' in '{}'. Use ms, s or m",
            other, raw
        )),
    }
}

/// Builder for CLI configuration with validation and priority chain support
///
/// Priority chain (lowest to highest):
/// 1. Defaults
/// 2. Config file
/// 3. Environment variables
/// 4. CLI arguments
///
/// Apply the layers from highest to lowest priority: each layer only fills
/// values that are still unset.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    servers: Option<Vec<String>>,
    timeout_ms: Option<u64>,
    debug: Option<bool>,
    output_format: Option<String>,
}

impl ConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set server addresses (with validation)
    pub fn with_servers<I, S>(mut self, servers: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let servers = split_servers(servers.into_iter().map(Into::into));
        Self::validate_servers(&servers)?;
        self.servers = Some(servers);
        Ok(self)
    }

    /// Set timeout (with validation)
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        let timeout_ms = timeout.as_millis() as u64;
        Self::validate_timeout(timeout_ms)?;
        self.timeout_ms = Some(timeout_ms);
        Ok(self)
    }

    /// Set debug flag
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }

    /// Set output format (with validation)
    pub fn with_output_format(mut self, format: impl Into<String>) -> Result<Self> {
        let format = format.into();
        Self::validate_output_format(&format)?;
        self.output_format = Some(format);
        Ok(self)
    }

    /// Load configuration from file
    pub fn with_config_file(self, path: Option<&Path>, load_file: bool) -> Result<Self> {
        if !load_file {
            return Ok(self);
        }

        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match CliConfig::default_path() {
                Ok(path) => path,
                Err(_) => return Ok(self),
            },
        };

        let config = CliConfig::load(&path)?;
        let builder = self;
        // Only use file values if they weren't already set (preserving priority)
        Ok(Self {
            servers: builder.servers.or(Some(config.servers)),
            timeout_ms: builder.timeout_ms.or(Some(config.timeout_ms)),
            debug: builder.debug.or(Some(config.debug)),
            output_format: builder.output_format.or(Some(config.output_format)),
        })
    }

    /// Apply environment variable overrides
    pub fn with_env_overrides(mut self) -> Self {
        // Only apply env vars if values weren't already set (preserving priority)
        if self.servers.is_none() {
            if let Ok(servers) = std::env::var("ZKCTL_SERVERS") {
                let servers = split_servers(std::iter::once(servers));
                if Self::validate_servers(&servers).is_ok() {
                    self.servers = Some(servers);
                }
            }
        }

        if self.timeout_ms.is_none() {
            if let Ok(timeout) = std::env::var("ZKCTL_TIMEOUT_MS") {
                if let Ok(timeout) = timeout.parse() {
                    if Self::validate_timeout(timeout).is_ok() {
                        self.timeout_ms = Some(timeout);
                    }
                }
            }
        }

        if self.debug.is_none() {
            if let Ok(debug) = std::env::var("ZKCTL_DEBUG") {
                self.debug = Some(debug.to_lowercase() == "true" || debug == "1");
            }
        }

        if self.output_format.is_none() {
            if let Ok(format) = std::env::var("ZKCTL_FORMAT") {
                if Self::validate_output_format(&format).is_ok() {
                    self.output_format = Some(format);
                }
            }
        }

        self
    }

    /// Build the final configuration with validation
    pub fn build(self) -> Result<CliConfig> {
        let defaults = CliConfig::default();

        let servers = self.servers.unwrap_or(defaults.servers);
        let timeout_ms = self.timeout_ms.unwrap_or(defaults.timeout_ms);
        let output_format = self.output_format.unwrap_or(defaults.output_format);

        // File values arrive unvalidated
        Self::validate_servers(&servers)?;
        Self::validate_timeout(timeout_ms)?;
        Self::validate_output_format(&output_format)?;

        Ok(CliConfig {
            servers,
            timeout_ms,
            debug: self.debug.unwrap_or(defaults.debug),
            output_format,
        })
    }

    fn validate_servers(servers: &[String]) -> Result<()> {
        if servers.is_empty() {
            return Err(anyhow::anyhow!("At least one server address is required"));
        }

        if let Some(bad) = servers.iter().find(|s| s.contains(char::is_whitespace)) {
            return Err(anyhow::anyhow!("Invalid server address '{}'", bad));
        }

        Ok(())
    }

    fn validate_timeout(timeout_ms: u64) -> Result<()> {
        if timeout_ms == 0 {
            return Err(anyhow::anyhow!("Timeout must be greater than 0"));
        }

        if timeout_ms > MAX_TIMEOUT_MS {
            return Err(anyhow::anyhow!(
                "Timeout must be less than or equal to {} seconds",
                MAX_TIMEOUT_MS / 1000
            ));
        }

        Ok(())
    }

    fn validate_output_format(format: &str) -> Result<()> {
        match format {
            "text" | "json" => Ok(()),
            _ => Err(anyhow::anyhow!(
                "Invalid output format '{}'. Must be 'text' or 'json'",
                format
            )),
        }
    }
}

/// Flatten comma-separated entries, dropping empty ones
fn split_servers(entries: impl Iterator<Item = String>) -> Vec<String> {
    entries
        .flat_map(|entry| {
            entry
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
        })
        .collect()
}
