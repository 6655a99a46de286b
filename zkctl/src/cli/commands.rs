//! CLI command and subcommand definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use zkctl_core::Permission;

use crate::config::parse_timeout;

/// Command-line client for ZooKeeper
#[derive(Parser, Debug)]
#[command(name = "zkctl")]
#[command(version, about = "cli application for zookeeper", long_about = None)]
pub struct Cli {
    /// Enable debug output
    #[arg(short = 'D', long, global = true)]
    pub debug: bool,

    /// Connection timeout, e.g. 2s or 500ms (default: 2s)
    #[arg(short = 't', long, global = true, value_parser = parse_timeout)]
    pub timeout: Option<Duration>,

    /// ZooKeeper node addresses (repeatable or comma-separated, default: 127.0.0.1)
    #[arg(long = "zk", global = true, value_delimiter = ',')]
    pub zk: Vec<String>,

    /// Output format (overrides config file)
    #[arg(long, value_enum, global = true)]
    pub format: Option<OutputFormat>,

    /// Don't load config file
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Config file path (default: ~/.config/zkctl/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Plain output
    Text,
    /// JSON output
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
        }
    }
}

impl From<&OutputFormat> for crate::format::OutputFormat {
    fn from(format: &OutputFormat) -> Self {
        match format {
            OutputFormat::Text => crate::format::OutputFormat::Text,
            OutputFormat::Json => crate::format::OutputFormat::Json,
        }
    }
}

/// ACL permission name
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum AclArg {
    All,
    Create,
    Write,
    Read,
    Delete,
    Admin,
}

impl From<AclArg> for Permission {
    fn from(arg: AclArg) -> Self {
        match arg {
            AclArg::All => Permission::All,
            AclArg::Create => Permission::Create,
            AclArg::Write => Permission::Write,
            AclArg::Read => Permission::Read,
            AclArg::Delete => Permission::Delete,
            AclArg::Admin => Permission::Admin,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a node
    Create {
        /// Node path
        path: String,

        /// Node value
        #[arg(default_value = "")]
        value: String,

        /// Create flags: 0 persistent, 1 ephemeral, 2 sequential, 3 both
        #[arg(short = 'v', long = "version", default_value_t = 0)]
        flags: i32,

        /// Set world ACL
        #[arg(short, long)]
        world: bool,

        /// ACL used on create. default is all
        #[arg(short, long = "acl", value_enum, value_delimiter = ',')]
        acl: Vec<AclArg>,
    },

    /// Set a key's value
    Set {
        /// Node path
        path: String,

        /// New value
        #[arg(default_value = "")]
        value: String,

        /// Node version (-1 skips the check)
        #[arg(short = 'v', long = "version", default_value_t = 0, allow_negative_numbers = true)]
        node_version: i32,

        /// Automatically set the version based on the current node
        #[arg(long)]
        auto: bool,
    },

    /// Get a key's value
    Get {
        /// Node path
        path: String,
    },

    /// List nodes
    Ls {
        /// Node path
        #[arg(default_value = "/")]
        path: String,
    },

    /// Delete a key
    Delete {
        /// Node path
        path: String,

        /// Node version (-1 skips the check)
        #[arg(short = 'v', long = "version", default_value_t = 0, allow_negative_numbers = true)]
        node_version: i32,

        /// Automatically set the version based on the current node
        #[arg(long)]
        auto: bool,

        /// Recursively delete keys within the path
        #[arg(short, long)]
        recursive: bool,
    },

    /// Watch a key for changes
    Watch {
        /// Node path
        path: String,

        /// Keep watching forever
        #[arg(short, long)]
        follow: bool,
    },

    /// Show or manage CLI configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

impl Commands {
    /// Whether the command talks to the coordination service
    pub fn needs_session(&self) -> bool {
        !matches!(self, Commands::Config { .. } | Commands::Completion { .. })
    }
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Print the configuration file path
    Path,

    /// Write the current configuration to the config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags() {
        let cli = parse(&[
            "zkctl", "--zk", "a:2181,b", "--zk", "c", "-t", "500ms", "-D", "get", "/x",
        ]);

        assert_eq!(cli.zk, vec!["a:2181", "b", "c"]);
        assert_eq!(cli.timeout, Some(Duration::from_millis(500)));
        assert!(cli.debug);
        assert!(matches!(cli.command, Commands::Get { ref path } if path == "/x"));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&["zkctl", "ls", "/", "--zk", "zk1", "--format", "json"]);
        assert_eq!(cli.zk, vec!["zk1"]);
        assert_eq!(cli.format, Some(OutputFormat::Json));
    }

    #[test]
    fn test_create_flags() {
        let cli = parse(&[
            "zkctl", "create", "/a", "hello", "--acl", "read", "-a", "write", "-w",
        ]);

        match cli.command {
            Commands::Create {
                path,
                value,
                flags,
                world,
                acl,
            } => {
                assert_eq!(path, "/a");
                assert_eq!(value, "hello");
                assert_eq!(flags, 0);
                assert!(world);
                assert_eq!(acl, vec![AclArg::Read, AclArg::Write]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_create_rejects_unknown_permission() {
        assert!(Cli::try_parse_from(["zkctl", "create", "/a", "x", "--acl", "execute"]).is_err());
    }

    #[test]
    fn test_set_defaults_to_version_zero() {
        let cli = parse(&["zkctl", "set", "/a", "v"]);
        assert!(matches!(
            cli.command,
            Commands::Set { node_version: 0, auto: false, .. }
        ));

        let cli = parse(&["zkctl", "set", "/a", "v", "--version", "3", "--auto"]);
        assert!(matches!(
            cli.command,
            Commands::Set { node_version: 3, auto: true, .. }
        ));
    }

    #[test]
    fn test_delete_flags() {
        let cli = parse(&["zkctl", "delete", "/a", "-r"]);
        assert!(matches!(
            cli.command,
            Commands::Delete { recursive: true, auto: false, node_version: 0, .. }
        ));

        let cli = parse(&["zkctl", "delete", "/a", "-v", "-1"]);
        assert!(matches!(cli.command, Commands::Delete { node_version: -1, .. }));
    }

    #[test]
    fn test_watch_follow() {
        let cli = parse(&["zkctl", "watch", "/a", "-f"]);
        assert!(matches!(cli.command, Commands::Watch { follow: true, .. }));
        assert!(cli.command.needs_session());
    }

    #[test]
    fn test_ls_defaults_to_root() {
        let cli = parse(&["zkctl", "ls"]);
        assert!(matches!(cli.command, Commands::Ls { ref path } if path == "/"));
    }

    #[test]
    fn test_config_needs_no_session() {
        let cli = parse(&["zkctl", "config", "show"]);
        assert!(!cli.command.needs_session());
    }

    #[test]
    fn test_bad_timeout_rejected() {
        assert!(Cli::try_parse_from(["zkctl", "-t", "soon", "get", "/a"]).is_err());
    }
}
