//! zkctl
//!
//! Command-line client for ZooKeeper-style coordination services.

use anyhow::Result;
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use zkctl::cli::{execute, generate_completion, handle_config, Cli, Commands};
use zkctl::client::ZkSession;
use zkctl::config::CliConfig;
use zkctl::format::OutputFormat;
use zkctl_core::Session;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Completion { shell } = cli.command {
        generate_completion(shell, &mut std::io::stdout());
        return Ok(());
    }

    // Build configuration, highest priority first: CLI args → env → file → defaults
    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_tracing(config.debug);

    let output = OutputFormat::from_config(&config.output_format);

    if let Commands::Config { command } = cli.command {
        if let Err(e) = handle_config(
            command,
            &config,
            cli.config.as_deref(),
            &output,
            &mut std::io::stdout(),
        ) {
            error!("{:#}", e);
            std::process::exit(1);
        }
        return Ok(());
    }

    let session = match ZkSession::connect(&config.servers, config.timeout()).await {
        Ok(session) => session,
        Err(e) => {
            error!("Cannot connect to {}: {}", config.servers.join(","), e);
            std::process::exit(1);
        }
    };

    let result = {
        let mut stdout = std::io::stdout().lock();
        tokio::select! {
            result = execute(&session, cli.command, &output, &mut stdout) => result,
            _ = signal::ctrl_c() => {
                info!("Interrupted");
                Ok(())
            }
        }
    };

    // Closed exactly once, whatever the command's outcome
    if let Err(e) = session.close().await {
        warn!("Failed to close session: {}", e);
    }

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

fn build_config(cli: &Cli) -> Result<CliConfig> {
    let mut builder = CliConfig::builder();

    if !cli.zk.is_empty() {
        builder = builder.with_servers(cli.zk.iter().cloned())?;
    }
    if let Some(timeout) = cli.timeout {
        builder = builder.with_timeout(timeout)?;
    }
    if cli.debug {
        builder = builder.with_debug(true);
    }
    if let Some(ref format) = cli.format {
        builder = builder.with_output_format(format.as_str())?;
    }

    builder
        .with_env_overrides()
        .with_config_file(cli.config.as_deref(), !cli.no_config)?
        .build()
}

fn init_tracing(debug: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,zookeeper=warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
