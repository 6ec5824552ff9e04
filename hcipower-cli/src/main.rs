//! hcipower CLI
//!
//! Gated power-off and power-on of hyper-converged storage clusters

mod commands;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commands::power;
use hcipower_common::{ClusterRef, PowerAction};
use hcipower_core::client::ManagementClient;
use hcipower_core::config::PowerConfig;
use hcipower_core::{Orchestrator, OrchestratorSettings};
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Management server address (overrides the config file)
    #[arg(short, long, global = true)]
    server: Option<String>,

    /// Output format (table, json, yaml)
    #[arg(short, long, default_value = "table", global = true)]
    output: String,

    /// Delay between task status queries, in milliseconds
    #[arg(long, global = true)]
    poll_interval_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Power off every host of a cluster after a health precheck
    Poweroff {
        /// Cluster identifier
        cluster: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Power on every host of a cluster after a connectivity precheck
    Poweron {
        /// Cluster identifier
        cluster: String,
    },
    /// Evaluate the precheck of an action without performing it
    Precheck {
        /// Action to check (poweroff, poweron)
        action: String,
        /// Cluster identifier
        cluster: String,
    },
    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    if let Commands::Completions { shell } = cli.command {
        generate_completions(shell);
        return Ok(());
    }

    // Reject an unknown action before any config or network work
    if let Commands::Precheck { ref action, .. } = cli.command {
        action.parse::<PowerAction>()?;
    }

    let config = load_config(&cli)?;

    let _log_guard = config
        .logging
        .init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    let client = ManagementClient::from_config(&config.management)
        .context("failed to set up the management client")?;
    tracing::debug!(server = %client.base_url(), "Using management service");

    let orchestrator = Orchestrator::new(Arc::new(client), OrchestratorSettings::from(&config));

    match cli.command {
        Commands::Poweroff { cluster, yes } => {
            let confirm = if yes {
                power::assume_yes
            } else {
                power::prompt_confirmation
            };
            power::handle_power_command(
                orchestrator,
                &ClusterRef::new(cluster),
                PowerAction::PowerOff,
                confirm,
                &cli.output,
            )
            .await?
        }
        Commands::Poweron { cluster } => {
            power::handle_power_command(
                orchestrator,
                &ClusterRef::new(cluster),
                PowerAction::PowerOn,
                power::assume_yes,
                &cli.output,
            )
            .await?
        }
        Commands::Precheck { action, cluster } => {
            commands::precheck::handle_precheck_command(
                &orchestrator,
                &ClusterRef::new(cluster),
                &action,
                &cli.output,
            )
            .await?
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}

/// Config file and environment first, command-line flags last
fn load_config(cli: &Cli) -> Result<PowerConfig> {
    let mut config = PowerConfig::load().context("failed to load configuration")?;

    if let Some(ref server) = cli.server {
        config.management.server = server.clone();
    }
    if let Some(interval) = cli.poll_interval_ms {
        config.polling.interval_ms = interval;
    }
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }

    config.validate().context("invalid command-line settings")?;
    Ok(config)
}

/// Generate shell completions
fn generate_completions(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();

    generate(shell, &mut cmd, name, &mut io::stdout());
}
