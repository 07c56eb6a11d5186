//! ProfileSync - profile update trigger host
//!
//! Main entry point for the `profilesync` command.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use profilesync_domain::Config;
use profilesync_functions::logging::init_logging;
use profilesync_functions::{read_events, AppContext};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "profilesync", version, about = "Sync identity profile changes into the document store")]
struct Cli {
    /// Configuration file (JSON or TOML); otherwise environment, probed files, defaults
    #[arg(long, short, env = "PROFILESYNC_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Replay newline-delimited profile update events through the handler
    Replay {
        /// Events file; reads stdin when omitted or "-"
        input: Option<PathBuf>,
    },
    /// Print the effective configuration as JSON
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // .env is optional
    let dotenv = dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = load_config(cli.config.clone())?;

    match cli.command {
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&redacted(config))?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Replay { input } => {
            init_logging(&config.logging)?;
            if let Some(path) = dotenv {
                info!(path = %path.display(), "loaded .env");
            }
            replay(config, input).await
        }
    }
}

async fn replay(config: Config, input: Option<PathBuf>) -> anyhow::Result<ExitCode> {
    let ctx = AppContext::init(config).context("failed to initialise application context")?;

    let events = match input.filter(|path| path.as_os_str() != "-") {
        Some(path) => {
            let file = File::open(&path)
                .with_context(|| format!("failed to open events file {}", path.display()))?;
            read_events(BufReader::new(file))?
        }
        None => read_events(io::stdin().lock())?,
    };
    info!(events = events.len(), "replaying events");

    let summary = ctx.runtime().dispatch(events).await;
    info!(
        events = summary.events,
        deliveries = summary.deliveries,
        failures = summary.failures.len(),
        "replay finished"
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(if summary.has_failures() { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => {
            let config = profilesync_infra::config::load_from_file(Some(path.clone()))
                .with_context(|| format!("failed to load config from {}", path.display()))?;
            config.validate()?;
            config
        }
        None => profilesync_infra::config::load()?,
    };
    Ok(config)
}

fn redacted(mut config: Config) -> Config {
    if config.store.api_token.is_some() {
        config.store.api_token = Some("<redacted>".into());
    }
    config
}
