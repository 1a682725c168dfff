//! attestd: host binary for the Attest claim verification engine.
//!
//! Loads engine parameters from a TOML file, validates them, and replays
//! JSON scenario scripts against an in-memory ledger.

mod config;
mod script;

use anyhow::Context;
use attest_utils::{format_window, init_logging, LogFormat};
use clap::Parser;
use std::path::PathBuf;

use config::HostConfig;
use script::Scenario;

#[derive(Parser)]
#[command(name = "attestd", about = "Stake-weighted claim verification engine host")]
struct Cli {
    /// Path to a TOML configuration file. Without one, built-in defaults apply.
    #[arg(long, env = "ATTEST_CONFIG")]
    config: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    /// Overrides the config file.
    #[arg(long, env = "ATTEST_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json". Overrides the config file.
    #[arg(long, env = "ATTEST_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Print the effective configuration as JSON.
    Params,

    /// Validate the configuration and exit.
    #[command(name = "check-config")]
    CheckConfig,

    /// Replay a JSON scenario script and print the resulting report.
    Simulate {
        /// Scenario file.
        script: PathBuf,

        /// Abort on the first rejected step.
        #[arg(long)]
        strict: bool,

        /// Print only per-step outcomes and counters instead of the full report.
        #[arg(long)]
        summary: bool,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<HostConfig> {
    let mut config = match &cli.config {
        Some(path) => HostConfig::from_toml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => HostConfig::default(),
    };
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_logging(config.log_format, &config.log_level);

    if let Some(path) = &cli.config {
        tracing::info!("Loaded config from {}", path.display());
    }

    match cli.command {
        Command::Params => {
            println!("{}", config.to_json_string()?);
        }
        Command::CheckConfig => {
            tracing::info!(
                threshold_bps = config.params.consensus_threshold_bps,
                verification_window = %format_window(config.params.verification_window_secs),
                dispute_window = %format_window(config.params.dispute_window_secs),
                "configuration is valid"
            );
            println!("ok");
        }
        Command::Simulate {
            script,
            strict,
            summary,
        } => {
            let raw = std::fs::read_to_string(&script)
                .with_context(|| format!("reading scenario {}", script.display()))?;
            let scenario = Scenario::from_json(&raw)
                .with_context(|| format!("parsing scenario {}", script.display()))?;

            tracing::info!(steps = scenario.steps.len(), strict, "replaying scenario");
            let report = script::run(&scenario, &config, strict)?;

            let elapsed = report.finished_at.as_secs().saturating_sub(config.start_time);
            tracing::info!(
                steps = report.steps.len(),
                failures = report.failures(),
                claims = report.claims.len(),
                simulated = %format_window(elapsed),
                "scenario finished"
            );

            let out = if summary {
                serde_json::to_string_pretty(&report.summary())?
            } else {
                serde_json::to_string_pretty(&report)?
            };
            println!("{out}");
        }
    }

    Ok(())
}
