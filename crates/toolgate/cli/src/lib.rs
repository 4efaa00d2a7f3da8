//! Toolgate CLI - Command-line interface for the tool-dispatch gateway
//!
//! Operators use it to:
//! - Run an intent through the dispatch pipeline and see every stage outcome
//! - Score an intent's risk against the configured policy
//! - Compile natural-language policies and evaluate requests against them
//! - Inspect compliance rules and the effective gateway configuration

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::ffi::OsString;
use tabled::Tabled;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod error;
mod output;

use commands::{check, config, policy, risk, rules};
pub use error::{CliError, CliResult};
pub use output::OutputFormat;

/// Toolgate CLI application
#[derive(Parser)]
#[command(name = "toolgate")]
#[command(about = "Toolgate - policy gateway for agent tool dispatch", long_about = None)]
#[command(version)]
struct Cli {
    /// Output format (table, json, yaml)
    #[arg(short, long, default_value = "table")]
    output: OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check an intent against the dispatch pipeline
    Check(check::CheckArgs),

    /// Risk scoring
    Risk {
        #[command(subcommand)]
        command: risk::RiskCommands,
    },

    /// Natural-language policies
    Policy {
        #[command(subcommand)]
        command: policy::PolicyCommands,
    },

    /// Compliance rules
    Rules {
        #[command(subcommand)]
        command: rules::RulesCommands,
    },

    /// Gateway configuration
    Config {
        #[command(subcommand)]
        command: config::ConfigCommands,
    },

    /// Show the stage order of the configured pipeline
    Stages {
        #[arg(short, long, env = "TOOLGATE_CONFIG")]
        config: Option<String>,
    },
}

/// Run using the current process arguments.
pub async fn run() -> CliResult<()> {
    run_with_args(std::env::args_os()).await
}

/// Run using the provided argument iterator.
pub async fn run_with_args<I, T>(args: I) -> CliResult<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    let filter = if cli.verbose { "debug" } else { "info" };
    // stdout carries command output; logs go to stderr.
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .try_init();

    match cli.command {
        Commands::Check(args) => check::execute(args, cli.output).await,
        Commands::Risk { command } => risk::execute(command, cli.output),
        Commands::Policy { command } => policy::execute(command, cli.output),
        Commands::Rules { command } => rules::execute(command, cli.output),
        Commands::Config { command } => config::execute(command, cli.output),
        Commands::Stages { config } => show_stages(config.as_deref(), cli.output),
    }
}

#[derive(Debug, Serialize, Tabled)]
struct StageRow {
    order: usize,
    stage: String,
}

fn show_stages(config: Option<&str>, format: OutputFormat) -> CliResult<()> {
    let config = commands::load_config(config)?;
    let rows: Vec<StageRow> = config
        .build_pipeline()
        .stage_ids()
        .into_iter()
        .enumerate()
        .map(|(i, stage)| StageRow {
            order: i + 1,
            stage: stage.to_string(),
        })
        .collect();
    output::print_output(rows, format)
}
