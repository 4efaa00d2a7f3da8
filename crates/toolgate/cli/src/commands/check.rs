//! Run an intent through the dispatch pipeline

use clap::Args;
use colored::*;
use serde::Serialize;
use tabled::Tabled;
use toolgate_pipeline::{CheckContext, PipelineResult};

use crate::commands::{load_config, read_intent};
use crate::error::{CliError, CliResult};
use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct CheckArgs {
    /// Gateway config (YAML)
    #[arg(short, long, env = "TOOLGATE_CONFIG")]
    config: Option<String>,

    /// Intent as inline JSON or a path to a JSON file
    #[arg(short, long)]
    intent: String,

    /// Resource the invocation targets
    #[arg(short, long)]
    resource: Option<String>,

    /// Exit with an error when the intent is denied
    #[arg(long)]
    fail_on_deny: bool,
}

/// Table row for a stage outcome
#[derive(Debug, Serialize, Tabled)]
struct StageRow {
    stage: String,
    passed: String,
    reason: String,
}

pub async fn execute(args: CheckArgs, format: OutputFormat) -> CliResult<()> {
    let config = load_config(args.config.as_deref())?;
    let intent = read_intent(&args.intent)?;
    let pipeline = config.build_pipeline();

    let mut context = CheckContext::new();
    if let Some(resource) = args.resource {
        context = context.resource(resource);
    }
    let result = pipeline.check(&intent, &context).await;

    match format {
        OutputFormat::Table => print_table(&result),
        OutputFormat::Json | OutputFormat::Yaml => output::print_single(&result.to_value(), format)?,
    }

    match (args.fail_on_deny, result.blocking_stage) {
        (true, Some(stage)) => Err(CliError::Denied(stage.to_string())),
        _ => Ok(()),
    }
}

fn print_table(result: &PipelineResult) {
    let rows: Vec<StageRow> = result
        .outcomes
        .iter()
        .map(|o| StageRow {
            stage: o.stage.to_string(),
            passed: if o.passed { "yes".into() } else { "no".into() },
            reason: o.reason.clone(),
        })
        .collect();
    println!("{}", tabled::Table::new(rows));
    if result.allowed {
        output::print_success("allowed");
    } else {
        println!(
            "{} denied by {}",
            "✗".red(),
            result
                .blocking_stage
                .map(|s| s.to_string())
                .unwrap_or_default()
                .bold()
        );
    }
}
