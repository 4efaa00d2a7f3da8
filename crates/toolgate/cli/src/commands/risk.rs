//! Risk scoring commands

use clap::Subcommand;
use serde::Serialize;
use tabled::Tabled;

use crate::commands::{load_config, read_intent};
use crate::error::CliResult;
use crate::output::{self, OutputFormat};

#[derive(Subcommand)]
pub enum RiskCommands {
    /// Score an intent against the configured risk policy
    Score {
        /// Gateway config (YAML)
        #[arg(short, long, env = "TOOLGATE_CONFIG")]
        config: Option<String>,

        /// Intent as inline JSON or a path to a JSON file
        #[arg(short, long)]
        intent: String,
    },
}

#[derive(Debug, Serialize, Tabled)]
struct FactorRow {
    factor: String,
    value: String,
    detail: String,
}

pub fn execute(command: RiskCommands, format: OutputFormat) -> CliResult<()> {
    match command {
        RiskCommands::Score { config, intent } => {
            let config = load_config(config.as_deref())?;
            let intent = read_intent(&intent)?;
            let decision = config
                .risk
                .scorer
                .score_and_gate(&intent, &config.risk.policy);

            if format != OutputFormat::Table {
                return output::print_single(&decision, format);
            }

            let rows: Vec<FactorRow> = decision
                .score
                .factors
                .iter()
                .map(|f| FactorRow {
                    factor: f.name.clone(),
                    value: format!("{:+.3}", f.value),
                    detail: f.detail.clone(),
                })
                .collect();
            output::print_output(rows, format)?;
            let summary = format!(
                "score {:.3} ({}), {}",
                decision.score.score,
                decision.score.level,
                decision.verdict
            );
            if decision.acceptable {
                output::print_success(&summary);
            } else {
                output::print_warning(&summary);
            }
            for hint in &decision.score.mitigations {
                output::print_info(hint);
            }
            Ok(())
        }
    }
}
