//! Compliance rule commands

use clap::Subcommand;
use serde::Serialize;
use tabled::Tabled;
use toolgate_compliance::{ComplianceChecker, RuleInfo};

use crate::commands::load_config;
use crate::error::CliResult;
use crate::output::{self, OutputFormat};

#[derive(Subcommand)]
pub enum RulesCommands {
    /// List the compliance rules a gateway would evaluate
    List {
        /// Gateway config (YAML)
        #[arg(short, long, env = "TOOLGATE_CONFIG")]
        config: Option<String>,
    },
}

#[derive(Debug, Serialize, Tabled)]
struct RuleRow {
    id: String,
    description: String,
}

impl From<RuleInfo> for RuleRow {
    fn from(info: RuleInfo) -> Self {
        Self {
            id: info.id,
            description: info.description,
        }
    }
}

pub fn execute(command: RulesCommands, format: OutputFormat) -> CliResult<()> {
    match command {
        RulesCommands::List { config } => {
            let config = load_config(config.as_deref())?;
            let checker = ComplianceChecker::with_builtin_rules(&config.compliance);
            let rows: Vec<RuleRow> = checker.list_rules().into_iter().map(Into::into).collect();
            output::print_output(rows, format)
        }
    }
}
