//! Natural-language policy commands

use chrono::{DateTime, Utc};
use clap::Subcommand;
use serde::Serialize;
use std::sync::Arc;
use tabled::Tabled;
use toolgate_nl_policy::{
    CompiledPolicy, GateRequest, NlPolicyCompiler, PolicyGate, PolicyRegistry,
};

use crate::commands::{policy_name, read_text};
use crate::error::{CliError, CliResult};
use crate::output::{self, OutputFormat};

#[derive(Subcommand)]
pub enum PolicyCommands {
    /// Compile a policy text file into deontic clauses
    Compile {
        /// Path to the policy text
        file: String,
    },

    /// Evaluate an actor/tool pair against one or more policy files
    Evaluate {
        /// Policy text files; each is registered under its file stem
        #[arg(short, long = "policy", required = true)]
        policies: Vec<String>,

        #[arg(short, long)]
        actor: String,

        #[arg(short, long)]
        tool: String,

        #[arg(short, long)]
        resource: Option<String>,

        /// Evaluation time (RFC 3339); defaults to now
        #[arg(long)]
        at: Option<String>,
    },
}

#[derive(Debug, Serialize, Tabled)]
struct ClauseRow {
    kind: String,
    actor: String,
    action: String,
    resource: String,
}

pub fn execute(command: PolicyCommands, format: OutputFormat) -> CliResult<()> {
    match command {
        PolicyCommands::Compile { file } => {
            let text = read_text(&file)?;
            let compiled = NlPolicyCompiler::new().compile(&text);
            print_compiled(&compiled, format)
        }
        PolicyCommands::Evaluate {
            policies,
            actor,
            tool,
            resource,
            at,
        } => {
            let registry = Arc::new(PolicyRegistry::default());
            for path in &policies {
                registry.register_text(policy_name(path), read_text(path)?);
            }
            let gate = PolicyGate::new(registry);

            let mut request = GateRequest::new(actor, tool);
            if let Some(resource) = resource {
                request = request.resource(resource);
            }
            if let Some(at) = at {
                let at = DateTime::parse_from_rfc3339(&at)
                    .map_err(|e| CliError::InvalidArgument(format!("--at {}: {}", at, e)))?;
                request = request.at(at.with_timezone(&Utc));
            }

            let decision = gate.evaluate(&request);
            if format != OutputFormat::Table {
                return output::print_single(&decision, format);
            }
            if decision.is_allowed() {
                output::print_success(&decision.justification);
            } else {
                output::print_error(&decision.justification);
            }
            Ok(())
        }
    }
}

fn print_compiled(compiled: &CompiledPolicy, format: OutputFormat) -> CliResult<()> {
    if format != OutputFormat::Table {
        return output::print_single(compiled, format);
    }
    let rows: Vec<ClauseRow> = compiled
        .clauses
        .iter()
        .map(|c| ClauseRow {
            kind: c.kind.to_string(),
            actor: c.actor.clone(),
            action: c.action.clone(),
            resource: c.resource.clone().unwrap_or_else(|| "-".into()),
        })
        .collect();
    output::print_output(rows, format)?;
    output::print_info(&format!(
        "{:?}: {}/{} sentences matched, digest {}",
        compiled.metadata.method,
        compiled.metadata.matched_sentences,
        compiled.metadata.sentences,
        compiled.source_digest.short()
    ));
    for warning in &compiled.metadata.warnings {
        output::print_warning(warning);
    }
    Ok(())
}
