pub mod check;
pub mod config;
pub mod policy;
pub mod risk;
pub mod rules;

use std::path::Path;
use toolgate_pipeline::GatewayConfig;
use toolgate_types::Intent;
use tracing::debug;

use crate::error::{CliError, CliResult};

pub(crate) fn read_text(path: &str) -> CliResult<String> {
    std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_string(),
        source,
    })
}

/// Gateway config from `path`, or the defaults.
pub(crate) fn load_config(path: Option<&str>) -> CliResult<GatewayConfig> {
    match path {
        Some(path) => {
            debug!(path = %path, "Loading gateway config");
            Ok(GatewayConfig::load(path)?)
        }
        None => {
            debug!("No gateway config given, using defaults");
            Ok(GatewayConfig::default())
        }
    }
}

/// Intent from inline JSON (`{...}`) or a JSON file path.
pub(crate) fn read_intent(arg: &str) -> CliResult<Intent> {
    let json = if arg.trim_start().starts_with('{') {
        arg.to_string()
    } else {
        read_text(arg)?
    };
    Ok(serde_json::from_str(&json)?)
}

/// Registry name for a policy file: its stem.
pub(crate) fn policy_name(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}
