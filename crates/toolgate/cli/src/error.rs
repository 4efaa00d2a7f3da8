//! CLI error types

use thiserror::Error;
use toolgate_pipeline::{ConfigError, PipelineError};

/// CLI error type
#[derive(Error, Debug)]
pub enum CliError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Denied by {0} stage")]
    Denied(String),
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
