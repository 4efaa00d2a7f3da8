use thiserror::Error;
use toolgate_nl_policy::PolicyRegistryError;
use toolgate_types::CidError;

use crate::context::StageId;

/// Failure reported by an external collaborator.
///
/// Stages branch on the variant: `Unavailable` passes the stage,
/// `TimedOut` and `Internal` fail it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),

    #[error("collaborator timed out")]
    TimedOut,

    #[error("collaborator error: {0}")]
    Internal(String),
}

/// Errors from the Dispatch Pipeline and its administration surface.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("stage not configured: {0}")]
    StageNotConfigured(StageId),

    #[error("content addressing failed: {0}")]
    Cid(#[from] CidError),

    #[error("policy registry error: {0}")]
    PolicyRegistry(#[from] PolicyRegistryError),
}

/// Errors loading a gateway configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
