pub mod compliance;
pub mod delegation;
pub mod nl_policy;
pub mod policy;
pub mod risk;

pub use compliance::ComplianceStage;
pub use delegation::DelegationStage;
pub use nl_policy::NlPolicyStage;
pub use policy::PolicyStage;
pub use risk::RiskStage;

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::context::{StageId, StageOutcome};
use crate::error::CollaboratorError;

/// Bound a collaborator call; an elapsed timeout becomes `TimedOut`.
pub(crate) async fn bounded<T, F>(timeout: Duration, call: F) -> Result<T, CollaboratorError>
where
    F: Future<Output = Result<T, CollaboratorError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(CollaboratorError::TimedOut),
    }
}

/// Outcome for a stage whose collaborator is not configured.
pub(crate) fn unavailable(stage: StageId, what: &str) -> StageOutcome {
    StageOutcome::pass(stage, format!("unavailable: {} not configured", what))
        .with_meta("unavailable", true)
}

/// Fold a collaborator failure into an outcome. Only `Unavailable` passes.
pub(crate) fn collaborator_failure(stage: StageId, err: CollaboratorError) -> StageOutcome {
    match err {
        CollaboratorError::Unavailable(detail) => {
            StageOutcome::pass(stage, format!("unavailable: {}", detail))
                .with_meta("unavailable", true)
        }
        CollaboratorError::TimedOut => {
            warn!(stage = %stage, "Collaborator timed out");
            StageOutcome::fail(stage, "collaborator timed out").with_meta("timed_out", true)
        }
        CollaboratorError::Internal(detail) => {
            warn!(stage = %stage, error = %detail, "Collaborator failed");
            StageOutcome::fail(stage, format!("collaborator error: {}", detail))
        }
    }
}
