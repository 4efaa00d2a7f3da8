use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use toolgate_types::{Intent, Verdict};

use crate::context::{GateContext, StageId, StageOutcome};
use crate::error::CollaboratorError;

/// GateStage trait - one stage of the dispatch pipeline.
///
/// Stages are evaluated sequentially; the first outcome with
/// `passed = false` halts the pipeline. A stage never errors: collaborator
/// failures are folded into its outcome.
#[async_trait]
pub trait GateStage: Send + Sync {
    fn stage_id(&self) -> StageId;

    async fn evaluate(&self, context: &GateContext) -> StageOutcome;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationRequest {
    pub leaf_capability_id: String,
    pub resource: String,
    pub ability: String,
    pub actor: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationCheck {
    pub allowed: bool,
    pub reason: String,
}

/// Capability-delegation chain evaluator.
#[async_trait]
pub trait DelegationEvaluator: Send + Sync {
    async fn can_invoke(
        &self,
        request: &DelegationRequest,
    ) -> Result<DelegationCheck, CollaboratorError>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalDecision {
    pub decision: Verdict,
    #[serde(default)]
    pub obligations: Vec<String>,
    #[serde(default)]
    pub reason: String,
}

/// Temporal deontic policy evaluator used by the policy stage.
#[async_trait]
pub trait TemporalPolicyEvaluator: Send + Sync {
    async fn evaluate(
        &self,
        intent: &Intent,
        policy: &Value,
        actor: &str,
    ) -> Result<TemporalDecision, CollaboratorError>;
}
