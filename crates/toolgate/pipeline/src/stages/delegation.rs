use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::context::{GateContext, StageId, StageOutcome};
use crate::stages::{bounded, collaborator_failure, unavailable};
use crate::traits::{DelegationEvaluator, DelegationRequest, GateStage};

/// Stage 3: Delegation
///
/// Opt-in per invocation: without a delegation anchor in the check context
/// the stage passes trivially.
pub struct DelegationStage {
    evaluator: Option<Arc<dyn DelegationEvaluator>>,
    timeout: Duration,
}

impl DelegationStage {
    pub fn new(evaluator: Option<Arc<dyn DelegationEvaluator>>, timeout: Duration) -> Self {
        Self { evaluator, timeout }
    }
}

#[async_trait]
impl GateStage for DelegationStage {
    fn stage_id(&self) -> StageId {
        StageId::Delegation
    }

    async fn evaluate(&self, context: &GateContext) -> StageOutcome {
        let Some(anchor) = &context.check.delegation else {
            return StageOutcome::pass(StageId::Delegation, "no delegation anchor");
        };
        let Some(evaluator) = &self.evaluator else {
            return unavailable(StageId::Delegation, "delegation evaluator");
        };

        let request = DelegationRequest {
            leaf_capability_id: anchor.leaf_capability_id.clone(),
            resource: anchor.resource.clone(),
            ability: anchor.ability.clone(),
            actor: context.intent.actor().to_string(),
        };

        match bounded(self.timeout, evaluator.can_invoke(&request)).await {
            Ok(check) => {
                let outcome = if check.allowed {
                    StageOutcome::pass(StageId::Delegation, check.reason)
                } else {
                    StageOutcome::fail(StageId::Delegation, check.reason)
                };
                outcome
                    .with_meta("capability", anchor.leaf_capability_id.as_str())
                    .with_meta("ability", anchor.ability.as_str())
            }
            Err(err) => collaborator_failure(StageId::Delegation, err),
        }
    }
}
