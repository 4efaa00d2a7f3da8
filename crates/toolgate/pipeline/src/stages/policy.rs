use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::context::{GateContext, StageId, StageOutcome};
use crate::stages::{bounded, collaborator_failure, unavailable};
use crate::traits::{GateStage, TemporalPolicyEvaluator};

/// Stage 4: Policy
///
/// Evaluates the configured policy object with the temporal policy
/// evaluator. Passes on `allow` and `allow_with_obligations`; obligations
/// are carried in the outcome metadata.
pub struct PolicyStage {
    evaluator: Option<Arc<dyn TemporalPolicyEvaluator>>,
    policy: Option<Value>,
    timeout: Duration,
}

impl PolicyStage {
    pub fn new(
        evaluator: Option<Arc<dyn TemporalPolicyEvaluator>>,
        policy: Option<Value>,
        timeout: Duration,
    ) -> Self {
        Self {
            evaluator,
            policy,
            timeout,
        }
    }
}

#[async_trait]
impl GateStage for PolicyStage {
    fn stage_id(&self) -> StageId {
        StageId::Policy
    }

    async fn evaluate(&self, context: &GateContext) -> StageOutcome {
        let Some(policy) = &self.policy else {
            return StageOutcome::pass(StageId::Policy, "no policy object configured");
        };
        let Some(evaluator) = &self.evaluator else {
            return unavailable(StageId::Policy, "temporal policy evaluator");
        };

        let call = evaluator.evaluate(&context.intent, policy, context.intent.actor());
        match bounded(self.timeout, call).await {
            Ok(decision) => {
                let reason = if decision.reason.is_empty() {
                    format!("policy decision: {}", decision.decision)
                } else {
                    decision.reason
                };
                let outcome = if decision.decision.is_allow() {
                    StageOutcome::pass(StageId::Policy, reason)
                } else {
                    StageOutcome::fail(StageId::Policy, reason)
                };
                outcome
                    .with_meta("decision", decision.decision.as_str())
                    .with_meta("obligations", decision.obligations)
            }
            Err(err) => collaborator_failure(StageId::Policy, err),
        }
    }
}
