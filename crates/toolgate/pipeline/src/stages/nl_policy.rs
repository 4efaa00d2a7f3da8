use async_trait::async_trait;
use std::sync::Arc;
use toolgate_nl_policy::{GateRequest, PolicyGate};

use crate::context::{GateContext, StageId, StageOutcome};
use crate::stages::unavailable;
use crate::traits::GateStage;

/// Stage 5: NL Policy Gate
pub struct NlPolicyStage {
    gate: Option<Arc<PolicyGate>>,
    /// Policies to consult; empty means all registered.
    policy_names: Vec<String>,
}

impl NlPolicyStage {
    pub fn new(gate: Option<Arc<PolicyGate>>, policy_names: Vec<String>) -> Self {
        Self { gate, policy_names }
    }
}

#[async_trait]
impl GateStage for NlPolicyStage {
    fn stage_id(&self) -> StageId {
        StageId::NlPolicy
    }

    async fn evaluate(&self, context: &GateContext) -> StageOutcome {
        let Some(gate) = &self.gate else {
            return unavailable(StageId::NlPolicy, "policy gate");
        };

        let mut request = GateRequest::new(context.intent.actor(), context.intent.tool_name())
            .at(context.check.at)
            .policies(self.policy_names.iter().cloned());
        if let Some(resource) = &context.check.resource {
            request = request.resource(resource.clone());
        }

        let decision = gate.evaluate(&request);
        let outcome = if decision.is_allowed() {
            StageOutcome::pass(StageId::NlPolicy, decision.justification)
        } else {
            StageOutcome::fail(StageId::NlPolicy, decision.justification)
        };
        let outcome = outcome.with_meta("decision", decision.decision.as_str());
        match decision.policy_ref {
            Some(policy) => outcome.with_meta("policy_ref", policy),
            None => outcome,
        }
    }
}
