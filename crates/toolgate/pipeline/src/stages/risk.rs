use async_trait::async_trait;
use toolgate_risk::{RiskScorer, RiskScoringPolicy};

use crate::context::{GateContext, StageId, StageOutcome};
use crate::traits::GateStage;

/// Stage 2: Risk
///
/// Denies when the score exceeds the policy's acceptable maximum. Score and
/// level are always recorded.
pub struct RiskStage {
    scorer: RiskScorer,
    policy: RiskScoringPolicy,
    /// Fold incidents from the attached DAG into the score.
    use_history: bool,
}

impl RiskStage {
    pub fn new(scorer: RiskScorer, policy: RiskScoringPolicy, use_history: bool) -> Self {
        Self {
            scorer,
            policy,
            use_history,
        }
    }
}

#[async_trait]
impl GateStage for RiskStage {
    fn stage_id(&self) -> StageId {
        StageId::Risk
    }

    async fn evaluate(&self, context: &GateContext) -> StageOutcome {
        let score = match (&context.dag, self.use_history) {
            (Some(dag), true) => self
                .scorer
                .score_with_history(&context.intent, &self.policy, dag),
            _ => self.scorer.score_intent(&context.intent, &self.policy),
        };
        let decision = self.scorer.decide(score, &self.policy);

        let outcome = if decision.acceptable {
            StageOutcome::pass(StageId::Risk, decision.reason)
        } else {
            StageOutcome::fail(StageId::Risk, decision.reason)
        };
        let mut outcome = outcome
            .with_meta("score", decision.score.score)
            .with_meta("level", decision.score.level.as_str())
            .with_meta("max_acceptable_risk", self.policy.max_acceptable_risk);
        if !decision.score.mitigations.is_empty() {
            outcome = outcome.with_meta("mitigations", decision.score.mitigations);
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CheckContext;
    use toolgate_types::Intent;

    fn ctx(tool: &str) -> GateContext {
        let intent = Intent::builder(tool).actor("bob").build().unwrap();
        GateContext::new(intent, CheckContext::new(), None)
    }

    #[tokio::test]
    async fn records_score_and_level() {
        let stage = RiskStage::new(RiskScorer::default(), RiskScoringPolicy::default(), false);
        let outcome = stage.evaluate(&ctx("read_file")).await;
        assert!(outcome.passed);
        assert_eq!(outcome.metadata["level"], "low");
        assert!(outcome.metadata.contains_key("score"));
    }

    #[tokio::test]
    async fn denies_above_threshold() {
        let policy = RiskScoringPolicy::default()
            .with_tool_risk("dangerous", 0.9)
            .with_max_acceptable_risk(0.5);
        let stage = RiskStage::new(RiskScorer::default(), policy, false);
        let outcome = stage.evaluate(&ctx("dangerous")).await;
        assert!(!outcome.passed);
        assert_eq!(outcome.metadata["level"], "high");
        assert!(outcome.metadata.contains_key("mitigations"));
    }
}
