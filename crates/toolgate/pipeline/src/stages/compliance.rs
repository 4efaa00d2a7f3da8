use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use toolgate_compliance::ComplianceChecker;

use crate::context::{GateContext, StageId, StageOutcome};
use crate::stages::unavailable;
use crate::traits::GateStage;

/// Stage 1: Compliance
///
/// Denies when any rule is `non_compliant`; warnings and skipped rules pass.
pub struct ComplianceStage {
    checker: Option<Arc<ComplianceChecker>>,
}

impl ComplianceStage {
    pub fn new(checker: Option<Arc<ComplianceChecker>>) -> Self {
        Self { checker }
    }
}

#[async_trait]
impl GateStage for ComplianceStage {
    fn stage_id(&self) -> StageId {
        StageId::Compliance
    }

    async fn evaluate(&self, context: &GateContext) -> StageOutcome {
        let Some(checker) = &self.checker else {
            return unavailable(StageId::Compliance, "compliance checker");
        };

        let report = checker.check(&context.intent);
        let warnings = report
            .results
            .iter()
            .filter(|r| r.status == toolgate_compliance::ComplianceStatus::Warning)
            .count();

        let outcome = if report.is_blocking() {
            StageOutcome::fail(StageId::Compliance, report.blocking_messages().join("; "))
        } else {
            StageOutcome::pass(StageId::Compliance, "all rules compliant")
        };
        outcome
            .with_meta("summary", json!(report.summary))
            .with_meta("rules", report.results.len())
            .with_meta("warnings", warnings)
    }
}
