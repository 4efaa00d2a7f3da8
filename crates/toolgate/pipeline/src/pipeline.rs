use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use toolgate_compliance::ComplianceChecker;
use toolgate_dag::{EventDag, EventMarker, EventNode};
use toolgate_nl_policy::PolicyGate;
use toolgate_risk::{RiskScorer, RiskScoringPolicy};
use toolgate_types::{Cid, Intent, Verdict};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::context::{CheckContext, GateContext, StageId, StageOutcome};
use crate::error::PipelineError;
use crate::receipt::ExecutionReceipt;
use crate::stages::{ComplianceStage, DelegationStage, NlPolicyStage, PolicyStage, RiskStage};
use crate::traits::{DelegationEvaluator, GateStage, TemporalPolicyEvaluator};

pub const DEFAULT_COLLABORATOR_TIMEOUT: Duration = Duration::from_secs(5);

/// Stage enable flags and collaborator handles.
///
/// Every stage is disabled by default. An enabled stage without its
/// collaborator passes with an "unavailable" reason.
#[derive(Clone)]
pub struct PipelineConfig {
    pub enable_compliance: bool,
    pub enable_risk: bool,
    pub enable_delegation: bool,
    pub enable_policy: bool,
    pub enable_nl_policy: bool,

    pub compliance: Option<Arc<ComplianceChecker>>,
    pub risk_scorer: RiskScorer,
    pub risk_policy: RiskScoringPolicy,
    /// Add the attached DAG's incident history to risk scores.
    pub risk_uses_history: bool,
    pub delegation: Option<Arc<dyn DelegationEvaluator>>,
    pub temporal_policy: Option<Arc<dyn TemporalPolicyEvaluator>>,
    /// Policy object handed to the temporal policy evaluator.
    pub policy_object: Option<Value>,
    pub nl_gate: Option<Arc<PolicyGate>>,
    pub nl_policy_names: Vec<String>,
    pub collaborator_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            enable_compliance: false,
            enable_risk: false,
            enable_delegation: false,
            enable_policy: false,
            enable_nl_policy: false,
            compliance: None,
            risk_scorer: RiskScorer::default(),
            risk_policy: RiskScoringPolicy::default(),
            risk_uses_history: false,
            delegation: None,
            temporal_policy: None,
            policy_object: None,
            nl_gate: None,
            nl_policy_names: Vec::new(),
            collaborator_timeout: DEFAULT_COLLABORATOR_TIMEOUT,
        }
    }
}

impl PipelineConfig {
    pub fn with_compliance(mut self, checker: Arc<ComplianceChecker>) -> Self {
        self.enable_compliance = true;
        self.compliance = Some(checker);
        self
    }

    pub fn with_risk(mut self, scorer: RiskScorer, policy: RiskScoringPolicy) -> Self {
        self.enable_risk = true;
        self.risk_scorer = scorer;
        self.risk_policy = policy;
        self
    }

    pub fn with_delegation(mut self, evaluator: Arc<dyn DelegationEvaluator>) -> Self {
        self.enable_delegation = true;
        self.delegation = Some(evaluator);
        self
    }

    pub fn with_temporal_policy(
        mut self,
        evaluator: Arc<dyn TemporalPolicyEvaluator>,
        policy_object: Value,
    ) -> Self {
        self.enable_policy = true;
        self.temporal_policy = Some(evaluator);
        self.policy_object = Some(policy_object);
        self
    }

    pub fn with_nl_gate(mut self, gate: Arc<PolicyGate>, policy_names: Vec<String>) -> Self {
        self.enable_nl_policy = true;
        self.nl_gate = Some(gate);
        self.nl_policy_names = policy_names;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.collaborator_timeout = timeout;
        self
    }
}

/// The summarizing decision for one `check`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub decision_id: Uuid,
    pub intent_cid: Cid,
    pub tool: String,
    pub actor: String,
    pub verdict: Verdict,
    pub allowed: bool,
    pub blocking_stage: Option<StageId>,
    pub reason: String,
    /// Obligations the policy stage attached to an allow.
    #[serde(default)]
    pub obligations: Vec<String>,
    pub decided_at: DateTime<Utc>,
}

/// Ordered outcomes of the stages that ran, plus the decision.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub outcomes: Vec<StageOutcome>,
    pub allowed: bool,
    pub blocking_stage: Option<StageId>,
    pub decision: DecisionRecord,
}

impl PipelineResult {
    fn from_context(context: GateContext) -> Self {
        let blocking = context.blocking_stage().cloned();
        let allowed = blocking.is_none();
        let obligations = context
            .outcomes
            .iter()
            .filter(|o| o.stage == StageId::Policy)
            .filter_map(|o| o.metadata.get("obligations"))
            .filter_map(Value::as_array)
            .flatten()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect();

        let decision = DecisionRecord {
            decision_id: Uuid::new_v4(),
            intent_cid: context.intent.cid(),
            tool: context.intent.tool_name().to_string(),
            actor: context.intent.actor().to_string(),
            verdict: if allowed { Verdict::Allow } else { Verdict::Deny },
            allowed,
            blocking_stage: blocking.as_ref().map(|o| o.stage),
            reason: blocking
                .as_ref()
                .map(|o| o.reason.clone())
                .unwrap_or_else(|| "all stages passed".to_string()),
            obligations,
            decided_at: Utc::now(),
        };

        Self {
            outcomes: context.outcomes,
            allowed,
            blocking_stage: decision.blocking_stage,
            decision,
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.allowed
    }

    pub fn outcome(&self, stage: StageId) -> Option<&StageOutcome> {
        self.outcomes.iter().find(|o| o.stage == stage)
    }

    /// `{allowed, verdict, blocking_stage, stages: [{stage, passed, reason, metadata}]}`.
    pub fn to_value(&self) -> Value {
        json!({
            "allowed": self.allowed,
            "verdict": self.decision.verdict.as_str(),
            "blocking_stage": self.blocking_stage.map(|s| s.as_str()),
            "stages": self.outcomes.iter().map(|o| json!({
                "stage": o.stage.as_str(),
                "passed": o.passed,
                "reason": o.reason,
                "metadata": o.metadata,
            })).collect::<Vec<_>>(),
        })
    }
}

/// The Dispatch Pipeline.
///
/// Stages run in the fixed order compliance → risk → delegation → policy →
/// NL policy, and the first failing stage stops evaluation. After the
/// caller executes an allowed tool, `record_execution` issues a receipt and
/// appends a causal-root event to the attached DAG.
pub struct DispatchPipeline {
    config: PipelineConfig,
    stages: Vec<Box<dyn GateStage>>,
    dag: RwLock<Option<Arc<EventDag>>>,
}

impl DispatchPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let timeout = config.collaborator_timeout;
        let mut stages: Vec<Box<dyn GateStage>> = Vec::new();
        if config.enable_compliance {
            stages.push(Box::new(ComplianceStage::new(config.compliance.clone())));
        }
        if config.enable_risk {
            stages.push(Box::new(RiskStage::new(
                config.risk_scorer.clone(),
                config.risk_policy.clone(),
                config.risk_uses_history,
            )));
        }
        if config.enable_delegation {
            stages.push(Box::new(DelegationStage::new(
                config.delegation.clone(),
                timeout,
            )));
        }
        if config.enable_policy {
            stages.push(Box::new(PolicyStage::new(
                config.temporal_policy.clone(),
                config.policy_object.clone(),
                timeout,
            )));
        }
        if config.enable_nl_policy {
            stages.push(Box::new(NlPolicyStage::new(
                config.nl_gate.clone(),
                config.nl_policy_names.clone(),
            )));
        }

        Self {
            config,
            stages,
            dag: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Enabled stages in evaluation order.
    pub fn stage_ids(&self) -> Vec<StageId> {
        self.stages.iter().map(|s| s.stage_id()).collect()
    }

    /// Run every enabled stage against `intent`.
    ///
    /// Always returns a complete result. Nothing is committed; a caller that
    /// abandons the invocation simply drops the result.
    pub async fn check(&self, intent: &Intent, check: &CheckContext) -> PipelineResult {
        let mut context = GateContext::new(intent.clone(), check.clone(), self.dag());

        for stage in &self.stages {
            let outcome = stage.evaluate(&context).await;
            debug!(
                stage = %outcome.stage,
                passed = outcome.passed,
                reason = %outcome.reason,
                "Stage evaluated"
            );
            let passed = outcome.passed;
            context.record(outcome);
            if !passed {
                warn!(
                    tool = %intent.tool_name(),
                    actor = %intent.actor(),
                    stage = %stage.stage_id(),
                    "Invocation denied"
                );
                break;
            }
        }

        if context.blocking_stage().is_none() {
            context.record(StageOutcome::pass(StageId::Pass, "all stages passed"));
        }

        let result = PipelineResult::from_context(context);
        info!(
            intent = %intent.cid().short(),
            tool = %intent.tool_name(),
            allowed = result.allowed,
            stages = result.outcomes.len(),
            "Invocation checked"
        );
        result
    }

    /// Issue a receipt for a completed execution and, if a DAG is attached,
    /// append a causal-root event for it.
    ///
    /// A DAG failure is logged and leaves `event_cid` empty; it never fails
    /// the receipt.
    pub fn record_execution(
        &self,
        intent: &Intent,
        output: &Value,
        error: Option<&str>,
    ) -> Result<ExecutionReceipt, PipelineError> {
        let mut receipt = ExecutionReceipt::build(intent, output, error)?;
        let marker = error.map(|_| EventMarker::Error);
        receipt.event_cid = self.append_event(intent, &receipt, marker, None);
        debug!(
            intent = %receipt.intent_cid.short(),
            receipt = %receipt.receipt_cid.short(),
            success = receipt.success,
            "Execution recorded"
        );
        Ok(receipt)
    }

    /// Record that the effects after `target` were rolled back.
    ///
    /// The rollback event is a child of `target` and lists the undone
    /// descendants in its output.
    pub fn record_rollback(
        &self,
        intent: &Intent,
        target: &Cid,
    ) -> Result<ExecutionReceipt, PipelineError> {
        let undone = self
            .dag()
            .map(|dag| dag.rollback_to(target))
            .unwrap_or_default();
        let output = json!({
            "rolled_back_to": target.to_string(),
            "undone": undone.iter().map(Cid::to_string).collect::<Vec<_>>(),
        });
        let mut receipt = ExecutionReceipt::build(intent, &output, None)?;
        receipt.event_cid =
            self.append_event(intent, &receipt, Some(EventMarker::Rollback), Some(*target));
        info!(target = %target.short(), undone = undone.len(), "Rollback recorded");
        Ok(receipt)
    }

    fn append_event(
        &self,
        intent: &Intent,
        receipt: &ExecutionReceipt,
        marker: Option<EventMarker>,
        parent: Option<Cid>,
    ) -> Option<Cid> {
        let dag = self.dag()?;
        let mut builder =
            EventNode::builder(receipt.intent_cid, receipt.output_cid, receipt.receipt_cid)
                .tool(intent.tool_name())
                .parents(parent);
        if let Some(marker) = marker {
            builder = builder.marker(marker);
        }
        let node = match builder.build() {
            Ok(node) => node,
            Err(err) => {
                warn!(error = %err, "Failed to build event node; receipt issued without event");
                return None;
            }
        };
        match dag.append(node) {
            Ok(cid) => Some(cid),
            Err(err) => {
                warn!(error = %err, "DAG append failed; receipt issued without event");
                None
            }
        }
    }

    /// Attach a DAG, returning the previously attached one.
    pub fn attach_dag(&self, dag: Arc<EventDag>) -> Option<Arc<EventDag>> {
        info!(strict = dag.is_strict(), events = dag.len(), "Event DAG attached");
        self.dag.write().replace(dag)
    }

    pub fn detach_dag(&self) -> Option<Arc<EventDag>> {
        let previous = self.dag.write().take();
        if previous.is_some() {
            info!("Event DAG detached");
        }
        previous
    }

    pub fn dag(&self) -> Option<Arc<EventDag>> {
        self.dag.read().clone()
    }
}
