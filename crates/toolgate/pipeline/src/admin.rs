use std::sync::Arc;
use toolgate_compliance::{ComplianceChecker, ComplianceRule, RuleInfo};
use toolgate_dag::EventDag;
use toolgate_nl_policy::{CompiledPolicy, GateDecision, GateRequest, PolicyGate};

use crate::context::StageId;
use crate::error::PipelineError;
use crate::pipeline::DispatchPipeline;

/// Administration surface over a running pipeline.
///
/// Mutations go through the same shared checker, registry and DAG handles
/// the pipeline evaluates against, so they take effect on the next `check`.
#[derive(Clone)]
pub struct GatewayAdmin {
    pipeline: Arc<DispatchPipeline>,
}

impl GatewayAdmin {
    pub fn new(pipeline: Arc<DispatchPipeline>) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &Arc<DispatchPipeline> {
        &self.pipeline
    }

    fn checker(&self) -> Result<&Arc<ComplianceChecker>, PipelineError> {
        self.pipeline
            .config()
            .compliance
            .as_ref()
            .ok_or(PipelineError::StageNotConfigured(StageId::Compliance))
    }

    fn gate(&self) -> Result<&Arc<PolicyGate>, PipelineError> {
        self.pipeline
            .config()
            .nl_gate
            .as_ref()
            .ok_or(PipelineError::StageNotConfigured(StageId::NlPolicy))
    }

    // Compliance rules

    pub fn add_rule(&self, rule: Arc<dyn ComplianceRule>) -> Result<(), PipelineError> {
        self.checker()?.add_rule(rule);
        Ok(())
    }

    pub fn list_rules(&self) -> Result<Vec<RuleInfo>, PipelineError> {
        Ok(self.checker()?.list_rules())
    }

    pub fn remove_rule(&self, id: &str) -> Result<bool, PipelineError> {
        Ok(self.checker()?.remove_rule(id))
    }

    // NL policies

    pub fn register_policy(
        &self,
        name: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<CompiledPolicy, PipelineError> {
        let registry = self.gate()?.registry();
        let name = name.into();
        registry.register_text(name.clone(), text);
        registry
            .get(&name)
            .ok_or(PipelineError::PolicyRegistry(
                toolgate_nl_policy::PolicyRegistryError::NotFound(name),
            ))
    }

    pub fn list_policies(&self) -> Result<Vec<String>, PipelineError> {
        Ok(self.gate()?.registry().list())
    }

    pub fn get_policy(&self, name: &str) -> Result<Option<CompiledPolicy>, PipelineError> {
        Ok(self.gate()?.registry().get(name))
    }

    pub fn update_policy(&self, name: &str, text: impl Into<String>) -> Result<(), PipelineError> {
        Ok(self.gate()?.registry().update_source(name, text)?)
    }

    pub fn remove_policy(&self, name: &str) -> Result<bool, PipelineError> {
        Ok(self.gate()?.registry().remove(name))
    }

    pub fn evaluate_policy(&self, request: &GateRequest) -> Result<GateDecision, PipelineError> {
        Ok(self.gate()?.evaluate(request))
    }

    // Event DAG

    pub fn attach_dag(&self, dag: Arc<EventDag>) -> Option<Arc<EventDag>> {
        self.pipeline.attach_dag(dag)
    }

    pub fn detach_dag(&self) -> Option<Arc<EventDag>> {
        self.pipeline.detach_dag()
    }
}
