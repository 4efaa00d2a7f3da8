use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use toolgate_compliance::{ComplianceChecker, ComplianceSettings};
use toolgate_dag::EventDag;
use toolgate_nl_policy::{PolicyGate, PolicyRegistry};
use toolgate_risk::{RiskScorer, RiskScoringPolicy};
use tracing::info;

use crate::error::ConfigError;
use crate::pipeline::{DispatchPipeline, PipelineConfig};
use crate::traits::{DelegationEvaluator, TemporalPolicyEvaluator};

/// Which stages run. All disabled by default.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageToggles {
    pub compliance: bool,
    pub risk: bool,
    pub delegation: bool,
    pub policy: bool,
    pub nl_policy: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskSettings {
    pub policy: RiskScoringPolicy,
    pub scorer: RiskScorer,
    /// Fold DAG incident history into risk scores.
    pub use_history: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DagSettings {
    pub enabled: bool,
    pub strict: bool,
}

impl Default for DagSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            strict: true,
        }
    }
}

/// Gateway configuration, loaded from YAML.
///
/// ```yaml
/// stages: { compliance: true, risk: true, nl_policy: true }
/// collaborator_timeout_ms: 5000
/// risk:
///   policy:
///     tool_risk_overrides: { drop_database: 0.95 }
///     max_acceptable_risk: 0.7
/// compliance:
///   tool_deny_list: [format_disk]
/// dag: { enabled: true, strict: true }
/// nl_policies:
///   ops: "Interns must not deploy. No agent may drop tables."
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub stages: StageToggles,
    pub collaborator_timeout_ms: u64,
    pub risk: RiskSettings,
    pub compliance: ComplianceSettings,
    pub dag: DagSettings,
    /// Named natural-language policy texts registered at startup.
    pub nl_policies: BTreeMap<String, String>,
    /// Policies the NL gate consults; empty means all.
    pub nl_policy_names: Vec<String>,
    /// Policy object for the temporal policy evaluator.
    pub policy_object: Option<Value>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            stages: StageToggles::default(),
            collaborator_timeout_ms: 5_000,
            risk: RiskSettings::default(),
            compliance: ComplianceSettings::default(),
            dag: DagSettings::default(),
            nl_policies: BTreeMap::new(),
            nl_policy_names: Vec::new(),
            policy_object: None,
        }
    }
}

impl GatewayConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
    }

    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.collaborator_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "collaborator_timeout_ms must be positive".into(),
            ));
        }
        let policy = &self.risk.policy;
        let mut unit_values = vec![
            ("risk.policy.default_base_risk".to_string(), policy.default_base_risk),
            ("risk.policy.default_trust".to_string(), policy.default_trust),
            ("risk.policy.max_acceptable_risk".to_string(), policy.max_acceptable_risk),
        ];
        unit_values.extend(
            policy
                .tool_risk_overrides
                .iter()
                .map(|(tool, v)| (format!("risk.policy.tool_risk_overrides.{}", tool), *v)),
        );
        unit_values.extend(
            policy
                .actor_trust
                .iter()
                .map(|(actor, v)| (format!("risk.policy.actor_trust.{}", actor), *v)),
        );
        for (field, value) in unit_values {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be within [0, 1], got {}",
                    field, value
                )));
            }
        }
        if self.risk.scorer.param_penalty < 0.0 {
            return Err(ConfigError::Invalid(
                "risk.scorer.param_penalty must not be negative".into(),
            ));
        }
        Ok(())
    }

    pub fn collaborator_timeout(&self) -> Duration {
        Duration::from_millis(self.collaborator_timeout_ms)
    }

    /// Construct the checker, registry and gate this configuration names.
    pub fn pipeline_config(&self) -> PipelineConfig {
        let checker = Arc::new(ComplianceChecker::with_builtin_rules(&self.compliance));

        let registry = Arc::new(PolicyRegistry::default());
        for (name, text) in &self.nl_policies {
            registry.register_text(name.clone(), text.clone());
        }
        let gate = Arc::new(PolicyGate::new(registry));

        PipelineConfig {
            enable_compliance: self.stages.compliance,
            enable_risk: self.stages.risk,
            enable_delegation: self.stages.delegation,
            enable_policy: self.stages.policy,
            enable_nl_policy: self.stages.nl_policy,
            compliance: Some(checker),
            risk_scorer: self.risk.scorer.clone(),
            risk_policy: self.risk.policy.clone(),
            risk_uses_history: self.risk.use_history,
            delegation: None,
            temporal_policy: None,
            policy_object: self.policy_object.clone(),
            nl_gate: Some(gate),
            nl_policy_names: self.nl_policy_names.clone(),
            collaborator_timeout: self.collaborator_timeout(),
        }
    }

    /// The single top-level composition point.
    pub fn build_pipeline(&self) -> DispatchPipeline {
        self.build_pipeline_with(None, None)
    }

    /// Like [`build_pipeline`](Self::build_pipeline) with external
    /// collaborators wired in.
    pub fn build_pipeline_with(
        &self,
        delegation: Option<Arc<dyn DelegationEvaluator>>,
        temporal_policy: Option<Arc<dyn TemporalPolicyEvaluator>>,
    ) -> DispatchPipeline {
        let mut config = self.pipeline_config();
        config.delegation = delegation;
        config.temporal_policy = temporal_policy;

        let pipeline = DispatchPipeline::new(config);
        if self.dag.enabled {
            pipeline.attach_dag(Arc::new(EventDag::with_strict(self.dag.strict)));
        }
        info!(
            stages = ?pipeline.stage_ids(),
            nl_policies = self.nl_policies.len(),
            dag = self.dag.enabled,
            "Dispatch pipeline built"
        );
        pipeline
    }
}
