use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use toolgate_dag::EventDag;
use toolgate_types::Intent;

/// Pipeline stage identifier, in evaluation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    Compliance,
    Risk,
    Delegation,
    Policy,
    NlPolicy,
    /// Synthetic outcome appended when every run stage passed.
    Pass,
}

impl StageId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compliance => "compliance",
            Self::Risk => "risk",
            Self::Delegation => "delegation",
            Self::Policy => "policy",
            Self::NlPolicy => "nl_policy",
            Self::Pass => "pass",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown stage: {0}")]
pub struct ParseStageIdError(pub String);

impl FromStr for StageId {
    type Err = ParseStageIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compliance" => Ok(Self::Compliance),
            "risk" => Ok(Self::Risk),
            "delegation" => Ok(Self::Delegation),
            "policy" => Ok(Self::Policy),
            "nl_policy" => Ok(Self::NlPolicy),
            "pass" => Ok(Self::Pass),
            other => Err(ParseStageIdError(other.to_string())),
        }
    }
}

/// The finalized result of one stage. Immutable once recorded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageOutcome {
    pub stage: StageId,
    pub passed: bool,
    pub reason: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl StageOutcome {
    pub fn pass(stage: StageId, reason: impl Into<String>) -> Self {
        Self {
            stage,
            passed: true,
            reason: reason.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn fail(stage: StageId, reason: impl Into<String>) -> Self {
        Self {
            stage,
            passed: false,
            reason: reason.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Where a delegated capability chain is anchored for this invocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationAnchor {
    pub leaf_capability_id: String,
    pub resource: String,
    pub ability: String,
}

/// Per-invocation inputs beyond the intent itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CheckContext {
    /// Absent means the delegation stage passes trivially.
    #[serde(default)]
    pub delegation: Option<DelegationAnchor>,
    #[serde(default)]
    pub resource: Option<String>,
    pub at: DateTime<Utc>,
}

impl Default for CheckContext {
    fn default() -> Self {
        Self {
            delegation: None,
            resource: None,
            at: Utc::now(),
        }
    }
}

impl CheckContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delegation(mut self, anchor: DelegationAnchor) -> Self {
        self.delegation = Some(anchor);
        self
    }

    pub fn resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn at(mut self, at: DateTime<Utc>) -> Self {
        self.at = at;
        self
    }
}

/// Context passed through every stage of one `check`.
///
/// Accumulates outcomes as the intent flows through the pipeline.
pub struct GateContext {
    pub intent: Intent,
    pub check: CheckContext,
    /// The DAG attached when the check started, if any.
    pub dag: Option<Arc<EventDag>>,
    pub outcomes: Vec<StageOutcome>,
}

impl GateContext {
    pub fn new(intent: Intent, check: CheckContext, dag: Option<Arc<EventDag>>) -> Self {
        Self {
            intent,
            check,
            dag,
            outcomes: Vec::new(),
        }
    }

    pub fn record(&mut self, outcome: StageOutcome) {
        self.outcomes.push(outcome);
    }

    /// The first recorded failing stage.
    pub fn blocking_stage(&self) -> Option<&StageOutcome> {
        self.outcomes.iter().find(|o| !o.passed)
    }
}
