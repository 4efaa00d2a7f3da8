use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_BASE_RISK: f64 = 0.30;
pub const DEFAULT_ACTOR_TRUST: f64 = 0.50;
pub const DEFAULT_MAX_ACCEPTABLE_RISK: f64 = 0.75;

/// Risk Scoring Policy - operator knobs for the risk model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskScoringPolicy {
    /// Base risk for tools without an override.
    pub default_base_risk: f64,
    /// Per-tool base risk in [0, 1].
    pub tool_risk_overrides: BTreeMap<String, f64>,
    /// Trust for actors without an entry.
    pub default_trust: f64,
    /// Per-actor trust in [0, 1]; higher trust attenuates risk.
    pub actor_trust: BTreeMap<String, f64>,
    /// Scores above this are unacceptable.
    pub max_acceptable_risk: f64,
}

impl Default for RiskScoringPolicy {
    fn default() -> Self {
        Self {
            default_base_risk: DEFAULT_BASE_RISK,
            tool_risk_overrides: BTreeMap::new(),
            default_trust: DEFAULT_ACTOR_TRUST,
            actor_trust: BTreeMap::new(),
            max_acceptable_risk: DEFAULT_MAX_ACCEPTABLE_RISK,
        }
    }
}

impl RiskScoringPolicy {
    pub fn with_tool_risk(mut self, tool: impl Into<String>, risk: f64) -> Self {
        self.tool_risk_overrides.insert(tool.into(), risk);
        self
    }

    pub fn with_actor_trust(mut self, actor: impl Into<String>, trust: f64) -> Self {
        self.actor_trust.insert(actor.into(), trust);
        self
    }

    pub fn with_max_acceptable_risk(mut self, max: f64) -> Self {
        self.max_acceptable_risk = max;
        self
    }

    /// Base risk for a tool, clamped to [0, 1].
    pub fn base_risk(&self, tool: &str) -> f64 {
        self.tool_risk_overrides
            .get(tool)
            .copied()
            .unwrap_or(self.default_base_risk)
            .clamp(0.0, 1.0)
    }

    /// Trust for an actor, clamped to [0, 1].
    pub fn trust(&self, actor: &str) -> f64 {
        self.actor_trust
            .get(actor)
            .copied()
            .unwrap_or(self.default_trust)
            .clamp(0.0, 1.0)
    }
}
