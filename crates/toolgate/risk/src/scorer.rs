use serde::{Deserialize, Serialize};
use toolgate_dag::EventDag;
use toolgate_types::{IntentView, Verdict};
use tracing::debug;

use crate::history::history_penalty;
use crate::policy::RiskScoringPolicy;
use crate::score::{RiskFactor, RiskScore};

pub const DEFAULT_PARAM_THRESHOLD: usize = 3;
pub const DEFAULT_PARAM_PENALTY: f64 = 0.03;

/// Fraction of trust that attenuates base risk.
const TRUST_WEIGHT: f64 = 0.5;

/// Risk Scorer - a pure function of intent and policy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskScorer {
    /// Parameters beyond this count add complexity risk.
    pub param_threshold: usize,
    /// Risk added per parameter beyond the threshold.
    pub param_penalty: f64,
}

impl Default for RiskScorer {
    fn default() -> Self {
        Self {
            param_threshold: DEFAULT_PARAM_THRESHOLD,
            param_penalty: DEFAULT_PARAM_PENALTY,
        }
    }
}

/// Score plus the allow/deny call derived from it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskDecision {
    pub score: RiskScore,
    pub acceptable: bool,
    pub verdict: Verdict,
    pub reason: String,
}

impl RiskScorer {
    pub fn new(param_threshold: usize, param_penalty: f64) -> Self {
        Self {
            param_threshold,
            param_penalty,
        }
    }

    /// `base × (1 − trust·0.5) + penalty × max(0, params − threshold)`,
    /// clamped to [0, 1].
    pub fn score_intent(&self, intent: &dyn IntentView, policy: &RiskScoringPolicy) -> RiskScore {
        let (raw, factors) = self.raw_score(intent, policy);
        RiskScore::from_parts(raw, factors)
    }

    fn raw_score(
        &self,
        intent: &dyn IntentView,
        policy: &RiskScoringPolicy,
    ) -> (f64, Vec<RiskFactor>) {
        let tool = intent.tool_name().unwrap_or("");
        let actor = intent.actor().unwrap_or("");

        let base = policy.base_risk(tool);
        let trust = policy.trust(actor);
        let attenuation = 1.0 - trust * TRUST_WEIGHT;
        let attenuated = base * attenuation;

        let mut factors = vec![
            RiskFactor::new("base_risk", base, format!("tool '{}'", tool)),
            RiskFactor::new(
                "actor_trust",
                attenuated - base,
                format!("actor '{}' trust {:.2}", actor, trust),
            ),
        ];

        let params = intent.param_count();
        let excess = params.saturating_sub(self.param_threshold);
        let complexity = self.param_penalty * excess as f64;
        if excess > 0 {
            factors.push(RiskFactor::new(
                "param_complexity",
                complexity,
                format!("{} parameters, {} beyond threshold {}", params, excess, self.param_threshold),
            ));
        }

        (attenuated + complexity, factors)
    }

    pub fn is_acceptable(&self, score: &RiskScore, policy: &RiskScoringPolicy) -> bool {
        score.score <= policy.max_acceptable_risk
    }

    /// Score and gate in one call.
    pub fn score_and_gate(
        &self,
        intent: &dyn IntentView,
        policy: &RiskScoringPolicy,
    ) -> RiskDecision {
        self.decide(self.score_intent(intent, policy), policy)
    }

    /// Like [`score_intent`](Self::score_intent) with the tool's recorded
    /// incidents in `dag` added as a bounded penalty.
    pub fn score_with_history(
        &self,
        intent: &dyn IntentView,
        policy: &RiskScoringPolicy,
        dag: &EventDag,
    ) -> RiskScore {
        let (raw, mut factors) = self.raw_score(intent, policy);
        let tool = intent.tool_name().unwrap_or("");
        let history = history_penalty(dag, tool);
        if history.incidents > 0 {
            factors.push(RiskFactor::new(
                "incident_history",
                history.penalty,
                format!("{} recorded error/rollback events", history.incidents),
            ));
        }
        RiskScore::from_parts(raw + history.penalty, factors)
    }

    pub fn decide(&self, score: RiskScore, policy: &RiskScoringPolicy) -> RiskDecision {
        let acceptable = self.is_acceptable(&score, policy);
        let reason = if acceptable {
            format!(
                "risk {:.3} ({}) within threshold {:.3}",
                score.score, score.level, policy.max_acceptable_risk
            )
        } else {
            format!(
                "risk {:.3} ({}) exceeds threshold {:.3}",
                score.score, score.level, policy.max_acceptable_risk
            )
        };
        debug!(score = score.score, level = %score.level, acceptable, "Risk scored");
        RiskDecision {
            verdict: if acceptable { Verdict::Allow } else { Verdict::Deny },
            score,
            acceptable,
            reason,
        }
    }
}
