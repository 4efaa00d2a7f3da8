use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Categorical risk level, bucketed at 0.20 / 0.40 / 0.60 / 0.80.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Negligible,
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score < 0.20 {
            Self::Negligible
        } else if score < 0.40 {
            Self::Low
        } else if score < 0.60 {
            Self::Medium
        } else if score < 0.80 {
            Self::High
        } else {
            Self::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Negligible => "negligible",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// High and critical scores carry mitigation hints.
    pub fn needs_mitigation(&self) -> bool {
        *self >= Self::High
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown risk level: {0}")]
pub struct ParseRiskLevelError(pub String);

impl FromStr for RiskLevel {
    type Err = ParseRiskLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "negligible" => Ok(Self::Negligible),
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(ParseRiskLevelError(other.to_string())),
        }
    }
}

/// One contribution to a risk score.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub name: String,
    pub value: f64,
    pub detail: String,
}

impl RiskFactor {
    pub fn new(name: impl Into<String>, value: f64, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value,
            detail: detail.into(),
        }
    }
}

/// The scored risk of one intent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskScore {
    /// In [0, 1].
    pub score: f64,
    pub level: RiskLevel,
    pub factors: Vec<RiskFactor>,
    /// Populated only for high and critical levels.
    pub mitigations: Vec<String>,
}

impl RiskScore {
    pub(crate) fn from_parts(raw: f64, factors: Vec<RiskFactor>) -> Self {
        let score = raw.clamp(0.0, 1.0);
        let level = RiskLevel::from_score(score);
        Self {
            score,
            level,
            factors,
            mitigations: mitigations_for(level),
        }
    }
}

fn mitigations_for(level: RiskLevel) -> Vec<String> {
    let mut hints = match level {
        RiskLevel::High | RiskLevel::Critical => vec![
            "require human approval before execution".to_string(),
            "reduce parameters to the minimum the tool needs".to_string(),
            "invoke through a delegated capability with narrower scope".to_string(),
        ],
        _ => Vec::new(),
    };
    if level == RiskLevel::Critical {
        hints.push("execute in an isolated sandbox with rollback prepared".to_string());
    }
    hints
}
