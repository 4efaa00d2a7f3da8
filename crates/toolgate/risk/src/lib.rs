#![deny(unsafe_code)]
//! # toolgate-risk
//!
//! Risk Scorer - quantitative per-invocation risk.
//!
//! ```text
//! base        = tool override | policy default (0.30)
//! attenuated  = base × (1 − trust · 0.5)
//! complexity  = 0.03 × max(0, params − 3)
//! score       = clamp(attenuated + complexity, 0, 1)
//! ```
//!
//! Levels bucket at 0.20 / 0.40 / 0.60 / 0.80. Operational history recorded
//! in an [`toolgate_dag::EventDag`] can feed back as a bounded penalty via
//! [`RiskScorer::score_with_history`].

pub mod history;
pub mod policy;
pub mod score;
pub mod scorer;

pub use history::{history_penalty, incident_count, IncidentHistory};
pub use policy::RiskScoringPolicy;
pub use score::{ParseRiskLevelError, RiskFactor, RiskLevel, RiskScore};
pub use scorer::{RiskDecision, RiskScorer};
