use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use toolgate_types::IntentView;
use tracing::{debug, info, warn};

use crate::builtin::{builtin_rules, ComplianceSettings};
use crate::rule::{ComplianceResult, ComplianceRule, ComplianceStatus, Violation};

/// Compliance Checker - evaluates registered rules in registration order.
///
/// The rule set may change at runtime; each `check` evaluates a snapshot
/// taken when it starts, so concurrent registration never tears a report.
pub struct ComplianceChecker {
    rules: RwLock<Vec<Arc<dyn ComplianceRule>>>,
}

/// Identifier and description of a registered rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleInfo {
    pub id: String,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportSummary {
    Pass,
    Fail,
}

/// Every rule result for one intent.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub results: Vec<ComplianceResult>,
    pub summary: ReportSummary,
}

impl ComplianceReport {
    fn from_results(results: Vec<ComplianceResult>) -> Self {
        let passed = results.iter().all(|r| {
            matches!(
                r.status,
                ComplianceStatus::Compliant | ComplianceStatus::Skipped
            )
        });
        Self {
            results,
            summary: if passed {
                ReportSummary::Pass
            } else {
                ReportSummary::Fail
            },
        }
    }

    pub fn passed(&self) -> bool {
        self.summary == ReportSummary::Pass
    }

    pub fn violations(&self) -> impl Iterator<Item = &Violation> {
        self.results.iter().flat_map(|r| r.violations.iter())
    }

    pub fn non_compliant(&self) -> impl Iterator<Item = &ComplianceResult> {
        self.results
            .iter()
            .filter(|r| r.status == ComplianceStatus::NonCompliant)
    }

    /// True when any rule is `non_compliant`. Warnings never block.
    pub fn is_blocking(&self) -> bool {
        self.non_compliant().next().is_some()
    }

    /// Messages of every violation attached to a `non_compliant` result.
    pub fn blocking_messages(&self) -> Vec<String> {
        self.non_compliant()
            .flat_map(|r| r.violations.iter().map(|v| v.message.clone()))
            .collect()
    }
}

impl ComplianceChecker {
    /// An empty checker.
    pub fn new() -> Self {
        Self {
            rules: RwLock::new(Vec::new()),
        }
    }

    pub fn with_builtin_rules(settings: &ComplianceSettings) -> Self {
        Self {
            rules: RwLock::new(builtin_rules(settings)),
        }
    }

    /// Register a rule. A rule with the same id is replaced in place.
    pub fn add_rule(&self, rule: Arc<dyn ComplianceRule>) {
        let mut rules = self.rules.write();
        let id = rule.id().to_string();
        match rules.iter().position(|r| r.id() == id) {
            Some(idx) => {
                rules[idx] = rule;
                info!(rule = %id, "Compliance rule replaced");
            }
            None => {
                rules.push(rule);
                info!(rule = %id, "Compliance rule added");
            }
        }
    }

    /// Remove a rule by id. Returns whether a rule was removed.
    pub fn remove_rule(&self, id: &str) -> bool {
        let mut rules = self.rules.write();
        let before = rules.len();
        rules.retain(|r| r.id() != id);
        let removed = rules.len() != before;
        if removed {
            warn!(rule = %id, "Compliance rule removed");
        }
        removed
    }

    pub fn list_rules(&self) -> Vec<RuleInfo> {
        self.rules
            .read()
            .iter()
            .map(|r| RuleInfo {
                id: r.id().to_string(),
                description: r.description().to_string(),
            })
            .collect()
    }

    pub fn rule_count(&self) -> usize {
        self.rules.read().len()
    }

    /// Evaluate every rule against the intent.
    ///
    /// A rule that errors or panics becomes a `skipped` result carrying an
    /// `error` violation with the failure text.
    pub fn check(&self, intent: &dyn IntentView) -> ComplianceReport {
        let rules: Vec<Arc<dyn ComplianceRule>> = self.rules.read().clone();
        let results = rules
            .iter()
            .map(|rule| evaluate_rule(rule.as_ref(), intent))
            .collect();
        let report = ComplianceReport::from_results(results);
        debug!(
            tool = intent.tool_name().unwrap_or(""),
            rules = rules.len(),
            summary = ?report.summary,
            "Compliance check complete"
        );
        report
    }
}

impl Default for ComplianceChecker {
    fn default() -> Self {
        Self::with_builtin_rules(&ComplianceSettings::default())
    }
}

fn evaluate_rule(rule: &dyn ComplianceRule, intent: &dyn IntentView) -> ComplianceResult {
    match catch_unwind(AssertUnwindSafe(|| rule.check(intent))) {
        Ok(Ok(result)) => result,
        Ok(Err(err)) => {
            warn!(rule = %rule.id(), error = %err, "Compliance rule failed");
            ComplianceResult::skipped(rule.id(), err.to_string())
        }
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "rule panicked".to_string());
            warn!(rule = %rule.id(), error = %message, "Compliance rule panicked");
            ComplianceResult::skipped(rule.id(), format!("rule panicked: {}", message))
        }
    }
}
