use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use toolgate_types::IntentView;

/// Outcome status of one rule against one intent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    Compliant,
    NonCompliant,
    Warning,
    /// The rule could not be evaluated (it errored or chose not to apply).
    Skipped,
}

impl ComplianceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compliant => "compliant",
            Self::NonCompliant => "non_compliant",
            Self::Warning => "warning",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown compliance status: {0}")]
pub struct ParseStatusError(pub String);

impl FromStr for ComplianceStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compliant" => Ok(Self::Compliant),
            "non_compliant" => Ok(Self::NonCompliant),
            "warning" => Ok(Self::Warning),
            "skipped" => Ok(Self::Skipped),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// Severity of a single violation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown severity: {0}")]
pub struct ParseSeverityError(pub String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(Self::Info),
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            other => Err(ParseSeverityError(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub rule_id: String,
    pub message: String,
    pub severity: Severity,
}

/// Result of evaluating one rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceResult {
    pub rule_id: String,
    pub status: ComplianceStatus,
    pub violations: Vec<Violation>,
}

impl ComplianceResult {
    pub fn compliant(rule_id: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.into(),
            status: ComplianceStatus::Compliant,
            violations: Vec::new(),
        }
    }

    /// Blocking failure with one `error` violation.
    pub fn non_compliant(rule_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_violation(rule_id, ComplianceStatus::NonCompliant, Severity::Error, message)
    }

    /// Non-blocking finding with one `warning` violation.
    pub fn warning(rule_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_violation(rule_id, ComplianceStatus::Warning, Severity::Warning, message)
    }

    /// The rule did not produce a verdict; carries an `error` violation.
    pub fn skipped(rule_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_violation(rule_id, ComplianceStatus::Skipped, Severity::Error, message)
    }

    fn with_violation(
        rule_id: impl Into<String>,
        status: ComplianceStatus,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        let rule_id = rule_id.into();
        Self {
            violations: vec![Violation {
                rule_id: rule_id.clone(),
                message: message.into(),
                severity,
            }],
            rule_id,
            status,
        }
    }
}

/// Errors a rule may raise instead of producing a result.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RuleError {
    #[error("rule evaluation failed: {0}")]
    Failed(String),
    #[error("rule requires unavailable state: {0}")]
    MissingState(String),
}

/// A named, pure check over an intent.
///
/// Rules read the intent only through [`IntentView`]. A rule that returns
/// an error (or panics) is reported as `skipped` and does not abort the
/// remaining rules.
pub trait ComplianceRule: Send + Sync {
    fn id(&self) -> &str;

    fn description(&self) -> &str;

    fn check(&self, intent: &dyn IntentView) -> Result<ComplianceResult, RuleError>;
}

/// A rule backed by a closure, for runtime registration.
pub struct FnRule<F> {
    id: String,
    description: String,
    check: F,
}

impl<F> FnRule<F>
where
    F: Fn(&dyn IntentView) -> Result<ComplianceResult, RuleError> + Send + Sync,
{
    pub fn new(id: impl Into<String>, description: impl Into<String>, check: F) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            check,
        }
    }
}

impl<F> ComplianceRule for FnRule<F>
where
    F: Fn(&dyn IntentView) -> Result<ComplianceResult, RuleError> + Send + Sync,
{
    fn id(&self) -> &str {
        &self.id
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn check(&self, intent: &dyn IntentView) -> Result<ComplianceResult, RuleError> {
        (self.check)(intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolgate_types::Intent;

    #[test]
    fn status_parse_roundtrip() {
        for status in [
            ComplianceStatus::Compliant,
            ComplianceStatus::NonCompliant,
            ComplianceStatus::Warning,
            ComplianceStatus::Skipped,
        ] {
            assert_eq!(status.as_str().parse::<ComplianceStatus>().unwrap(), status);
        }
        assert!("broken".parse::<ComplianceStatus>().is_err());
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
        assert_eq!("error".parse::<Severity>().unwrap(), Severity::Error);
    }

    #[test]
    fn constructors_set_severity() {
        let r = ComplianceResult::non_compliant("x", "bad");
        assert_eq!(r.status, ComplianceStatus::NonCompliant);
        assert_eq!(r.violations[0].severity, Severity::Error);

        let w = ComplianceResult::warning("x", "meh");
        assert_eq!(w.violations[0].severity, Severity::Warning);
        assert!(ComplianceResult::compliant("x").violations.is_empty());
    }

    #[test]
    fn fn_rule_delegates() {
        let rule = FnRule::new("has_params", "requires parameters", |intent: &dyn IntentView| {
            if intent.param_count() == 0 {
                Ok(ComplianceResult::non_compliant("has_params", "no parameters"))
            } else {
                Ok(ComplianceResult::compliant("has_params"))
            }
        });
        let intent = Intent::builder("t").build().unwrap();
        assert_eq!(rule.id(), "has_params");
        assert_eq!(
            rule.check(&intent).unwrap().status,
            ComplianceStatus::NonCompliant
        );
    }
}
