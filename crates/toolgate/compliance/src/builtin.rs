use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::{Arc, LazyLock};
use toolgate_types::IntentView;

use crate::rule::{ComplianceResult, ComplianceRule, RuleError};

static TOOL_NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z][a-z0-9_]*$").expect("tool name pattern is a valid literal regex")
});

/// Tunables for the built-in rule set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplianceSettings {
    /// Tools that may never be invoked.
    pub tool_deny_list: BTreeSet<String>,
    /// Deepest nesting a parameter value may reach before it is flagged.
    pub max_param_depth: usize,
}

impl Default for ComplianceSettings {
    fn default() -> Self {
        Self {
            tool_deny_list: BTreeSet::new(),
            max_param_depth: 8,
        }
    }
}

/// The built-in rules, in evaluation order.
pub fn builtin_rules(settings: &ComplianceSettings) -> Vec<Arc<dyn ComplianceRule>> {
    vec![
        Arc::new(ToolNameConventionRule),
        Arc::new(ActorPresentRule),
        Arc::new(ActorWhitespaceRule),
        Arc::new(ParamsSerializableRule {
            max_depth: settings.max_param_depth,
        }),
        Arc::new(ToolDenyListRule {
            denied: settings.tool_deny_list.clone(),
        }),
        Arc::new(RateLimitRule),
    ]
}

/// Tool name must be non-empty snake_case starting with a letter.
pub struct ToolNameConventionRule;

impl ComplianceRule for ToolNameConventionRule {
    fn id(&self) -> &str {
        "tool_name_convention"
    }

    fn description(&self) -> &str {
        "Tool name is non-empty and matches ^[a-z][a-z0-9_]*$"
    }

    fn check(&self, intent: &dyn IntentView) -> Result<ComplianceResult, RuleError> {
        let result = match intent.tool_name() {
            None | Some("") => ComplianceResult::non_compliant(self.id(), "tool name is empty"),
            Some(name) if !TOOL_NAME_PATTERN.is_match(name) => ComplianceResult::non_compliant(
                self.id(),
                format!("tool name '{}' does not match ^[a-z][a-z0-9_]*$", name),
            ),
            Some(_) => ComplianceResult::compliant(self.id()),
        };
        Ok(result)
    }
}

/// Anonymous invocations are allowed but flagged.
pub struct ActorPresentRule;

impl ComplianceRule for ActorPresentRule {
    fn id(&self) -> &str {
        "actor_present"
    }

    fn description(&self) -> &str {
        "Actor identifier is present (warning only)"
    }

    fn check(&self, intent: &dyn IntentView) -> Result<ComplianceResult, RuleError> {
        match intent.actor() {
            Some(actor) if !actor.trim().is_empty() => Ok(ComplianceResult::compliant(self.id())),
            _ => Ok(ComplianceResult::warning(self.id(), "actor is empty")),
        }
    }
}

pub struct ActorWhitespaceRule;

impl ComplianceRule for ActorWhitespaceRule {
    fn id(&self) -> &str {
        "actor_no_whitespace"
    }

    fn description(&self) -> &str {
        "Actor identifier contains no whitespace"
    }

    fn check(&self, intent: &dyn IntentView) -> Result<ComplianceResult, RuleError> {
        match intent.actor() {
            Some(actor) if actor.chars().any(char::is_whitespace) => {
                Ok(ComplianceResult::non_compliant(
                    self.id(),
                    format!("actor '{}' contains whitespace", actor),
                ))
            }
            _ => Ok(ComplianceResult::compliant(self.id())),
        }
    }
}

/// Parameters must be plain data no deeper than the configured bound.
pub struct ParamsSerializableRule {
    pub max_depth: usize,
}

impl ComplianceRule for ParamsSerializableRule {
    fn id(&self) -> &str {
        "params_serializable"
    }

    fn description(&self) -> &str {
        "Parameters are composed of serializable primitives and containers within the depth bound"
    }

    fn check(&self, intent: &dyn IntentView) -> Result<ComplianceResult, RuleError> {
        let too_deep: Vec<&str> = intent
            .params()
            .into_iter()
            .filter(|(_, value)| !within_depth(value, self.max_depth))
            .map(|(key, _)| key)
            .collect();

        if too_deep.is_empty() {
            Ok(ComplianceResult::compliant(self.id()))
        } else {
            Ok(ComplianceResult::warning(
                self.id(),
                format!(
                    "parameters exceed nesting depth {}: {}",
                    self.max_depth,
                    too_deep.join(", ")
                ),
            ))
        }
    }
}

/// A scalar has depth 1; each container level adds one.
fn within_depth(value: &Value, remaining: usize) -> bool {
    if remaining == 0 {
        return false;
    }
    match value {
        Value::Array(items) => items.iter().all(|v| within_depth(v, remaining - 1)),
        Value::Object(map) => map.values().all(|v| within_depth(v, remaining - 1)),
        _ => true,
    }
}

pub struct ToolDenyListRule {
    pub denied: BTreeSet<String>,
}

impl ComplianceRule for ToolDenyListRule {
    fn id(&self) -> &str {
        "tool_deny_list"
    }

    fn description(&self) -> &str {
        "Tool is not on the configured deny-list"
    }

    fn check(&self, intent: &dyn IntentView) -> Result<ComplianceResult, RuleError> {
        match intent.tool_name() {
            Some(name) if self.denied.contains(name) => Ok(ComplianceResult::non_compliant(
                self.id(),
                format!("tool '{}' is on the deny-list", name),
            )),
            _ => Ok(ComplianceResult::compliant(self.id())),
        }
    }
}

/// Placeholder: always compliant.
///
/// Real rate limiting needs per-actor state held outside this crate;
/// deployments replace this rule under the same id.
pub struct RateLimitRule;

impl ComplianceRule for RateLimitRule {
    fn id(&self) -> &str {
        "rate_limit"
    }

    fn description(&self) -> &str {
        "Rate limit placeholder (always passes; substitute a stateful rule)"
    }

    fn check(&self, _intent: &dyn IntentView) -> Result<ComplianceResult, RuleError> {
        Ok(ComplianceResult::compliant(self.id()))
    }
}
