use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use toolgate_types::Verdict;
use tracing::{debug, warn};

use crate::clause::DeonticClause;
use crate::matcher::{ClauseMatcher, GlobClauseMatcher};
use crate::registry::PolicyRegistry;

/// One authorization question put to the gate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GateRequest {
    pub actor: String,
    pub tool: String,
    #[serde(default)]
    pub resource: Option<String>,
    pub at: DateTime<Utc>,
    /// Policies to consult; empty means every registered policy.
    #[serde(default)]
    pub policy_names: Vec<String>,
}

impl GateRequest {
    pub fn new(actor: impl Into<String>, tool: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            tool: tool.into(),
            resource: None,
            at: Utc::now(),
            policy_names: Vec::new(),
        }
    }

    pub fn resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn at(mut self, at: DateTime<Utc>) -> Self {
        self.at = at;
        self
    }

    pub fn policies<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.policy_names = names.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GateDecision {
    pub decision: Verdict,
    pub justification: String,
    /// Name of the policy whose prohibition denied the request.
    pub policy_ref: Option<String>,
    pub clause: Option<DeonticClause>,
}

impl GateDecision {
    fn allow(justification: impl Into<String>) -> Self {
        Self {
            decision: Verdict::Allow,
            justification: justification.into(),
            policy_ref: None,
            clause: None,
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.decision.is_allow()
    }
}

/// Policy Gate - prohibition-first, open-world.
///
/// With no policies registered everything is allowed. Otherwise only
/// prohibition clauses are consulted; the first matching one denies.
/// Permission clauses never widen or narrow the result.
pub struct PolicyGate {
    registry: Arc<PolicyRegistry>,
    matcher: Arc<dyn ClauseMatcher>,
}

impl PolicyGate {
    pub fn new(registry: Arc<PolicyRegistry>) -> Self {
        Self {
            registry,
            matcher: Arc::new(GlobClauseMatcher),
        }
    }

    pub fn with_matcher(registry: Arc<PolicyRegistry>, matcher: Arc<dyn ClauseMatcher>) -> Self {
        Self { registry, matcher }
    }

    pub fn registry(&self) -> &Arc<PolicyRegistry> {
        &self.registry
    }

    pub fn evaluate(&self, request: &GateRequest) -> GateDecision {
        if self.registry.is_empty() {
            return GateDecision::allow("no policies registered; open world");
        }

        let names = if request.policy_names.is_empty() {
            self.registry.list()
        } else {
            request.policy_names.clone()
        };

        let mut consulted = 0usize;
        for name in &names {
            let Some(policy) = self.registry.get(name) else {
                warn!(policy = %name, "Requested policy not registered");
                continue;
            };
            consulted += 1;
            if let Some(clause) = policy
                .prohibitions()
                .find(|clause| self.matcher.matches(clause, request))
            {
                debug!(
                    policy = %name,
                    actor = %request.actor,
                    tool = %request.tool,
                    "Policy gate denied"
                );
                return GateDecision {
                    decision: Verdict::Deny,
                    justification: format!("prohibited by policy '{}': {}", name, clause),
                    policy_ref: Some(name.clone()),
                    clause: Some(clause.clone()),
                };
            };
        }

        GateDecision::allow(format!(
            "no matching prohibition in {} polic{}",
            consulted,
            if consulted == 1 { "y" } else { "ies" }
        ))
    }
}
