use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeSet;
use std::time::Duration;
use toolgate_types::{Intent, Verdict};

use crate::error::CollaboratorError;
use crate::traits::{
    DelegationCheck, DelegationEvaluator, DelegationRequest, TemporalDecision,
    TemporalPolicyEvaluator,
};

/// Static delegation evaluator for testing.
///
/// Holds (leaf capability, actor) grants.
#[derive(Clone, Debug, Default)]
pub struct StaticDelegationEvaluator {
    grants: BTreeSet<(String, String)>,
    deny_reason: Option<String>,
    failure: Option<CollaboratorError>,
    delay: Option<Duration>,
}

impl StaticDelegationEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant `actor` the leaf capability `capability`.
    pub fn grant(mut self, capability: impl Into<String>, actor: impl Into<String>) -> Self {
        self.grants.insert((capability.into(), actor.into()));
        self
    }

    pub fn deny_all(reason: impl Into<String>) -> Self {
        Self {
            deny_reason: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn unavailable(detail: impl Into<String>) -> Self {
        Self {
            failure: Some(CollaboratorError::Unavailable(detail.into())),
            ..Self::default()
        }
    }

    pub fn failing(detail: impl Into<String>) -> Self {
        Self {
            failure: Some(CollaboratorError::Internal(detail.into())),
            ..Self::default()
        }
    }

    /// Respond only after `delay`.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl DelegationEvaluator for StaticDelegationEvaluator {
    async fn can_invoke(
        &self,
        request: &DelegationRequest,
    ) -> Result<DelegationCheck, CollaboratorError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        if let Some(reason) = &self.deny_reason {
            return Ok(DelegationCheck {
                allowed: false,
                reason: reason.clone(),
            });
        }
        let key = (request.leaf_capability_id.clone(), request.actor.clone());
        if self.grants.contains(&key) {
            Ok(DelegationCheck {
                allowed: true,
                reason: format!(
                    "{} delegated {} on {}",
                    request.leaf_capability_id, request.ability, request.resource
                ),
            })
        } else {
            Ok(DelegationCheck {
                allowed: false,
                reason: format!(
                    "actor '{}' holds no delegation for {}",
                    request.actor, request.leaf_capability_id
                ),
            })
        }
    }
}

/// Temporal policy evaluator returning a fixed decision, for testing.
#[derive(Clone, Debug)]
pub struct StaticTemporalPolicyEvaluator {
    decision: Verdict,
    obligations: Vec<String>,
    failure: Option<CollaboratorError>,
    delay: Option<Duration>,
}

impl StaticTemporalPolicyEvaluator {
    pub fn new(decision: Verdict) -> Self {
        Self {
            decision,
            obligations: Vec::new(),
            failure: None,
            delay: None,
        }
    }

    pub fn with_obligation(mut self, obligation: impl Into<String>) -> Self {
        self.obligations.push(obligation.into());
        self
    }

    pub fn unavailable(detail: impl Into<String>) -> Self {
        Self {
            failure: Some(CollaboratorError::Unavailable(detail.into())),
            ..Self::new(Verdict::Deny)
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl TemporalPolicyEvaluator for StaticTemporalPolicyEvaluator {
    async fn evaluate(
        &self,
        _intent: &Intent,
        _policy: &Value,
        _actor: &str,
    ) -> Result<TemporalDecision, CollaboratorError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        Ok(TemporalDecision {
            decision: self.decision,
            obligations: self.obligations.clone(),
            reason: String::new(),
        })
    }
}
