//! End-to-end: delegation and temporal-policy collaborators, including
//! outages and timeouts.

use std::sync::Arc;
use std::time::Duration;
use toolgate_pipeline::{
    CheckContext, DelegationAnchor, GatewayConfig, StageId, StaticDelegationEvaluator,
    StaticTemporalPolicyEvaluator,
};
use toolgate_tests::intent;
use toolgate_types::Verdict;

fn config() -> GatewayConfig {
    GatewayConfig::from_yaml_str(
        r#"
stages:
  compliance: true
  delegation: true
  policy: true
collaborator_timeout_ms: 50
policy_object:
  rule: business-hours
"#,
    )
    .unwrap()
}

fn anchored() -> CheckContext {
    CheckContext::new().delegation(DelegationAnchor {
        leaf_capability_id: "cap-deploy".into(),
        resource: "repo:main".into(),
        ability: "deploy".into(),
    })
}

#[tokio::test]
async fn granted_delegation_and_obligations_flow_into_the_decision() {
    let delegation = StaticDelegationEvaluator::new().grant("cap-deploy", "alice");
    let temporal =
        StaticTemporalPolicyEvaluator::new(Verdict::AllowWithObligations).with_obligation("notify #ops");
    let pipeline = config().build_pipeline_with(Some(Arc::new(delegation)), Some(Arc::new(temporal)));

    let result = pipeline.check(&intent("deploy", "alice"), &anchored()).await;
    assert!(result.allowed, "{:?}", result.decision);
    assert_eq!(result.decision.verdict, Verdict::Allow);
    assert_eq!(result.decision.obligations, vec!["notify #ops".to_string()]);
}

#[tokio::test]
async fn missing_grant_denies_at_delegation() {
    let pipeline = config().build_pipeline_with(
        Some(Arc::new(StaticDelegationEvaluator::new())),
        Some(Arc::new(StaticTemporalPolicyEvaluator::new(Verdict::Allow))),
    );
    let result = pipeline.check(&intent("deploy", "mallory"), &anchored()).await;
    assert_eq!(result.blocking_stage, Some(StageId::Delegation));
    assert!(result.outcome(StageId::Policy).is_none());
}

#[tokio::test]
async fn unanchored_invocation_skips_delegation() {
    let pipeline = config().build_pipeline_with(
        Some(Arc::new(StaticDelegationEvaluator::deny_all("revoked"))),
        Some(Arc::new(StaticTemporalPolicyEvaluator::new(Verdict::Allow))),
    );
    let result = pipeline
        .check(&intent("deploy", "alice"), &CheckContext::new())
        .await;
    assert!(result.allowed);
}

#[tokio::test]
async fn unreachable_collaborators_do_not_block() {
    let pipeline = config().build_pipeline_with(
        Some(Arc::new(StaticDelegationEvaluator::unavailable("connection refused"))),
        Some(Arc::new(StaticTemporalPolicyEvaluator::unavailable("connection refused"))),
    );
    let result = pipeline.check(&intent("deploy", "alice"), &anchored()).await;
    assert!(result.allowed);
    for stage in [StageId::Delegation, StageId::Policy] {
        let outcome = result.outcome(stage).unwrap();
        assert!(outcome.reason.starts_with("unavailable"), "{stage}");
        assert_eq!(outcome.metadata["unavailable"], true);
    }
}

#[tokio::test]
async fn unconfigured_collaborators_pass_as_unavailable() {
    let pipeline = config().build_pipeline();
    let result = pipeline.check(&intent("deploy", "alice"), &anchored()).await;
    assert!(result.allowed);
    assert_eq!(
        result.outcome(StageId::Policy).unwrap().metadata["unavailable"],
        true
    );
}

#[tokio::test]
async fn slow_collaborator_times_out_and_denies() {
    let slow = StaticDelegationEvaluator::new()
        .grant("cap-deploy", "alice")
        .delayed(Duration::from_millis(500));
    let pipeline = config().build_pipeline_with(Some(Arc::new(slow)), None);

    let result = pipeline.check(&intent("deploy", "alice"), &anchored()).await;
    assert_eq!(result.blocking_stage, Some(StageId::Delegation));
    let outcome = result.outcome(StageId::Delegation).unwrap();
    assert_eq!(outcome.reason, "collaborator timed out");
}

#[tokio::test]
async fn collaborator_errors_deny() {
    let pipeline = config().build_pipeline_with(
        Some(Arc::new(StaticDelegationEvaluator::failing("ledger corrupt"))),
        None,
    );
    let result = pipeline.check(&intent("deploy", "alice"), &anchored()).await;
    assert_eq!(result.blocking_stage, Some(StageId::Delegation));
    assert!(result.decision.reason.contains("ledger corrupt"));
}
