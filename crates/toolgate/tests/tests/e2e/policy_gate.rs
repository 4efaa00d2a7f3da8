//! End-to-end: natural-language policies gating dispatch, with live edits.

use chrono::{TimeZone, Utc};
use std::sync::Arc;
use toolgate_nl_policy::{GateRequest, PolicyGate, PolicyRegistry};
use toolgate_pipeline::{CheckContext, GatewayAdmin, GatewayConfig, StageId};
use toolgate_tests::{intent, GATEWAY_YAML};
use toolgate_types::Verdict;

fn admin() -> GatewayAdmin {
    let pipeline = GatewayConfig::from_yaml_str(GATEWAY_YAML)
        .unwrap()
        .build_pipeline();
    GatewayAdmin::new(Arc::new(pipeline))
}

#[test]
fn empty_registry_is_open_world() {
    let gate = PolicyGate::new(Arc::new(PolicyRegistry::default()));
    let decision = gate.evaluate(&GateRequest::new("anyone", "drop_database"));
    assert_eq!(decision.decision, Verdict::Allow);
}

#[tokio::test]
async fn prohibited_actor_is_denied_at_nl_policy() {
    let admin = admin();
    let pipeline = admin.pipeline();

    let denied = pipeline
        .check(&intent("deploy", "intern"), &CheckContext::new())
        .await;
    assert_eq!(denied.blocking_stage, Some(StageId::NlPolicy));
    let outcome = denied.outcome(StageId::NlPolicy).unwrap();
    assert!(outcome.reason.contains("ops"));

    let allowed = pipeline
        .check(&intent("deploy", "alice"), &CheckContext::new())
        .await;
    assert!(allowed.allowed);
}

#[tokio::test]
async fn wildcard_prohibition_applies_to_every_actor() {
    let pipeline = admin().pipeline().clone();
    for actor in ["alice", "bob", "intern"] {
        let result = pipeline
            .check(&intent("drop_tables", actor), &CheckContext::new())
            .await;
        assert_eq!(result.blocking_stage, Some(StageId::NlPolicy), "{actor}");
    }
}

#[tokio::test]
async fn policy_updates_take_effect_without_rebuilding() {
    let admin = admin();
    let deploy = intent("deploy", "intern");

    admin.update_policy("ops", "Interns may deploy.").unwrap();
    let result = admin.pipeline().check(&deploy, &CheckContext::new()).await;
    assert!(result.allowed);

    admin
        .register_policy("freeze", "Nobody may deploy until 2999-01-01.")
        .unwrap();
    let result = admin.pipeline().check(&deploy, &CheckContext::new()).await;
    assert_eq!(result.blocking_stage, Some(StageId::NlPolicy));
    assert!(result.decision.reason.contains("freeze"));

    assert!(admin.remove_policy("freeze").unwrap());
    let result = admin.pipeline().check(&deploy, &CheckContext::new()).await;
    assert!(result.allowed);
}

#[test]
fn time_windows_bound_prohibitions() {
    let registry = Arc::new(PolicyRegistry::default());
    registry.register_text("freeze", "Nobody may deploy before 2030-01-01.");
    let gate = PolicyGate::new(registry);

    let during = Utc.with_ymd_and_hms(2029, 6, 1, 0, 0, 0).unwrap();
    let after = Utc.with_ymd_and_hms(2030, 6, 1, 0, 0, 0).unwrap();
    let request = GateRequest::new("alice", "deploy");

    assert!(!gate.evaluate(&request.clone().at(during)).is_allowed());
    assert!(gate.evaluate(&request.at(after)).is_allowed());
}

#[test]
fn resource_scoped_clause_ignores_other_resources() {
    let registry = Arc::new(PolicyRegistry::default());
    registry.register_text("ops", "Bob must not delete records on prod.");
    let gate = PolicyGate::new(registry);

    let prod = GateRequest::new("bob", "delete_records").resource("prod");
    let staging = GateRequest::new("bob", "delete_records").resource("staging");
    assert!(!gate.evaluate(&prod).is_allowed());
    assert!(gate.evaluate(&staging).is_allowed());
}
