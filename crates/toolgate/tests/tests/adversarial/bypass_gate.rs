//! Adversarial: attempts to slip an invocation past the gate.

use serde_json::json;
use std::sync::Arc;
use toolgate_compliance::{ComplianceResult, FnRule};
use toolgate_nl_policy::{GateRequest, PolicyGate, PolicyRegistry};
use toolgate_pipeline::{CheckContext, GatewayAdmin, GatewayConfig, StageId};
use toolgate_tests::{intent, intent_with_params, GATEWAY_YAML};
use toolgate_types::{Cid, Intent, IntentView};

fn pipeline() -> toolgate_pipeline::DispatchPipeline {
    GatewayConfig::from_yaml_str(GATEWAY_YAML)
        .unwrap()
        .build_pipeline()
}

#[test]
fn supplied_cid_is_ignored() {
    let forged: Intent = serde_json::from_value(json!({
        "tool_name": "read_file",
        "actor": "alice",
        "cid": Cid::of_bytes(b"something else").to_string(),
    }))
    .unwrap();
    assert_eq!(forged.cid(), intent("read_file", "alice").cid());
}

#[tokio::test]
async fn lookalike_tool_names_fail_compliance() {
    let pipeline = pipeline();
    for tool in ["read_file ", " read_file", "read-file", "Read_file", "rеad_file"] {
        let result = pipeline
            .check(&intent(tool, "alice"), &CheckContext::new())
            .await;
        assert_eq!(result.blocking_stage, Some(StageId::Compliance), "{tool:?}");
    }
}

#[tokio::test]
async fn deeply_nested_params_fail_compliance() {
    let mut nested = json!("leaf");
    for _ in 0..12 {
        nested = json!({ "inner": nested });
    }
    let result = pipeline()
        .check(
            &intent_with_params("read_file", "alice", &[("payload", nested)]),
            &CheckContext::new(),
        )
        .await;
    assert_eq!(result.blocking_stage, Some(StageId::Compliance));
}

#[tokio::test]
async fn actor_with_whitespace_cannot_dodge_a_prohibition() {
    let result = pipeline()
        .check(&intent("deploy", "the intern"), &CheckContext::new())
        .await;
    assert!(!result.allowed);
}

#[test]
fn case_games_do_not_evade_prohibitions() {
    let registry = Arc::new(PolicyRegistry::default());
    registry.register_text("ops", "Bob must not delete records.");
    let gate = PolicyGate::new(registry);
    for (actor, tool) in [("BOB", "delete_records"), ("bob", "DELETE_RECORDS"), ("Bob", "Delete_Records")] {
        assert!(!gate.evaluate(&GateRequest::new(actor, tool)).is_allowed(), "{actor} {tool}");
    }
}

#[tokio::test]
async fn panicking_rule_does_not_take_down_the_gateway() {
    let admin = GatewayAdmin::new(Arc::new(pipeline()));
    admin
        .add_rule(Arc::new(FnRule::new("explodes", "always panics", |_: &dyn IntentView| {
            panic!("rule bug")
        })))
        .unwrap();
    admin
        .add_rule(Arc::new(FnRule::new("no_deploy", "no deploys on fridays", |view: &dyn IntentView| {
            Ok(match view.tool_name() {
                Some("deploy") => ComplianceResult::non_compliant("no_deploy", "deploy frozen"),
                _ => ComplianceResult::compliant("no_deploy"),
            })
        })))
        .unwrap();

    let ok = admin
        .pipeline()
        .check(&intent("read_file", "alice"), &CheckContext::new())
        .await;
    assert!(ok.allowed);

    let frozen = admin
        .pipeline()
        .check(&intent("deploy", "alice"), &CheckContext::new())
        .await;
    assert_eq!(frozen.blocking_stage, Some(StageId::Compliance));
    assert!(frozen.decision.reason.contains("deploy frozen"));
}
