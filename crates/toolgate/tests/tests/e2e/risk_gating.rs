//! End-to-end: compliance and risk gating through a configured gateway.

use serde_json::json;
use toolgate_pipeline::{CheckContext, GatewayConfig, StageId};
use toolgate_risk::{RiskLevel, RiskScorer, RiskScoringPolicy};
use toolgate_tests::{intent, intent_with_params, GATEWAY_YAML};

fn config() -> GatewayConfig {
    GatewayConfig::from_yaml_str(GATEWAY_YAML).unwrap()
}

#[tokio::test]
async fn malformed_tool_name_stops_at_compliance() {
    let pipeline = config().build_pipeline();
    let result = pipeline
        .check(&intent("Bad-Tool", "alice"), &CheckContext::new())
        .await;

    assert!(!result.allowed);
    assert_eq!(result.blocking_stage, Some(StageId::Compliance));
    assert_eq!(result.outcomes.len(), 1);
    assert!(result.outcome(StageId::Risk).is_none());
    assert!(result.decision.reason.contains("Bad-Tool"));
}

#[tokio::test]
async fn deny_listed_tool_stops_at_compliance() {
    let pipeline = config().build_pipeline();
    let result = pipeline
        .check(&intent("format_disk", "alice"), &CheckContext::new())
        .await;
    assert_eq!(result.blocking_stage, Some(StageId::Compliance));
}

#[tokio::test]
async fn dangerous_tool_is_high_risk_and_denied() {
    let pipeline = config().build_pipeline();
    let result = pipeline
        .check(&intent("drop_database", "alice"), &CheckContext::new())
        .await;

    assert!(!result.allowed);
    assert_eq!(result.blocking_stage, Some(StageId::Risk));
    let risk = result.outcome(StageId::Risk).unwrap();
    assert_eq!(risk.metadata["level"], "high");
    let score = risk.metadata["score"].as_f64().unwrap();
    assert!((score - 0.675).abs() < 1e-9);
    assert!(risk.metadata.contains_key("mitigations"));
}

#[tokio::test]
async fn untrusted_actor_pushes_dangerous_tool_to_critical() {
    let config = config();
    let score = config
        .risk
        .scorer
        .score_intent(&intent("drop_database", "root"), &config.risk.policy);
    assert!((score.score - 0.9).abs() < 1e-9);
    assert_eq!(score.level, RiskLevel::Critical);
    assert_eq!(score.mitigations.len(), 4);
}

#[test]
fn parameter_count_adds_complexity() {
    let scorer = RiskScorer::default();
    let policy = RiskScoringPolicy::default();
    let params: Vec<(&str, serde_json::Value)> = (0..5)
        .map(|i| (["a", "b", "c", "d", "e"][i], json!(i)))
        .collect();

    let plain = scorer.score_intent(&intent("read_file", "alice"), &policy);
    let busy = scorer.score_intent(&intent_with_params("read_file", "alice", &params), &policy);
    assert!((busy.score - plain.score - 0.06).abs() < 1e-9);
}

#[test]
fn raw_json_mapping_scores_like_an_intent() {
    let scorer = RiskScorer::default();
    let policy = RiskScoringPolicy::default().with_tool_risk("drop_database", 0.9);
    let raw = json!({"tool_name": "drop_database", "actor": "alice", "params": {}});
    let typed = intent("drop_database", "alice");
    assert_eq!(
        scorer.score_intent(&raw, &policy).score,
        scorer.score_intent(&typed, &policy).score
    );
}
