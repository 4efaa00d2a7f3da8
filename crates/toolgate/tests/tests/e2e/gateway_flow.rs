//! End-to-end: config → pipeline → check → execute → receipt → DAG.

use serde_json::json;
use toolgate_dag::EventMarker;
use toolgate_pipeline::{CheckContext, GatewayConfig, StageId};
use toolgate_tests::{intent, GATEWAY_YAML};

fn gateway() -> toolgate_pipeline::DispatchPipeline {
    GatewayConfig::from_yaml_str(GATEWAY_YAML)
        .unwrap()
        .build_pipeline()
}

#[tokio::test]
async fn benign_intent_runs_every_enabled_stage() {
    let pipeline = gateway();
    let result = pipeline
        .check(&intent("read_file", "alice"), &CheckContext::new())
        .await;

    assert!(result.is_allowed());
    let stages: Vec<StageId> = result.outcomes.iter().map(|o| o.stage).collect();
    assert_eq!(
        stages,
        vec![StageId::Compliance, StageId::Risk, StageId::NlPolicy, StageId::Pass]
    );
    assert_eq!(result.decision.reason, "all stages passed");
}

#[tokio::test]
async fn allowed_execution_is_receipted_and_recorded() {
    let pipeline = gateway();
    let read = intent("read_file", "alice");
    assert!(pipeline.check(&read, &CheckContext::new()).await.allowed);

    let receipt = pipeline
        .record_execution(&read, &json!({"bytes": 42}), None)
        .unwrap();
    assert!(receipt.success);
    assert_eq!(receipt.intent_cid, read.cid());
    assert_eq!(receipt.correlation_id, read.cid());

    let dag = pipeline.dag().unwrap();
    let event = receipt.event_cid.unwrap();
    let node = dag.get(&event).unwrap();
    assert!(node.is_root());
    assert_eq!(node.receipt_cid(), receipt.receipt_cid);
    assert_eq!(node.tool(), Some("read_file"));

    // Same intent and output: same event, no growth.
    let again = pipeline
        .record_execution(&read, &json!({"bytes": 42}), None)
        .unwrap();
    assert_eq!(again.receipt_cid, receipt.receipt_cid);
    assert_eq!(again.event_cid, Some(event));
    assert_eq!(dag.len(), 1);
}

#[tokio::test]
async fn failed_execution_is_marked_and_rollback_chains_to_it() {
    let pipeline = gateway();
    let deploy = intent("deploy", "alice");
    let receipt = pipeline
        .record_execution(&deploy, &json!(null), Some("exit status 1"))
        .unwrap();
    assert!(!receipt.success);
    assert_eq!(receipt.error.as_deref(), Some("exit status 1"));

    let dag = pipeline.dag().unwrap();
    let failed = receipt.event_cid.unwrap();
    assert_eq!(dag.get(&failed).unwrap().marker(), Some(EventMarker::Error));

    let rollback = pipeline.record_rollback(&deploy, &failed).unwrap();
    let rollback_event = rollback.event_cid.unwrap();
    let node = dag.get(&rollback_event).unwrap();
    assert_eq!(node.marker(), Some(EventMarker::Rollback));
    assert!(node.parents().contains(&failed));
    assert_eq!(dag.rollback_to(&failed), vec![rollback_event]);
    assert_eq!(dag.frontier().into_iter().collect::<Vec<_>>(), vec![rollback_event]);
}

#[tokio::test]
async fn detached_dag_still_issues_receipts() {
    let pipeline = gateway();
    let dag = pipeline.detach_dag().unwrap();
    let receipt = pipeline
        .record_execution(&intent("read_file", "alice"), &json!("ok"), None)
        .unwrap();
    assert!(receipt.event_cid.is_none());
    assert!(dag.is_empty());
}

#[tokio::test]
async fn incidents_raise_risk_when_history_is_enabled() {
    let mut config = GatewayConfig::from_yaml_str(GATEWAY_YAML).unwrap();
    config.risk.use_history = true;
    config.risk.policy.max_acceptable_risk = 0.3;
    let pipeline = config.build_pipeline();

    let deploy = intent("deploy", "alice");
    let before = pipeline.check(&deploy, &CheckContext::new()).await;
    assert!(before.allowed, "0.225 is under 0.3: {:?}", before.decision);

    for code in 0..2 {
        let error = format!("exit status {}", code + 1);
        pipeline
            .record_execution(&deploy, &json!(null), Some(&error))
            .unwrap();
    }

    let after = pipeline.check(&deploy, &CheckContext::new()).await;
    assert!(!after.allowed);
    assert_eq!(after.blocking_stage, Some(StageId::Risk));
}
