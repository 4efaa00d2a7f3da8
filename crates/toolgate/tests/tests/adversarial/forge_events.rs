//! Adversarial: forged or dangling events against the Event DAG.

use toolgate_dag::{DagError, EventDag, EventMarker, EventNode};
use toolgate_types::Cid;

fn event(tag: &str, parents: &[Cid]) -> EventNode {
    EventNode::builder(
        Cid::of_bytes(tag.as_bytes()),
        Cid::of_bytes(b"out"),
        Cid::of_bytes(b"receipt"),
    )
    .parents(parents.iter().copied())
    .tool("deploy")
    .build()
    .unwrap()
}

#[test]
fn tampered_event_is_rejected_on_import() {
    let original = event("a", &[]);
    let mut wire = serde_json::to_value(&original).unwrap();
    wire["tool"] = serde_json::json!("read_file");
    assert!(serde_json::from_value::<EventNode>(wire).is_err());

    let untouched = serde_json::to_value(&original).unwrap();
    let restored: EventNode = serde_json::from_value(untouched).unwrap();
    assert_eq!(restored, original);
}

#[test]
fn strict_dag_refuses_invented_history() {
    let dag = EventDag::new();
    let fake_parent = Cid::of_bytes(b"made up");
    let err = dag.append(event("child", &[fake_parent])).unwrap_err();
    assert!(matches!(err, DagError::UnknownParent { parent, .. } if parent == fake_parent));
    assert!(dag.is_empty());
}

#[test]
fn lenient_dag_indexes_dangling_parents_without_inventing_nodes() {
    let dag = EventDag::lenient();
    let missing = Cid::of_bytes(b"pruned");
    let child = dag.append(event("child", &[missing])).unwrap();

    assert!(!dag.contains(&missing));
    assert_eq!(dag.descendants(&missing), vec![child]);
    assert!(dag.ancestors(&child).contains(&missing));
    assert_eq!(dag.frontier().into_iter().collect::<Vec<_>>(), vec![child]);
}

#[test]
fn marker_changes_identity() {
    let plain = event("a", &[]);
    let marked = EventNode::builder(
        Cid::of_bytes(b"a"),
        Cid::of_bytes(b"out"),
        Cid::of_bytes(b"receipt"),
    )
    .tool("deploy")
    .marker(EventMarker::Error)
    .build()
    .unwrap();
    assert_ne!(plain.cid(), marked.cid());
}
