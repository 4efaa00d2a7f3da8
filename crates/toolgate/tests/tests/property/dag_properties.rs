//! Property tests: the Event DAG stays append-only, idempotent and causally
//! consistent for arbitrary shapes.

use proptest::prelude::*;
use std::collections::BTreeSet;
use toolgate_dag::{EventDag, EventNode};
use toolgate_types::Cid;

// ---------------------------------------------------------------------------
// Helpers / Strategies
// ---------------------------------------------------------------------------

/// Parent picks per node; node `i` may only pick among nodes `0..i`.
fn arb_shape() -> impl Strategy<Value = Vec<Vec<prop::sample::Index>>> {
    prop::collection::vec(prop::collection::vec(any::<prop::sample::Index>(), 0..3), 1..24)
}

fn node(i: usize, parents: impl IntoIterator<Item = Cid>) -> EventNode {
    let tag = format!("event-{i}");
    EventNode::builder(
        Cid::of_bytes(tag.as_bytes()),
        Cid::of_bytes(b"output"),
        Cid::of_bytes(b"receipt"),
    )
    .parents(parents)
    .tool("deploy")
    .build()
    .unwrap()
}

/// Build the shape into a strict DAG, returning nodes in append order.
fn build(shape: &[Vec<prop::sample::Index>]) -> (EventDag, Vec<EventNode>) {
    let dag = EventDag::new();
    let mut nodes: Vec<EventNode> = Vec::new();
    for (i, picks) in shape.iter().enumerate() {
        let parents: BTreeSet<Cid> = if i == 0 {
            BTreeSet::new()
        } else {
            picks.iter().map(|ix| nodes[ix.index(i)].cid()).collect()
        };
        let node = node(i, parents);
        dag.append(node.clone()).unwrap();
        nodes.push(node);
    }
    (dag, nodes)
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn reappending_is_a_no_op(shape in arb_shape()) {
        let (dag, nodes) = build(&shape);
        let before = dag.len();
        for node in &nodes {
            prop_assert_eq!(dag.append(node.clone()).unwrap(), node.cid());
        }
        prop_assert_eq!(dag.len(), before);
    }

    #[test]
    fn strict_rejection_leaves_dag_untouched(shape in arb_shape()) {
        let (dag, _) = build(&shape);
        let len = dag.len();
        let frontier = dag.frontier();

        let orphan = node(10_000, [Cid::of_bytes(b"never appended")]);
        prop_assert!(dag.append(orphan.clone()).is_err());
        prop_assert_eq!(dag.len(), len);
        prop_assert_eq!(dag.frontier(), frontier);
        prop_assert!(!dag.contains(&orphan.cid()));
    }

    #[test]
    fn frontier_is_exactly_the_childless_nodes(shape in arb_shape()) {
        let (dag, nodes) = build(&shape);
        let referenced: BTreeSet<Cid> = nodes
            .iter()
            .flat_map(|n| n.parents().iter().copied())
            .collect();
        let expected: BTreeSet<Cid> = nodes
            .iter()
            .map(EventNode::cid)
            .filter(|cid| !referenced.contains(cid))
            .collect();
        prop_assert_eq!(dag.frontier(), expected);
    }

    #[test]
    fn parents_are_ancestors_and_children_descendants(shape in arb_shape()) {
        let (dag, nodes) = build(&shape);
        for node in &nodes {
            let ancestors = dag.ancestors(&node.cid());
            for parent in node.parents() {
                prop_assert!(ancestors.contains(parent));
                prop_assert!(dag.descendants(parent).contains(&node.cid()));
            }
        }
    }

    #[test]
    fn concurrency_is_symmetric_and_irreflexive_on_lineage(
        shape in arb_shape(),
        a in any::<prop::sample::Index>(),
        b in any::<prop::sample::Index>(),
    ) {
        let (dag, nodes) = build(&shape);
        let a = nodes[a.index(nodes.len())].cid();
        let b = nodes[b.index(nodes.len())].cid();
        prop_assert_eq!(dag.are_concurrent(&a, &b), dag.are_concurrent(&b, &a));
        prop_assert!(!dag.are_concurrent(&a, &a));
        if dag.ancestors(&b).contains(&a) {
            prop_assert!(!dag.are_concurrent(&a, &b));
        }
    }

    #[test]
    fn snapshot_round_trips(shape in arb_shape()) {
        let (dag, _) = build(&shape);
        let rebuilt = EventDag::from_snapshot(true, dag.snapshot()).unwrap();
        prop_assert_eq!(rebuilt.len(), dag.len());
        prop_assert_eq!(rebuilt.frontier(), dag.frontier());
    }
}
