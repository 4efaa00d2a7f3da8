use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use toolgate_types::Cid;
use tracing::{debug, info};

use crate::error::DagError;
use crate::node::EventNode;

/// Event DAG - append-only causal history of executed invocations.
///
/// Holds the node map plus a reverse index `parent → children`. Writers are
/// serialized behind one lock; readers run concurrently. Nodes are never
/// mutated or removed once appended.
pub struct EventDag {
    strict: bool,
    state: RwLock<DagState>,
}

#[derive(Default)]
struct DagState {
    nodes: HashMap<Cid, EventNode>,
    /// Append order, for snapshots and scans.
    order: Vec<Cid>,
    children: HashMap<Cid, BTreeSet<Cid>>,
}

impl EventDag {
    /// Strict DAG: every referenced parent must already be present.
    pub fn new() -> Self {
        Self::with_strict(true)
    }

    /// Lenient DAG: dangling parent references are accepted and indexed.
    pub fn lenient() -> Self {
        Self::with_strict(false)
    }

    pub fn with_strict(strict: bool) -> Self {
        Self {
            strict,
            state: RwLock::new(DagState::default()),
        }
    }

    /// Rebuild a DAG from nodes exported by [`EventDag::snapshot`].
    pub fn from_snapshot(
        strict: bool,
        nodes: impl IntoIterator<Item = EventNode>,
    ) -> Result<Self, DagError> {
        let dag = Self::with_strict(strict);
        for node in nodes {
            dag.append(node)?;
        }
        Ok(dag)
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Append an event, returning its CID.
    ///
    /// Re-appending a known CID is a no-op. In strict mode an unknown parent
    /// fails the append and leaves the DAG untouched.
    pub fn append(&self, node: EventNode) -> Result<Cid, DagError> {
        let cid = node.cid();
        let mut state = self.state.write();

        if state.nodes.contains_key(&cid) {
            debug!(event = %cid.short(), "Event already recorded");
            return Ok(cid);
        }

        if self.strict {
            if let Some(parent) = node.parents().iter().find(|p| !state.nodes.contains_key(p)) {
                return Err(DagError::UnknownParent {
                    event: cid,
                    parent: *parent,
                });
            }
        }

        for parent in node.parents() {
            state.children.entry(*parent).or_default().insert(cid);
        }
        let parent_count = node.parents().len();
        state.order.push(cid);
        state.nodes.insert(cid, node);

        info!(event = %cid.short(), parents = parent_count, "Event appended");
        Ok(cid)
    }

    pub fn get(&self, cid: &Cid) -> Option<EventNode> {
        self.state.read().nodes.get(cid).cloned()
    }

    pub fn contains(&self, cid: &Cid) -> bool {
        self.state.read().nodes.contains_key(cid)
    }

    pub fn len(&self) -> usize {
        self.state.read().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Known events with no recorded children: the current causal heads.
    pub fn frontier(&self) -> BTreeSet<Cid> {
        let state = self.state.read();
        state
            .nodes
            .keys()
            .filter(|cid| state.children.get(cid).map_or(true, BTreeSet::is_empty))
            .copied()
            .collect()
    }

    /// Breadth-first walk over parent edges, starting with `cid` itself.
    ///
    /// Each CID is visited once. Parents referenced but not present (lenient
    /// mode) are reported without being expanded. Unknown `cid` yields an
    /// empty walk.
    pub fn walk(&self, cid: &Cid) -> Vec<Cid> {
        Self::walk_in(&self.state.read(), cid)
    }

    /// Every causal ancestor of `cid` (the walk without `cid` itself).
    pub fn ancestors(&self, cid: &Cid) -> Vec<Cid> {
        let mut walk = self.walk(cid);
        if !walk.is_empty() {
            walk.remove(0);
        }
        walk
    }

    /// Breadth-first over the reverse index, excluding `cid`.
    pub fn descendants(&self, cid: &Cid) -> Vec<Cid> {
        let state = self.state.read();
        let mut visited: HashSet<Cid> = HashSet::from([*cid]);
        let mut queue: VecDeque<Cid> = VecDeque::from([*cid]);
        let mut out = Vec::new();

        while let Some(current) = queue.pop_front() {
            if let Some(children) = state.children.get(&current) {
                for child in children {
                    if visited.insert(*child) {
                        out.push(*child);
                        queue.push_back(*child);
                    }
                }
            }
        }
        out
    }

    /// Events that must be undone to return history to `cid`.
    pub fn rollback_to(&self, cid: &Cid) -> Vec<Cid> {
        self.descendants(cid)
    }

    /// True iff neither event is a causal ancestor of the other.
    pub fn are_concurrent(&self, a: &Cid, b: &Cid) -> bool {
        let state = self.state.read();
        !Self::walk_in(&state, a).contains(b) && !Self::walk_in(&state, b).contains(a)
    }

    /// All nodes in append order.
    pub fn snapshot(&self) -> Vec<EventNode> {
        let state = self.state.read();
        state
            .order
            .iter()
            .filter_map(|cid| state.nodes.get(cid).cloned())
            .collect()
    }

    /// Visit every node in append order under a single read lock.
    pub fn for_each_node(&self, mut f: impl FnMut(&EventNode)) {
        let state = self.state.read();
        for cid in &state.order {
            if let Some(node) = state.nodes.get(cid) {
                f(node);
            }
        }
    }

    fn walk_in(state: &DagState, cid: &Cid) -> Vec<Cid> {
        if !state.nodes.contains_key(cid) {
            return Vec::new();
        }
        let mut visited: HashSet<Cid> = HashSet::from([*cid]);
        let mut queue: VecDeque<Cid> = VecDeque::from([*cid]);
        let mut out = Vec::new();

        while let Some(current) = queue.pop_front() {
            out.push(current);
            if let Some(node) = state.nodes.get(&current) {
                for parent in node.parents() {
                    if visited.insert(*parent) {
                        queue.push_back(*parent);
                    }
                }
            }
        }
        out
    }
}

impl Default for EventDag {
    fn default() -> Self {
        Self::new()
    }
}
