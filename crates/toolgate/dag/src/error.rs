use toolgate_types::{Cid, CidError};

/// Errors from Event DAG operations.
#[derive(Debug, thiserror::Error)]
pub enum DagError {
    #[error("unknown causal parent: event {event} references parent {parent} which is not in the dag")]
    UnknownParent { event: Cid, parent: Cid },

    #[error("event cid mismatch: recorded {recorded}, computed {computed}")]
    CidMismatch { recorded: Cid, computed: Cid },

    #[error("content addressing failed: {0}")]
    Cid(#[from] CidError),
}
