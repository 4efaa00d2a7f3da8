#![deny(unsafe_code)]
//! # toolgate-dag
//!
//! Event DAG - the content-addressed, append-only causal history of every
//! executed tool invocation.
//!
//! Each event references its causal parents by CID; an event with no
//! parents is a causal root. The DAG answers four questions:
//!
//! 1. **Frontier** - which events are the current causal heads
//! 2. **Walk** - what causally precedes an event (breadth-first, self first)
//! 3. **Descendants / rollback** - what must be undone to return to an event
//! 4. **Concurrency** - whether two events are causally independent
//!
//! History is never rewritten: appends are idempotent by CID and, in strict
//! mode, an event referencing an unknown parent is rejected outright.

pub mod dag;
pub mod error;
pub mod node;

pub use dag::EventDag;
pub use error::DagError;
pub use node::{EventMarker, EventNode, EventNodeBuilder};
