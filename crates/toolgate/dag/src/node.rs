use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use toolgate_types::{cid_of, Cid, CidError};

use crate::error::DagError;

/// Operational marker attached to an execution event.
///
/// Markers feed back into risk scoring: a tool whose history carries many
/// error or rollback events is treated as riskier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventMarker {
    Error,
    Rollback,
}

impl fmt::Display for EventMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => f.write_str("error"),
            Self::Rollback => f.write_str("rollback"),
        }
    }
}

/// A node in the Event DAG.
///
/// `cid = blake3(jcs({parents, intent_cid, output_cid, receipt_cid, tool, marker}))`,
/// computed once at construction. Fields are read-only so the identity can
/// never drift from the content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EventNodeWire", into = "EventNodeWire")]
pub struct EventNode {
    cid: Cid,
    parents: BTreeSet<Cid>,
    intent_cid: Cid,
    output_cid: Cid,
    receipt_cid: Cid,
    tool: Option<String>,
    marker: Option<EventMarker>,
}

#[derive(Serialize)]
struct EventDigest<'a> {
    parents: &'a BTreeSet<Cid>,
    intent_cid: &'a Cid,
    output_cid: &'a Cid,
    receipt_cid: &'a Cid,
    tool: &'a Option<String>,
    marker: &'a Option<EventMarker>,
}

impl EventNode {
    pub fn builder(intent_cid: Cid, output_cid: Cid, receipt_cid: Cid) -> EventNodeBuilder {
        EventNodeBuilder {
            parents: BTreeSet::new(),
            intent_cid,
            output_cid,
            receipt_cid,
            tool: None,
            marker: None,
        }
    }

    fn compute_cid(
        parents: &BTreeSet<Cid>,
        intent_cid: &Cid,
        output_cid: &Cid,
        receipt_cid: &Cid,
        tool: &Option<String>,
        marker: &Option<EventMarker>,
    ) -> Result<Cid, CidError> {
        cid_of(&EventDigest {
            parents,
            intent_cid,
            output_cid,
            receipt_cid,
            tool,
            marker,
        })
    }

    pub fn cid(&self) -> Cid {
        self.cid
    }

    pub fn parents(&self) -> &BTreeSet<Cid> {
        &self.parents
    }

    pub fn intent_cid(&self) -> Cid {
        self.intent_cid
    }

    pub fn output_cid(&self) -> Cid {
        self.output_cid
    }

    pub fn receipt_cid(&self) -> Cid {
        self.receipt_cid
    }

    pub fn tool(&self) -> Option<&str> {
        self.tool.as_deref()
    }

    pub fn marker(&self) -> Option<EventMarker> {
        self.marker
    }

    /// A causal root has no parents.
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }
}

/// Builder for [`EventNode`].
pub struct EventNodeBuilder {
    parents: BTreeSet<Cid>,
    intent_cid: Cid,
    output_cid: Cid,
    receipt_cid: Cid,
    tool: Option<String>,
    marker: Option<EventMarker>,
}

impl EventNodeBuilder {
    pub fn parent(mut self, parent: Cid) -> Self {
        self.parents.insert(parent);
        self
    }

    pub fn parents(mut self, parents: impl IntoIterator<Item = Cid>) -> Self {
        self.parents.extend(parents);
        self
    }

    pub fn tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = Some(tool.into());
        self
    }

    pub fn marker(mut self, marker: EventMarker) -> Self {
        self.marker = Some(marker);
        self
    }

    pub fn build(self) -> Result<EventNode, CidError> {
        let cid = EventNode::compute_cid(
            &self.parents,
            &self.intent_cid,
            &self.output_cid,
            &self.receipt_cid,
            &self.tool,
            &self.marker,
        )?;
        Ok(EventNode {
            cid,
            parents: self.parents,
            intent_cid: self.intent_cid,
            output_cid: self.output_cid,
            receipt_cid: self.receipt_cid,
            tool: self.tool,
            marker: self.marker,
        })
    }
}

/// Serialized form; the recorded CID is verified against the content on import.
#[derive(Serialize, Deserialize)]
struct EventNodeWire {
    cid: Cid,
    #[serde(default)]
    parents: BTreeSet<Cid>,
    intent_cid: Cid,
    output_cid: Cid,
    receipt_cid: Cid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    marker: Option<EventMarker>,
}

impl TryFrom<EventNodeWire> for EventNode {
    type Error = DagError;

    fn try_from(wire: EventNodeWire) -> Result<Self, Self::Error> {
        let computed = EventNode::compute_cid(
            &wire.parents,
            &wire.intent_cid,
            &wire.output_cid,
            &wire.receipt_cid,
            &wire.tool,
            &wire.marker,
        )?;
        if computed != wire.cid {
            return Err(DagError::CidMismatch {
                recorded: wire.cid,
                computed,
            });
        }
        Ok(EventNode {
            cid: computed,
            parents: wire.parents,
            intent_cid: wire.intent_cid,
            output_cid: wire.output_cid,
            receipt_cid: wire.receipt_cid,
            tool: wire.tool,
            marker: wire.marker,
        })
    }
}

impl From<EventNode> for EventNodeWire {
    fn from(node: EventNode) -> Self {
        Self {
            cid: node.cid,
            parents: node.parents,
            intent_cid: node.intent_cid,
            output_cid: node.output_cid,
            receipt_cid: node.receipt_cid,
            tool: node.tool,
            marker: node.marker,
        }
    }
}
