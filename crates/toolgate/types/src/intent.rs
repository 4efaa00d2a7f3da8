use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::cid::{cid_of, Cid, CidError};

/// Actor recorded when a request carries no identity.
pub const ANONYMOUS_ACTOR: &str = "anonymous";

/// An Intent - one caller's request to invoke a named tool.
///
/// The intent CID is computed once at construction over
/// `{tool, actor, params}` and never changes; fields are read-only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "IntentWire", into = "IntentWire")]
pub struct Intent {
    tool_name: String,
    actor: String,
    params: BTreeMap<String, Value>,
    cid: Cid,
}

/// The exact content hashed into the intent CID.
#[derive(Serialize)]
struct IntentDigest<'a> {
    tool: &'a str,
    actor: &'a str,
    params: &'a BTreeMap<String, Value>,
}

impl Intent {
    /// Create a builder for ergonomic construction.
    pub fn builder(tool_name: impl Into<String>) -> IntentBuilder {
        IntentBuilder {
            tool_name: tool_name.into(),
            actor: ANONYMOUS_ACTOR.to_string(),
            params: BTreeMap::new(),
        }
    }

    pub fn new(
        tool_name: impl Into<String>,
        actor: impl Into<String>,
        params: BTreeMap<String, Value>,
    ) -> Result<Self, CidError> {
        let tool_name = tool_name.into();
        let actor = actor.into();
        let cid = cid_of(&IntentDigest {
            tool: &tool_name,
            actor: &actor,
            params: &params,
        })?;
        Ok(Self {
            tool_name,
            actor,
            params,
            cid,
        })
    }

    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    pub fn actor(&self) -> &str {
        &self.actor
    }

    pub fn params(&self) -> &BTreeMap<String, Value> {
        &self.params
    }

    /// The idempotence and equality key for this request.
    pub fn cid(&self) -> Cid {
        self.cid
    }
}

/// Builder for [`Intent`].
pub struct IntentBuilder {
    tool_name: String,
    actor: String,
    params: BTreeMap<String, Value>,
}

impl IntentBuilder {
    pub fn actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = actor.into();
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn params(mut self, params: BTreeMap<String, Value>) -> Self {
        self.params = params;
        self
    }

    pub fn build(self) -> Result<Intent, CidError> {
        Intent::new(self.tool_name, self.actor, self.params)
    }
}

/// Serialized form of an intent; the CID is derived, never trusted from input.
#[derive(Serialize, Deserialize)]
struct IntentWire {
    #[serde(alias = "tool")]
    tool_name: String,
    #[serde(default = "default_actor")]
    actor: String,
    #[serde(default)]
    params: BTreeMap<String, Value>,
}

fn default_actor() -> String {
    ANONYMOUS_ACTOR.to_string()
}

impl TryFrom<IntentWire> for Intent {
    type Error = CidError;

    fn try_from(wire: IntentWire) -> Result<Self, Self::Error> {
        Intent::new(wire.tool_name, wire.actor, wire.params)
    }
}

impl From<Intent> for IntentWire {
    fn from(intent: Intent) -> Self {
        Self {
            tool_name: intent.tool_name,
            actor: intent.actor,
            params: intent.params,
        }
    }
}

/// Read access to the fields every gate stage consumes.
///
/// Implemented by [`Intent`] and by JSON objects (the mapping-like wire
/// form), so rules read fields the same way regardless of representation.
/// A field that is absent or not a string reads as `None`.
pub trait IntentView {
    fn tool_name(&self) -> Option<&str>;

    fn actor(&self) -> Option<&str>;

    /// Parameter entries in key order.
    fn params(&self) -> Vec<(&str, &Value)>;

    fn param_count(&self) -> usize {
        self.params().len()
    }
}

impl IntentView for Intent {
    fn tool_name(&self) -> Option<&str> {
        Some(&self.tool_name)
    }

    fn actor(&self) -> Option<&str> {
        Some(&self.actor)
    }

    fn params(&self) -> Vec<(&str, &Value)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v)).collect()
    }

    fn param_count(&self) -> usize {
        self.params.len()
    }
}

impl IntentView for Value {
    fn tool_name(&self) -> Option<&str> {
        self.get("tool_name")
            .or_else(|| self.get("tool"))
            .and_then(Value::as_str)
    }

    fn actor(&self) -> Option<&str> {
        self.get("actor").and_then(Value::as_str)
    }

    fn params(&self) -> Vec<(&str, &Value)> {
        match self.get("params").and_then(Value::as_object) {
            Some(map) => {
                let mut entries: Vec<(&str, &Value)> =
                    map.iter().map(|(k, v)| (k.as_str(), v)).collect();
                entries.sort_by(|a, b| a.0.cmp(b.0));
                entries
            }
            None => Vec::new(),
        }
    }
}
