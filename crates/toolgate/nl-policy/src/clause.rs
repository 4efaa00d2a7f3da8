use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Wildcard actor or action.
pub const ANY: &str = "*";

/// Deontic modality of a clause.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClauseKind {
    Permission,
    Prohibition,
    Obligation,
}

impl ClauseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Permission => "permission",
            Self::Prohibition => "prohibition",
            Self::Obligation => "obligation",
        }
    }
}

impl fmt::Display for ClauseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown clause kind: {0}")]
pub struct ParseClauseKindError(pub String);

impl FromStr for ClauseKind {
    type Err = ParseClauseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "permission" => Ok(Self::Permission),
            "prohibition" => Ok(Self::Prohibition),
            "obligation" => Ok(Self::Obligation),
            other => Err(ParseClauseKindError(other.to_string())),
        }
    }
}

/// A single permission, prohibition or obligation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeonticClause {
    pub kind: ClauseKind,
    pub actor: String,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_before: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_after: Option<DateTime<Utc>>,
}

impl DeonticClause {
    pub fn new(kind: ClauseKind, actor: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            kind,
            actor: actor.into(),
            action: action.into(),
            resource: None,
            not_before: None,
            not_after: None,
        }
    }

    pub fn permission(actor: impl Into<String>, action: impl Into<String>) -> Self {
        Self::new(ClauseKind::Permission, actor, action)
    }

    pub fn prohibition(actor: impl Into<String>, action: impl Into<String>) -> Self {
        Self::new(ClauseKind::Prohibition, actor, action)
    }

    pub fn obligation(actor: impl Into<String>, action: impl Into<String>) -> Self {
        Self::new(ClauseKind::Obligation, actor, action)
    }

    /// Permission for anyone to do anything.
    pub fn universal_permission() -> Self {
        Self::permission(ANY, ANY)
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn with_window(
        mut self,
        not_before: Option<DateTime<Utc>>,
        not_after: Option<DateTime<Utc>>,
    ) -> Self {
        self.not_before = not_before;
        self.not_after = not_after;
        self
    }

    pub fn is_universal_permission(&self) -> bool {
        self.kind == ClauseKind::Permission
            && self.actor == ANY
            && self.action == ANY
            && self.resource.is_none()
    }

    /// Whether `at` falls inside the clause's validity window (inclusive).
    pub fn active_at(&self, at: DateTime<Utc>) -> bool {
        self.not_before.map_or(true, |start| at >= start)
            && self.not_after.map_or(true, |end| at <= end)
    }
}

impl fmt::Display for DeonticClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modal = match self.kind {
            ClauseKind::Permission => "may",
            ClauseKind::Prohibition => "may not",
            ClauseKind::Obligation => "must",
        };
        write!(f, "{} {} {}", self.actor, modal, self.action)?;
        if let Some(resource) = &self.resource {
            write!(f, " on {}", resource)?;
        }
        Ok(())
    }
}
