use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Authorization verdict shared by every policy-shaped decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Allow,
    /// Allowed, with post-allow side conditions the caller must honor.
    AllowWithObligations,
    Deny,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::AllowWithObligations => "allow_with_obligations",
            Self::Deny => "deny",
        }
    }

    /// True for `allow` and `allow_with_obligations`.
    pub fn is_allow(&self) -> bool {
        !matches!(self, Self::Deny)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown verdict: {0}")]
pub struct ParseVerdictError(pub String);

impl FromStr for Verdict {
    type Err = ParseVerdictError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow" => Ok(Self::Allow),
            "allow_with_obligations" => Ok(Self::AllowWithObligations),
            "deny" => Ok(Self::Deny),
            other => Err(ParseVerdictError(other.to_string())),
        }
    }
}
