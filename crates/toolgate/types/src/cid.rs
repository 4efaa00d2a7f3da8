use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Textual prefix identifying the BLAKE3 digest family.
pub const CID_PREFIX: &str = "b3:";

/// Content identifier (BLAKE3, 32 bytes).
///
/// Every intent, output, decision, receipt and execution event is keyed by
/// the digest of its canonical form, so equal content always yields an
/// equal `Cid`. Rendered as `b3:<64 lowercase hex>`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cid([u8; 32]);

impl Cid {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Digest raw bytes directly (no canonicalization).
    pub fn of_bytes(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Short form for log lines.
    pub fn short(&self) -> String {
        self.to_hex()[..12].to_string()
    }

    /// Parse from 64 hex characters, with or without the `b3:` prefix.
    pub fn from_hex(hex: &str) -> Result<Self, CidError> {
        let hex = hex.strip_prefix(CID_PREFIX).unwrap_or(hex);
        if hex.len() != 64 {
            return Err(CidError::InvalidLength(hex.len()));
        }
        if !hex.is_ascii() {
            return Err(CidError::InvalidHex);
        }
        let mut bytes = [0u8; 32];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
                .map_err(|_| CidError::InvalidHex)?;
        }
        Ok(Self(bytes))
    }
}

impl fmt::Debug for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cid({})", self.short())
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", CID_PREFIX, self.to_hex())
    }
}

impl FromStr for Cid {
    type Err = CidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Cid {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Cid {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Cid::from_hex(&text).map_err(serde::de::Error::custom)
    }
}

/// Errors from content addressing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CidError {
    #[error("invalid cid length: {0} hex characters (expected 64)")]
    InvalidLength(usize),
    #[error("invalid hex character in cid")]
    InvalidHex,
    #[error("canonical serialization failed: {0}")]
    Canonicalization(String),
}

/// Returns RFC 8785 canonical JSON bytes for a serializable value.
pub fn canonical_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, CidError> {
    serde_jcs::to_vec(value).map_err(|e| CidError::Canonicalization(e.to_string()))
}

/// Content-address any serializable value.
///
/// Map keys are sorted and numbers normalized by the canonical form, so two
/// structurally equal values always produce the same identifier.
pub fn cid_of<T: Serialize>(value: &T) -> Result<Cid, CidError> {
    let bytes = canonical_json_bytes(value)?;
    Ok(Cid::of_bytes(&bytes))
}
