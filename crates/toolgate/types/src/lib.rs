#![deny(unsafe_code)]
//! # toolgate-types
//!
//! Shared primitives for the Toolgate authorization core.
//!
//! - [`Cid`] - BLAKE3 content identifier over RFC 8785 canonical JSON
//! - [`Intent`] - an immutable request to invoke a tool, keyed by its CID
//! - [`IntentView`] - the accessor trait every gate stage reads intents through
//! - [`Verdict`] - allow / allow-with-obligations / deny

pub mod cid;
pub mod intent;
pub mod verdict;

pub use cid::{canonical_json_bytes, cid_of, Cid, CidError, CID_PREFIX};
pub use intent::{Intent, IntentBuilder, IntentView, ANONYMOUS_ACTOR};
pub use verdict::{ParseVerdictError, Verdict};
