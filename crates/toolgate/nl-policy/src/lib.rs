#![deny(unsafe_code)]
//! # toolgate-nl-policy
//!
//! Natural-language policy for tool invocations.
//!
//! ```text
//! policy text ──► NlPolicyCompiler ──► CompiledPolicy (deontic clauses)
//!                   │ linguistic converter (optional)
//!                   └ rule-based idioms (fallback)
//!
//! PolicyRegistry: name → (live source, compiled), recompiled on source change
//! PolicyGate:     prohibition-first, open-world evaluation over the registry
//! ```
//!
//! A text with no recognizable idiom compiles to a single universal
//! permission, so a parse failure can never make the gateway stricter.

pub mod clause;
pub mod compiler;
pub mod gate;
pub mod idioms;
pub mod matcher;
pub mod registry;

pub use clause::{ClauseKind, DeonticClause, ParseClauseKindError, ANY};
pub use compiler::{
    source_digest, ClauseTriple, CompilationMethod, CompiledPolicy, CompilerMetadata,
    ConverterError, LinguisticConverter, NlPolicyCompiler, DEFAULT_CONVERTER_TIMEOUT,
};
pub use gate::{GateDecision, GateRequest, PolicyGate};
pub use matcher::{glob_match, ClauseMatcher, GlobClauseMatcher};
pub use registry::{PolicyRegistry, PolicyRegistryError, PolicySource};
