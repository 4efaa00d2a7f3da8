use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;
use toolgate_types::Cid;
use tracing::{debug, warn};

use crate::clause::{ClauseKind, DeonticClause};
use crate::idioms::{match_sentence, normalize_action, normalize_actor, split_sentences};

/// A clause as produced by an external linguistic converter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClauseTriple {
    pub kind: ClauseKind,
    pub actor: String,
    pub action: String,
    #[serde(default)]
    pub resource: Option<String>,
}

/// Why the linguistic converter produced nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConverterError {
    #[error("linguistic converter unavailable: {0}")]
    Unavailable(String),

    #[error("linguistic converter timed out")]
    TimedOut,

    #[error("linguistic converter failed: {0}")]
    Failed(String),
}

/// External text → deontic triple converter.
///
/// Any error is treated as "unavailable" by the compiler, which then falls
/// back to the rule-based idioms. Calls run off the caller's thread and are
/// abandoned once the compiler's converter deadline passes.
pub trait LinguisticConverter: Send + Sync {
    fn name(&self) -> &str;

    fn convert(&self, text: &str) -> Result<Vec<ClauseTriple>, ConverterError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompilationMethod {
    Linguistic,
    RuleBased,
    /// Nothing recognized; a universal permission was substituted.
    FallbackUniversal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerMetadata {
    pub method: CompilationMethod,
    pub sentences: usize,
    pub matched_sentences: usize,
    pub warnings: Vec<String>,
}

/// The clauses compiled from one policy text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompiledPolicy {
    pub clauses: Vec<DeonticClause>,
    /// Digest of the source text this was compiled from.
    pub source_digest: Cid,
    pub compiled_at: DateTime<Utc>,
    pub metadata: CompilerMetadata,
}

impl CompiledPolicy {
    pub fn clauses_of(&self, kind: ClauseKind) -> impl Iterator<Item = &DeonticClause> {
        self.clauses.iter().filter(move |c| c.kind == kind)
    }

    pub fn prohibitions(&self) -> impl Iterator<Item = &DeonticClause> {
        self.clauses_of(ClauseKind::Prohibition)
    }

    pub fn permissions(&self) -> impl Iterator<Item = &DeonticClause> {
        self.clauses_of(ClauseKind::Permission)
    }

    pub fn obligations(&self) -> impl Iterator<Item = &DeonticClause> {
        self.clauses_of(ClauseKind::Obligation)
    }
}

/// Digest of a policy source text.
pub fn source_digest(text: &str) -> Cid {
    Cid::of_bytes(text.as_bytes())
}

/// Default deadline for one linguistic converter call.
pub const DEFAULT_CONVERTER_TIMEOUT: Duration = Duration::from_secs(2);

/// Natural-language policy compiler.
#[derive(Clone)]
pub struct NlPolicyCompiler {
    converter: Option<Arc<dyn LinguisticConverter>>,
    converter_timeout: Duration,
}

impl Default for NlPolicyCompiler {
    fn default() -> Self {
        Self {
            converter: None,
            converter_timeout: DEFAULT_CONVERTER_TIMEOUT,
        }
    }
}

impl NlPolicyCompiler {
    /// Rule-based only.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_converter(converter: Arc<dyn LinguisticConverter>) -> Self {
        Self {
            converter: Some(converter),
            ..Self::default()
        }
    }

    /// Deadline for each converter call; past it the idioms are used.
    pub fn converter_timeout(mut self, timeout: Duration) -> Self {
        self.converter_timeout = timeout;
        self
    }

    pub fn has_converter(&self) -> bool {
        self.converter.is_some()
    }

    /// Run the converter on its own thread and wait at most the deadline.
    /// A converter that overruns keeps its thread until it returns; the
    /// result is dropped.
    fn convert_bounded(
        &self,
        converter: &Arc<dyn LinguisticConverter>,
        text: &str,
    ) -> Result<Vec<ClauseTriple>, ConverterError> {
        let (tx, rx) = mpsc::sync_channel(1);
        let worker = Arc::clone(converter);
        let owned = text.to_owned();
        thread::Builder::new()
            .name("toolgate-nl-converter".into())
            .spawn(move || {
                let _ = tx.send(worker.convert(&owned));
            })
            .map_err(|err| ConverterError::Unavailable(err.to_string()))?;

        match rx.recv_timeout(self.converter_timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => Err(ConverterError::TimedOut),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(ConverterError::Failed(
                "converter exited without a result".into(),
            )),
        }
    }

    /// Compile `text`. Never fails: an unparseable text compiles to a single
    /// universal permission and records a warning.
    pub fn compile(&self, text: &str) -> CompiledPolicy {
        let sentences = split_sentences(text);
        let mut warnings = Vec::new();

        if let Some(converter) = &self.converter {
            match self.convert_bounded(converter, text) {
                Ok(triples) if !triples.is_empty() => {
                    let clauses: Vec<DeonticClause> =
                        triples.into_iter().map(clause_from_triple).collect();
                    debug!(
                        converter = %converter.name(),
                        clauses = clauses.len(),
                        "Policy compiled by linguistic converter"
                    );
                    return finish(
                        text,
                        clauses,
                        CompilationMethod::Linguistic,
                        sentences.len(),
                        sentences.len(),
                        warnings,
                    );
                }
                Ok(_) => {
                    warnings.push(format!(
                        "converter '{}' produced no clauses; using rule-based idioms",
                        converter.name()
                    ));
                }
                Err(err) => {
                    warn!(converter = %converter.name(), error = %err, "Linguistic converter failed, using rule-based idioms");
                    warnings.push(format!("{}; using rule-based idioms", err));
                }
            }
        }

        let mut clauses = Vec::new();
        for sentence in &sentences {
            if let Some(clause) = match_sentence(sentence) {
                clauses.push(clause);
            }
        }
        let matched = clauses.len();

        if clauses.is_empty() {
            let message = format!(
                "no recognizable policy idiom in {} sentence(s); substituting universal permission",
                sentences.len()
            );
            warn!(sentences = sentences.len(), "Policy compiled to universal permission");
            warnings.push(message);
            return finish(
                text,
                vec![DeonticClause::universal_permission()],
                CompilationMethod::FallbackUniversal,
                sentences.len(),
                0,
                warnings,
            );
        }

        finish(
            text,
            clauses,
            CompilationMethod::RuleBased,
            sentences.len(),
            matched,
            warnings,
        )
    }
}

fn clause_from_triple(triple: ClauseTriple) -> DeonticClause {
    let clause = DeonticClause::new(
        triple.kind,
        normalize_actor(&triple.actor),
        normalize_action(&triple.action),
    );
    match triple.resource {
        Some(resource) => clause.with_resource(resource),
        None => clause,
    }
}

fn finish(
    text: &str,
    clauses: Vec<DeonticClause>,
    method: CompilationMethod,
    sentences: usize,
    matched_sentences: usize,
    warnings: Vec<String>,
) -> CompiledPolicy {
    CompiledPolicy {
        clauses,
        source_digest: source_digest(text),
        compiled_at: Utc::now(),
        metadata: CompilerMetadata {
            method,
            sentences,
            matched_sentences,
            warnings,
        },
    }
}
