use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use toolgate_types::Cid;
use tracing::{debug, info, warn};

use crate::compiler::{source_digest, CompiledPolicy, NlPolicyCompiler};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyRegistryError {
    #[error("policy not registered: {0}")]
    NotFound(String),
}

/// A live, shared policy text.
///
/// Clones share the same text; a change made through any clone is picked up
/// by the registry on the next `get`.
#[derive(Clone, Debug, Default)]
pub struct PolicySource {
    text: Arc<RwLock<String>>,
}

impl PolicySource {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Arc::new(RwLock::new(text.into())),
        }
    }

    pub fn text(&self) -> String {
        self.text.read().clone()
    }

    pub fn set_text(&self, text: impl Into<String>) {
        *self.text.write() = text.into();
    }

    pub fn digest(&self) -> Cid {
        source_digest(&self.text.read())
    }

    /// Whether both handles share the same text.
    pub fn same_as(&self, other: &PolicySource) -> bool {
        Arc::ptr_eq(&self.text, &other.text)
    }
}

struct Entry {
    source: PolicySource,
    compiled: CompiledPolicy,
}

/// Policy Registry - named (source, compiled) pairs.
///
/// `get` recompiles a policy only when its live source digest no longer
/// matches the digest it was compiled from.
pub struct PolicyRegistry {
    compiler: NlPolicyCompiler,
    entries: RwLock<BTreeMap<String, Entry>>,
}

impl PolicyRegistry {
    pub fn new(compiler: NlPolicyCompiler) -> Self {
        Self {
            compiler,
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn compiler(&self) -> &NlPolicyCompiler {
        &self.compiler
    }

    /// Register (or replace) a policy backed by a live source.
    pub fn register(&self, name: impl Into<String>, source: PolicySource) -> CompiledPolicy {
        let name = name.into();
        let compiled = self.compiler.compile(&source.text());
        let replaced = self.entries.write().insert(
            name.clone(),
            Entry {
                source,
                compiled: compiled.clone(),
            },
        );
        info!(
            policy = %name,
            clauses = compiled.clauses.len(),
            method = ?compiled.metadata.method,
            replaced = replaced.is_some(),
            "Policy registered"
        );
        compiled
    }

    /// Register a policy from plain text, returning the live source handle.
    pub fn register_text(&self, name: impl Into<String>, text: impl Into<String>) -> PolicySource {
        let source = PolicySource::new(text);
        self.register(name, source.clone());
        source
    }

    /// Replace a registered policy's source text. Recompilation happens on
    /// the next `get`.
    pub fn update_source(&self, name: &str, text: impl Into<String>) -> Result<(), PolicyRegistryError> {
        let entries = self.entries.read();
        let entry = entries
            .get(name)
            .ok_or_else(|| PolicyRegistryError::NotFound(name.to_string()))?;
        entry.source.set_text(text);
        debug!(policy = %name, "Policy source updated");
        Ok(())
    }

    pub fn source(&self, name: &str) -> Option<PolicySource> {
        self.entries.read().get(name).map(|e| e.source.clone())
    }

    /// The compiled policy, recompiled first if its source changed.
    ///
    /// Compilation runs without the registry lock held. A recompile is only
    /// stored if the entry was not re-registered or recompiled meanwhile;
    /// otherwise the lookup starts over against the newer entry.
    pub fn get(&self, name: &str) -> Option<CompiledPolicy> {
        loop {
            let (source, compiled) = {
                let entries = self.entries.read();
                let entry = entries.get(name)?;
                (entry.source.clone(), entry.compiled.clone())
            };

            let text = source.text();
            let live = source_digest(&text);
            if live == compiled.source_digest {
                return Some(compiled);
            }

            let fresh = self.compiler.compile(&text);
            let mut entries = self.entries.write();
            let Some(entry) = entries.get_mut(name) else {
                warn!(policy = %name, "Policy removed during recompilation");
                return Some(fresh);
            };
            let unchanged = entry.source.same_as(&source)
                && entry.compiled.source_digest == compiled.source_digest
                && entry.compiled.compiled_at == compiled.compiled_at;
            if !unchanged {
                debug!(policy = %name, "Policy changed during recompilation, retrying");
                continue;
            }
            entry.compiled = fresh.clone();
            info!(
                policy = %name,
                digest = %live.short(),
                clauses = fresh.clauses.len(),
                "Policy recompiled after source change"
            );
            return Some(fresh);
        }
    }

    /// Registered names, sorted.
    pub fn list(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().contains_key(name)
    }

    pub fn remove(&self, name: &str) -> bool {
        let removed = self.entries.write().remove(name).is_some();
        if removed {
            info!(policy = %name, "Policy removed");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for PolicyRegistry {
    fn default() -> Self {
        Self::new(NlPolicyCompiler::new())
    }
}
