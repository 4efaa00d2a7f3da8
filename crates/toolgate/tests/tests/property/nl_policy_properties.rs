//! Property tests: NL policy compilation falls back safely, the gate is
//! prohibition-first, and registry entries follow their live sources.

use proptest::prelude::*;
use std::sync::Arc;
use toolgate_nl_policy::{
    source_digest, CompilationMethod, DeonticClause, GateRequest, NlPolicyCompiler, PolicyGate,
    PolicyRegistry,
};

const MODALS: &[&str] = &[
    "may", "can", "must", "shall", "cannot", "permitted", "prohibited", "forbidden",
];

/// Sentences built from lowercase words, none of them a modal.
fn arb_idiomless_text() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop::collection::vec("[a-z]{1,8}", 1..6)
            .prop_filter("no modal words", |words| {
                words.iter().all(|w| !MODALS.contains(&w.as_str()))
            })
            .prop_map(|words| words.join(" ")),
        1..4,
    )
    .prop_map(|sentences| sentences.join(". "))
}

fn arb_name() -> impl Strategy<Value = String> {
    prop_oneof![Just("alice"), Just("bob"), Just("carol"), Just("dave")].prop_map(String::from)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(96))]

    #[test]
    fn idiomless_text_compiles_to_universal_permission(text in arb_idiomless_text()) {
        let compiled = NlPolicyCompiler::new().compile(&text);
        prop_assert_eq!(compiled.clauses, vec![DeonticClause::universal_permission()]);
        prop_assert_eq!(compiled.metadata.method, CompilationMethod::FallbackUniversal);
        prop_assert_eq!(compiled.metadata.warnings.len(), 1);
        prop_assert_eq!(compiled.source_digest, source_digest(&text));
    }

    #[test]
    fn permissions_alone_never_deny(
        subject in arb_name(),
        actor in arb_name(),
        tool in "[a-z_]{1,10}",
    ) {
        let registry = Arc::new(PolicyRegistry::default());
        registry.register_text("perms", format!("Only {subject} may deploy. {subject} can read files."));
        let gate = PolicyGate::new(registry);
        prop_assert!(gate.evaluate(&GateRequest::new(actor, tool)).is_allowed());
    }

    #[test]
    fn named_prohibition_denies_only_its_actor(target in arb_name(), actor in arb_name()) {
        let registry = Arc::new(PolicyRegistry::default());
        registry.register_text("ops", format!("{target} must not deploy."));
        let gate = PolicyGate::new(registry);
        let decision = gate.evaluate(&GateRequest::new(actor.clone(), "deploy"));
        prop_assert_eq!(decision.is_allowed(), actor != target);
    }

    #[test]
    fn registry_follows_source_mutation(first in arb_idiomless_text(), second in arb_idiomless_text()) {
        let registry = PolicyRegistry::default();
        let source = registry.register_text("live", first.clone());
        prop_assert_eq!(registry.get("live").unwrap().source_digest, source_digest(&first));

        source.set_text(second.clone());
        prop_assert_eq!(registry.get("live").unwrap().source_digest, source_digest(&second));
    }
}
