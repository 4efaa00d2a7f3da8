//! Property tests: risk scores are bounded, monotone in trust, and the
//! pipeline short-circuits on the first failing stage.

use proptest::prelude::*;
use toolgate_pipeline::{CheckContext, GatewayConfig, StageId, StageToggles};
use toolgate_risk::{RiskLevel, RiskScorer, RiskScoringPolicy};
use toolgate_tests::intent;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn score_is_bounded_and_level_consistent(
        base in 0.0f64..=1.0,
        trust in 0.0f64..=1.0,
        params in 0usize..12,
    ) {
        let policy = RiskScoringPolicy::default()
            .with_tool_risk("tool", base)
            .with_actor_trust("actor", trust);
        let intent = (0..params)
            .fold(toolgate_types::Intent::builder("tool").actor("actor"), |b, i| {
                b.param(format!("p{i}"), i as u64)
            })
            .build()
            .unwrap();

        let score = RiskScorer::default().score_intent(&intent, &policy);
        prop_assert!((0.0..=1.0).contains(&score.score));
        prop_assert_eq!(score.level, RiskLevel::from_score(score.score));
        prop_assert_eq!(score.level.needs_mitigation(), !score.mitigations.is_empty());
    }

    #[test]
    fn more_trust_never_raises_risk(
        base in 0.0f64..=1.0,
        low in 0.0f64..=1.0,
        delta in 0.0f64..=1.0,
    ) {
        let high = (low + delta).min(1.0);
        let scorer = RiskScorer::default();
        let policy = RiskScoringPolicy::default()
            .with_tool_risk("deploy", base)
            .with_actor_trust("careful", high)
            .with_actor_trust("careless", low);

        let careful = scorer.score_intent(&intent("deploy", "careful"), &policy);
        let careless = scorer.score_intent(&intent("deploy", "careless"), &policy);
        prop_assert!(careful.score <= careless.score + 1e-12);
    }

    #[test]
    fn disabled_pipeline_allows_anything(tool in "[A-Za-z0-9_-]{0,12}", actor in "[a-z ]{0,8}") {
        let pipeline = GatewayConfig::default().build_pipeline();
        let intent = toolgate_types::Intent::builder(tool).actor(actor).build().unwrap();
        let result = runtime().block_on(pipeline.check(&intent, &CheckContext::new()));
        prop_assert!(result.allowed);
        prop_assert_eq!(result.outcomes.len(), 1);
        prop_assert_eq!(result.outcomes[0].stage, StageId::Pass);
    }

    #[test]
    fn compliance_denial_stops_before_risk(tool in "[A-Z-][A-Za-z-]{0,10}") {
        let config = GatewayConfig {
            stages: StageToggles { compliance: true, risk: true, ..StageToggles::default() },
            ..GatewayConfig::default()
        };
        let pipeline = config.build_pipeline();
        let result = runtime().block_on(pipeline.check(&intent(&tool, "alice"), &CheckContext::new()));

        prop_assert!(!result.allowed);
        prop_assert_eq!(result.blocking_stage, Some(StageId::Compliance));
        prop_assert!(result.outcome(StageId::Risk).is_none());
    }
}
