/// Rewrite integration tests: rule loading, ordered passes, self-scoring and
/// the hosted-model fallback.

use narrative_bias::core::analysis::BiasAnalyzer;
use narrative_bias::core::model::{LanguageModel, ModelError, ModelPrompt};
use narrative_bias::core::rewriter::{RewriteEngine, RewriteError};
use narrative_bias::core::rules::{RuleError, RuleSet};
use narrative_bias::schema::bias::BiasDimension;
use narrative_bias::schema::rewrite::RewriteMode;
use rand::rngs::StdRng;
use rand::SeedableRng;

const ALL_REWRITABLE: [BiasDimension; 4] = [
    BiasDimension::OccupationGap,
    BiasDimension::AgencyGap,
    BiasDimension::AppearanceFocus,
    BiasDimension::RelationshipDefining,
];

fn engine(seed: u64) -> RewriteEngine {
    RewriteEngine::builder().seed(seed).build().unwrap()
}

#[test]
fn passive_waiting_becomes_active() {
    let result = engine(42).rewrite_seeded(
        "Priya waits for her father's decision",
        &[BiasDimension::AgencyGap],
    );
    assert!(!result.rewritten_text.contains("waits for"));
    assert!(result.rewritten_text.starts_with("Priya "));
    assert!(!result.improvements.is_empty());
    assert_eq!(result.mode, RewriteMode::RuleBased);
}

#[test]
fn multiple_rule_matches_keep_quality_high() {
    let text = "Priya, daughter of Mr. Sharma, is beautiful and waits for her father's decision.";
    for seed in 0..8 {
        let result = engine(seed).rewrite_seeded(text, &ALL_REWRITABLE);
        assert!(result.improvements.len() >= 2, "{:?}", result.improvements);
        assert!(result.quality_score >= 60.0, "seed {seed}: {}", result.quality_score);
        assert!(result.bias_reduction_score > 50.0);
        assert!(result.rewritten_text.contains("daughter of Mr. Sharma"));
    }
}

#[test]
fn analysis_flags_drive_rewrite() {
    let text = "Sonia Saxena, daughter of Mr Saxena, is beautiful and comes from a wealthy family";
    let report = BiasAnalyzer::default().analyze("intro", text);
    let flags = report.bias.rewrite_flags();
    assert_eq!(flags, vec![BiasDimension::RelationshipDefining]);

    let result = engine(1).rewrite_seeded(text, &flags);
    assert_ne!(result.rewritten_text, result.original_text);
    assert!(result.rewritten_text.contains("daughter of Mr Saxena"));
    assert!(result
        .suggestions
        .iter()
        .any(|s| s.contains("beyond family relationships")));
}

#[test]
fn fixed_seed_reproduces_text() {
    let text = "Beautiful Meera, wife of Raj, hopes for a better future. She depends on Raj.";
    let a = engine(9).rewrite_seeded(text, &ALL_REWRITABLE);
    let b = engine(9).rewrite_seeded(text, &ALL_REWRITABLE);
    assert_eq!(a, b);

    let mut rng = StdRng::seed_from_u64(9);
    let c = engine(0).rewrite(text, &ALL_REWRITABLE, &mut rng);
    assert_eq!(a, c);
}

#[test]
fn alternatives_are_ranked_by_quality() {
    let text = "Beautiful Meera, wife of Raj, hopes for a better future. She depends on Raj.";
    let alternatives = engine(5).rewrite_alternatives(text, &ALL_REWRITABLE, 6);
    assert_eq!(alternatives.len(), 6);
    assert!(alternatives
        .windows(2)
        .all(|w| w[0].quality_score >= w[1].quality_score));
    assert!(engine(5).rewrite_alternatives(text, &ALL_REWRITABLE, 0).is_empty());
}

#[test]
fn rules_file_replaces_one_dimension() {
    let engine = RewriteEngine::builder()
        .rules_path("tests/fixtures/agency_rules.ron")
        .build()
        .unwrap();
    let result = engine.rewrite_seeded(
        "Priya waits for her father's decision",
        &[BiasDimension::AgencyGap],
    );
    assert_eq!(result.rewritten_text, "Priya goes after her father's decision");
    assert_eq!(
        result.improvements,
        vec!["Replaced waiting with pursuit".to_string()]
    );

    // Other dimensions keep their built-in rules
    let result = engine.rewrite_seeded(
        "Rani, sister of Vijay, sings.",
        &[BiasDimension::OccupationGap],
    );
    assert!(result.rewritten_text.contains("a career woman and sister of Vijay"));
}

#[test]
fn taxonomy_file_adds_replacements() {
    let engine = RewriteEngine::builder()
        .taxonomy_path("tests/fixtures/taxonomy_override.ron")
        .build()
        .unwrap();
    let result = engine.rewrite_seeded(
        "Eleanor is dazzling tonight.",
        &[BiasDimension::AppearanceFocus],
    );
    assert_eq!(result.rewritten_text, "Eleanor is resourceful tonight.");
}

#[test]
fn unknown_dimension_key_is_rejected() {
    let err = RewriteEngine::builder()
        .rules_path("tests/fixtures/unknown_dimension.ron")
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        RewriteError::Rules(RuleError::UnknownDimension(_))
    ));
}

#[test]
fn in_memory_rules_skip_builtin() {
    let engine = RewriteEngine::builder()
        .with_rules(RuleSet::default())
        .build()
        .unwrap();
    let result = engine.rewrite_seeded(
        "Rani, sister of Vijay, sings.",
        &[BiasDimension::RelationshipDefining],
    );
    assert_eq!(result.rewritten_text, "Rani, sister of Vijay, sings.");
}

struct OfflineModel;

impl LanguageModel for OfflineModel {
    fn complete(&self, _prompt: &ModelPrompt) -> Result<String, ModelError> {
        Err(ModelError::Unavailable("no network".to_string()))
    }
}

#[test]
fn model_failure_yields_marked_fallback() {
    let engine = engine(3);
    let text = "Priya, daughter of Mr. Sharma, is beautiful.";
    let flags = [BiasDimension::AppearanceFocus, BiasDimension::RelationshipDefining];

    let fallback = engine.rewrite_with_model(&OfflineModel, text, &flags, &mut StdRng::seed_from_u64(3));
    let rules = engine.rewrite_seeded(text, &flags);

    assert_eq!(fallback.mode, RewriteMode::Fallback);
    assert!(fallback.mode.is_degraded());
    assert_eq!(fallback.rewritten_text, rules.rewritten_text);
    assert_eq!(fallback.improvements, rules.improvements);
    assert_eq!(fallback.suggestions, rules.suggestions);
}

#[test]
fn batch_rewrites_preserve_order() {
    let engine = engine(11);
    let texts: Vec<String> = vec![
        "Priya waits for her father's decision".to_string(),
        "Nothing to change here.".to_string(),
        "Beautiful Meera smiles at Raj.".to_string(),
    ];
    let results = engine.rewrite_batch(&texts, &ALL_REWRITABLE);
    assert_eq!(results.len(), 3);
    for (result, text) in results.iter().zip(&texts) {
        assert_eq!(&result.original_text, text);
    }
    assert_eq!(results[1].rewritten_text, texts[1]);
    assert_eq!(results[1].bias_reduction_score, 50.0);
}
