//! Property tests for scoring, extraction and rewrite self-scoring.

use narrative_bias::core::extractor::CharacterExtractor;
use narrative_bias::core::quality;
use narrative_bias::core::rewriter::RewriteEngine;
use narrative_bias::core::scorer::BiasScorer;
use narrative_bias::core::taxonomy::{IndicatorFamilies, Taxonomy};
use narrative_bias::schema::bias::{BiasDimension, BiasVector};
use narrative_bias::schema::character::{Character, Gender, MAX_AGENCY, MIN_AGENCY};
use proptest::prelude::*;

const VOCABULARY: &[&str] = &[
    "Priya", "Rohit", "Meera", "Raj", "Margaret", "Tobias", "The", "Mr", "She", "she", "her",
    "he", "him", "waits", "for", "decides", "leads", "beautiful", "pretty", "daughter", "of",
    "wife", "sister", "belongs", "to", "doctor", "housewife", "is", "and", "a", "news", "the",
    "family", ",", ".", "!", "?", "\n", "RAJ:", "PRIYA:",
];

fn arb_text() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(VOCABULARY), 0..60).prop_map(|words| words.join(" "))
}

fn arb_gender() -> impl Strategy<Value = Gender> {
    prop_oneof![Just(Gender::Female), Just(Gender::Male), Just(Gender::Unknown)]
}

fn arb_terms(pool: &'static [&'static str]) -> impl Strategy<Value = Vec<String>> {
    prop::sample::subsequence(pool, 0..=pool.len())
        .prop_map(|terms| terms.into_iter().map(str::to_string).collect())
}

prop_compose! {
    fn arb_character()(
        gender in arb_gender(),
        professions in arb_terms(&["doctor", "engineer", "teacher"]),
        relationships in arb_terms(&["daughter of", "wife of"]),
        agency_level in MIN_AGENCY..=MAX_AGENCY,
        appearance in arb_terms(&["beautiful", "pretty", "lovely"]),
        dialogue_count in 0usize..30,
        screen_time_proxy in 0.0f64..60.0,
    ) -> Character {
        Character {
            name: "Someone".to_string(),
            gender,
            professions,
            relationships,
            agency_level,
            appearance_descriptors: appearance,
            dialogue_count,
            screen_time_proxy,
        }
    }
}

fn arb_flags() -> impl Strategy<Value = Vec<BiasDimension>> {
    prop::sample::subsequence(BiasDimension::ALL.to_vec(), 0..=6)
}

const REWRITABLE: [BiasDimension; 4] = [
    BiasDimension::OccupationGap,
    BiasDimension::AgencyGap,
    BiasDimension::AppearanceFocus,
    BiasDimension::RelationshipDefining,
];

/// Sentence shapes that each trigger a different structural rule.
const RULE_SENTENCES: &[&str] = &[
    "{her}, daughter of {him}, lives here.",
    "{her} waits for {him}.",
    "{her} is beautiful and hopes for a letter.",
    "{her}, wife of {him}, smiles.",
    "{her} belongs to {him}.",
];

/// Passages of two to five distinct rule-matching sentences.
fn arb_rule_passage() -> impl Strategy<Value = String> {
    let heroines = prop::sample::select(&["Priya", "Priya Sharma", "Meera Rao", "Anjali Kapoor", "Kavya"][..]);
    let heroes = prop::sample::select(&["Raj", "Vijay Singh", "Arjun"][..]);
    prop::sample::subsequence(RULE_SENTENCES, 2..=RULE_SENTENCES.len())
        .prop_flat_map(move |shapes| {
            let n = shapes.len();
            (
                Just(shapes),
                prop::collection::vec(heroines.clone(), n),
                prop::collection::vec(heroes.clone(), n),
            )
        })
        .prop_map(|(shapes, her, him)| {
            shapes
                .iter()
                .zip(her.iter().zip(&him))
                .map(|(shape, (h, m))| shape.replace("{her}", h).replace("{him}", m))
                .collect::<Vec<_>>()
                .join(" ")
        })
}

proptest! {
    #[test]
    fn overall_is_mean_of_dimensions(cast in prop::collection::vec(arb_character(), 0..8)) {
        let v = BiasScorer::score(&cast);
        let expected = (v.occupation_gap
            + v.agency_gap
            + v.appearance_focus
            + v.relationship_defining
            + v.dialogue_imbalance
            + v.screen_time_imbalance)
            / 6.0;
        prop_assert_eq!(v.overall, expected);
        for dimension in BiasDimension::ALL {
            prop_assert!(v.get(dimension) >= 0.0);
        }
    }

    #[test]
    fn no_female_characters_means_no_bias(cast in prop::collection::vec(arb_character(), 0..8)) {
        let cast: Vec<Character> = cast
            .into_iter()
            .filter(|c| c.gender != Gender::Female)
            .collect();
        prop_assert_eq!(BiasScorer::score(&cast), BiasVector::default());
    }

    #[test]
    fn extraction_is_idempotent(text in arb_text()) {
        let taxonomy = Taxonomy::default();
        let extractor = CharacterExtractor::new(&taxonomy);
        let first = extractor.extract(&text);
        prop_assert_eq!(&first, &extractor.extract(&text));
        prop_assert!(first.len() <= 10);
        for character in &first {
            prop_assert!((MIN_AGENCY..=MAX_AGENCY).contains(&character.agency_level));
        }
    }

    #[test]
    fn reduction_score_is_bounded(original in arb_text(), rewritten in arb_text()) {
        let score = quality::bias_reduction_score(&IndicatorFamilies::default(), &original, &rewritten);
        prop_assert!((0.0..=100.0).contains(&score));
    }

    #[test]
    fn quality_score_is_bounded(original in arb_text(), rewritten in arb_text(), reduction in 0.0f64..=100.0) {
        let score = quality::quality_score(&original, &rewritten, reduction);
        prop_assert!((30.0..=100.0).contains(&score));
    }

    #[test]
    fn rewrite_scores_stay_in_range(text in arb_text(), flags in arb_flags(), seed in any::<u64>()) {
        let engine = RewriteEngine::builder().seed(seed).build().unwrap();
        let result = engine.rewrite_seeded(&text, &flags);
        prop_assert_eq!(&result.original_text, &text);
        prop_assert!((0.0..=100.0).contains(&result.quality_score));
        prop_assert!((0.0..=100.0).contains(&result.bias_reduction_score));
        prop_assert_eq!(result.rewritten_text != text, !result.improvements.is_empty());
    }

    #[test]
    fn rewrites_with_two_rule_matches_keep_quality(text in arb_rule_passage(), seed in any::<u64>()) {
        let engine = RewriteEngine::builder().seed(seed).build().unwrap();
        let result = engine.rewrite_seeded(&text, &REWRITABLE);
        prop_assert!(result.improvements.len() >= 2, "{:?}", result.improvements);
        prop_assert!(result.quality_score >= 60.0, "{}: {}", result.rewritten_text, result.quality_score);
    }
}
