/// Rewrite self-scoring: narrative fidelity rubric and indicator-based
/// bias reduction, both measured with the shared taxonomy.
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::core::taxonomy::{self, IndicatorFamilies};
use crate::core::text;

/// Score reported when the original text carries no bias indicators.
pub const BASELINE_REDUCTION: f64 = 50.0;
/// Points per component of the quality rubric.
pub const COMPONENT_MAX: f64 = 20.0;
/// Cap on the profession-signal credit added to the reduction score.
pub const PROFESSION_CREDIT_MAX: f64 = 30.0;

/// The five quality rubric components, each in `0..=20`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityBreakdown {
    pub sentence_preservation: f64,
    pub name_preservation: f64,
    pub word_retention: f64,
    pub bias_credit: f64,
    pub length_ratio: f64,
}

impl QualityBreakdown {
    pub fn assess(original: &str, rewritten: &str, bias_reduction: f64) -> Self {
        Self {
            sentence_preservation: sentence_preservation(original, rewritten),
            name_preservation: name_preservation(original, rewritten),
            word_retention: word_retention(original, rewritten),
            bias_credit: (bias_reduction / 5.0).clamp(0.0, COMPONENT_MAX),
            length_ratio: length_ratio(original, rewritten),
        }
    }

    /// Sum of the components, `0..=100`.
    pub fn total(&self) -> f64 {
        self.sentence_preservation
            + self.name_preservation
            + self.word_retention
            + self.bias_credit
            + self.length_ratio
    }
}

pub fn quality_score(original: &str, rewritten: &str, bias_reduction: f64) -> f64 {
    QualityBreakdown::assess(original, rewritten, bias_reduction).total()
}

fn sentence_preservation(original: &str, rewritten: &str) -> f64 {
    match text::sentence_count(original).abs_diff(text::sentence_count(rewritten)) {
        0 | 1 => 20.0,
        2 => 15.0,
        _ => 10.0,
    }
}

fn name_preservation(original: &str, rewritten: &str) -> f64 {
    let names: FxHashSet<&str> = text::capitalized_words(original)
        .into_iter()
        .map(|t| t.text)
        .collect();
    if names.is_empty() {
        return COMPONENT_MAX;
    }
    let kept: FxHashSet<&str> = text::capitalized_words(rewritten)
        .into_iter()
        .map(|t| t.text)
        .collect();
    let retained = names.iter().filter(|n| kept.contains(*n)).count();
    retained as f64 / names.len() as f64 * COMPONENT_MAX
}

fn word_retention(original: &str, rewritten: &str) -> f64 {
    let before = text::word_count(original) as f64;
    let after = text::word_count(rewritten) as f64;
    if after >= before * 0.8 {
        20.0
    } else {
        10.0
    }
}

fn length_ratio(original: &str, rewritten: &str) -> f64 {
    let before = original.chars().count();
    let ratio = if before == 0 {
        1.0
    } else {
        rewritten.chars().count() as f64 / before as f64
    };
    if (0.8..=1.5).contains(&ratio) {
        20.0
    } else if (0.6..=2.0).contains(&ratio) {
        15.0
    } else {
        10.0
    }
}

/// Percentage drop in relationship, passive and appearance indicator hits,
/// plus up to 30 points for new profession signals, capped at 100.
pub fn bias_reduction_score(indicators: &IndicatorFamilies, original: &str, rewritten: &str) -> f64 {
    let before = indicators.bias_hits(original);
    if before == 0 {
        return BASELINE_REDUCTION;
    }
    let after = indicators.bias_hits(rewritten);
    let reduction = ((before as f64 - after as f64) / before as f64 * 100.0).max(0.0);

    let gained = indicators
        .profession_hits(rewritten)
        .saturating_sub(indicators.profession_hits(original));
    let credit = (gained as f64 * 10.0).min(PROFESSION_CREDIT_MAX);

    (reduction + credit).min(100.0)
}

/// Describe what an externally produced rewrite changed, by comparing
/// indicator families present before and after.
pub fn infer_improvements(indicators: &IndicatorFamilies, original: &str, rewritten: &str) -> Vec<String> {
    let count = |passage: &str, terms: &[String]| taxonomy::present(passage, terms).len();
    let mut improvements = Vec::new();

    if count(rewritten, &indicators.profession_signals) > count(original, &indicators.profession_signals) {
        improvements.push("Added professional identity to characters".to_string());
    }

    let fewer_passive = count(rewritten, &indicators.passive) < count(original, &indicators.passive);
    let more_active = count(rewritten, &indicators.active) > count(original, &indicators.active);
    if fewer_passive || more_active {
        improvements.push("Improved character agency and active voice".to_string());
    }

    if count(rewritten, &indicators.appearance) < count(original, &indicators.appearance) {
        improvements.push("Reduced focus on physical appearance".to_string());
    }

    if count(rewritten, &indicators.independence) > count(original, &indicators.independence) {
        improvements.push("Added independent identity alongside relationships".to_string());
    }

    improvements
}
