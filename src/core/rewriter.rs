/// The rewrite engine: ordered, dimension-gated text rewrites followed by
/// self-scoring with the shared taxonomy.
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::model::{LanguageModel, ModelError, ModelPrompt};
use crate::core::quality;
use crate::core::rules::{RuleError, RuleSet};
use crate::core::taxonomy::{Replacement, Taxonomy, TaxonomyError};
use crate::core::text;
use crate::schema::bias::BiasDimension;
use crate::schema::rewrite::{RewriteMode, RewriteResult};

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("taxonomy error: {0}")]
    Taxonomy(#[from] TaxonomyError),
    #[error("rule error: {0}")]
    Rules(#[from] RuleError),
}

/// Text being rewritten plus the log of what has fired so far.
struct Draft {
    text: String,
    improvements: Vec<String>,
}

impl Draft {
    fn record(&mut self, text: String, note: impl Into<String>) {
        let note = note.into();
        debug!(note = %note, "rewrite fired");
        self.text = text;
        self.improvements.push(note);
    }
}

/// Rewrites passages to reduce flagged bias patterns. Built via
/// `RewriteEngine::builder()`.
#[derive(Debug, Clone)]
pub struct RewriteEngine {
    taxonomy: Taxonomy,
    rules: RuleSet,
    seed: u64,
}

/// Builder for constructing a `RewriteEngine`.
#[derive(Debug, Default)]
pub struct RewriteEngineBuilder {
    taxonomy_path: Option<PathBuf>,
    rules_path: Option<PathBuf>,
    seed: u64,
    /// Directly provided taxonomy (for testing without files).
    taxonomy: Option<Taxonomy>,
    /// Directly provided rules (for testing without files).
    rules: Option<RuleSet>,
}

impl RewriteEngine {
    pub fn builder() -> RewriteEngineBuilder {
        RewriteEngineBuilder::default()
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Independent source for alternative or batch slot `index`.
    fn rng_for(&self, index: u64) -> StdRng {
        StdRng::seed_from_u64(self.seed.wrapping_add(index))
    }

    /// Rewrite `text` for the flagged dimensions, drawing synonym choices
    /// from `rng`.
    ///
    /// Order: structural rules per flagged dimension (each rule fires at most
    /// once), profession injection, then the appearance, agency,
    /// professional identity and relationship passes. Dialogue and screen
    /// time flags only affect suggestions.
    pub fn rewrite(&self, text: &str, flagged: &[BiasDimension], rng: &mut StdRng) -> RewriteResult {
        let flags = dedup(flagged);
        let mut draft = Draft {
            text: text.to_string(),
            improvements: Vec::new(),
        };

        for dimension in &flags {
            for rule in self.rules.rules_for(*dimension) {
                if let Some(next) = rule.apply(&draft.text) {
                    draft.record(next, rule.note.clone());
                }
            }
        }

        let occupation = flags.contains(&BiasDimension::OccupationGap);
        if occupation && !self.mentions_profession(&draft.text) {
            self.inject_profession(&mut draft, rng);
        }

        if flags.contains(&BiasDimension::AppearanceFocus) {
            self.replace_phrases(
                &mut draft,
                &self.taxonomy.rewrite.appearance_replacements,
                rng,
                |phrase, alt| format!("Replaced appearance-focused \"{phrase}\" with \"{alt}\""),
            );
        }
        if flags.contains(&BiasDimension::AgencyGap) {
            self.replace_phrases(
                &mut draft,
                &self.taxonomy.rewrite.agency_replacements,
                rng,
                |phrase, alt| format!("Converted passive \"{phrase}\" to active \"{alt}\""),
            );
        }
        if occupation {
            self.add_professional_identity(&mut draft, rng);
        }
        if flags.contains(&BiasDimension::RelationshipDefining) {
            self.reduce_relationship_dependency(&mut draft);
        }

        self.finish(text, draft, &flags, RewriteMode::RuleBased)
    }

    /// `rewrite` with the source reseeded from the engine seed.
    pub fn rewrite_seeded(&self, text: &str, flagged: &[BiasDimension]) -> RewriteResult {
        self.rewrite(text, flagged, &mut self.rng_for(0))
    }

    /// `count` rewrites, alternative `i` drawing from a source seeded with
    /// `seed + i`, sorted by quality score (best first, stable).
    pub fn rewrite_alternatives(
        &self,
        text: &str,
        flagged: &[BiasDimension],
        count: usize,
    ) -> Vec<RewriteResult> {
        let mut results: Vec<RewriteResult> = (0..count as u64)
            .map(|i| self.rewrite(text, flagged, &mut self.rng_for(i)))
            .collect();
        results.sort_by(|a, b| b.quality_score.total_cmp(&a.quality_score));
        results
    }

    /// Rewrite independent texts in parallel. Text `i` uses the same source
    /// as alternative `i`; output order matches input order.
    pub fn rewrite_batch(&self, texts: &[String], flagged: &[BiasDimension]) -> Vec<RewriteResult> {
        texts
            .par_iter()
            .enumerate()
            .map(|(i, t)| self.rewrite(t, flagged, &mut self.rng_for(i as u64)))
            .collect()
    }

    /// Ask a hosted model for the rewrite. Any model failure is logged and
    /// answered with the rule-based rewrite, marked `RewriteMode::Fallback`.
    pub fn rewrite_with_model(
        &self,
        model: &dyn LanguageModel,
        text: &str,
        flagged: &[BiasDimension],
        rng: &mut StdRng,
    ) -> RewriteResult {
        let flags = dedup(flagged);
        let prompt = ModelPrompt::for_rewrite(text, &flags);

        let completion = model.complete(&prompt).and_then(|raw| {
            let cleaned = raw.trim().trim_matches('"').trim();
            if cleaned.is_empty() {
                Err(ModelError::EmptyResponse)
            } else {
                Ok(cleaned.to_string())
            }
        });

        match completion {
            Ok(rewritten) => {
                let improvements =
                    quality::infer_improvements(&self.taxonomy.indicators, text, &rewritten);
                let draft = Draft {
                    text: rewritten,
                    improvements,
                };
                self.finish(text, draft, &flags, RewriteMode::HostedModel)
            }
            Err(e) => {
                warn!(error = %e, "hosted rewrite failed, falling back to rules");
                let mut result = self.rewrite(text, &flags, rng);
                result.mode = RewriteMode::Fallback;
                result
            }
        }
    }

    fn finish(
        &self,
        original: &str,
        draft: Draft,
        flags: &[BiasDimension],
        mode: RewriteMode,
    ) -> RewriteResult {
        let bias_reduction_score =
            quality::bias_reduction_score(&self.taxonomy.indicators, original, &draft.text);
        let quality_score = quality::quality_score(original, &draft.text, bias_reduction_score);

        RewriteResult {
            original_text: original.to_string(),
            rewritten_text: draft.text,
            quality_score,
            bias_reduction_score,
            improvements: draft.improvements,
            suggestions: suggestions(flags),
            mode,
        }
    }

    fn mentions_profession(&self, passage: &str) -> bool {
        self.taxonomy
            .professions
            .iter()
            .any(|p| text::contains_ci(passage, p))
    }

    /// Whether `passage` holds a female-context word as a whole word.
    fn has_female_context(&self, passage: &str) -> bool {
        let words = &self.taxonomy.rewrite.female_context_words;
        text::word_spans(passage)
            .iter()
            .any(|t| words.iter().any(|w| t.text.eq_ignore_ascii_case(w)))
    }

    /// End of the first capitalized run inside `start..end` holding a word
    /// that is not a stop-word or honorific. Multi-word names are kept whole.
    fn name_end_within(&self, passage: &str, start: usize, end: usize) -> Option<usize> {
        text::capitalized_run_spans(passage)
            .into_iter()
            .filter(|run| run.start >= start && run.end <= end)
            .find(|run| {
                run.text
                    .split_whitespace()
                    .any(|w| !self.taxonomy.is_excluded_name(w))
            })
            .map(|run| run.end)
    }

    /// Put a profession beside the first name in a sentence (or script line)
    /// that also holds a female-context word.
    fn inject_profession(&self, draft: &mut Draft, rng: &mut StdRng) {
        let target = text::sentence_spans(&draft.text)
            .into_iter()
            .filter(|segment| self.has_female_context(segment.text))
            .find_map(|segment| self.name_end_within(&draft.text, segment.start, segment.end));
        let Some(at) = target else {
            return;
        };
        let Some(profession) = self.taxonomy.rewrite.injected_professions.choose(rng) else {
            return;
        };

        let phrase = format!("{} {}", text::indefinite_article(profession), profession);
        let next = text::insert_appositive(&draft.text, at, &phrase);
        draft.record(
            next,
            format!("Added profession ({profession}) to female character"),
        );
    }

    /// For each listed phrase present, replace its first occurrence with a
    /// randomly chosen alternative.
    fn replace_phrases<F>(
        &self,
        draft: &mut Draft,
        replacements: &[Replacement],
        rng: &mut StdRng,
        note: F,
    ) where
        F: Fn(&str, &str) -> String,
    {
        for replacement in replacements {
            if !text::contains_ci(&draft.text, &replacement.phrase) {
                continue;
            }
            let Some(alternative) = replacement.alternatives.choose(rng) else {
                continue;
            };
            if let Some(next) = text::replace_first_ci(&draft.text, &replacement.phrase, alternative)
            {
                draft.record(next, note(&replacement.phrase, alternative));
            }
        }
    }

    /// Qualify the first name with a profession when the passage has female
    /// context and no professional title yet.
    fn add_professional_identity(&self, draft: &mut Draft, rng: &mut StdRng) {
        if !self.has_female_context(&draft.text) {
            return;
        }
        let titled = self
            .taxonomy
            .rewrite
            .professional_titles
            .iter()
            .any(|t| text::contains_ci(&draft.text, t));
        if titled {
            return;
        }
        let Some(at) = self.name_end_within(&draft.text, 0, draft.text.len()) else {
            return;
        };
        let Some(qualifier) = self.taxonomy.rewrite.profession_qualifiers.choose(rng) else {
            return;
        };

        let next = text::insert_appositive(&draft.text, at, qualifier);
        draft.record(next, "Added professional identity to character introduction");
    }

    /// Add an independence qualifier next to relationship markers that still
    /// directly follow a name. The marker itself is kept.
    fn reduce_relationship_dependency(&self, draft: &mut Draft) {
        for rule in &self.rules.independence {
            if let Some(next) = rule.apply(&draft.text) {
                draft.record(next, rule.note.clone());
            }
        }
    }
}

fn dedup(flagged: &[BiasDimension]) -> Vec<BiasDimension> {
    let mut flags = Vec::with_capacity(flagged.len());
    for dimension in flagged {
        if !flags.contains(dimension) {
            flags.push(*dimension);
        }
    }
    flags
}

/// Follow-up advice for the flagged dimensions plus two general notes.
pub fn suggestions(flagged: &[BiasDimension]) -> Vec<String> {
    let mut out: Vec<String> = flagged
        .iter()
        .filter_map(|d| match d {
            BiasDimension::OccupationGap => {
                Some("Consider adding specific career achievements or professional goals")
            }
            BiasDimension::AgencyGap => {
                Some("Show character making independent decisions and taking initiative")
            }
            BiasDimension::AppearanceFocus => {
                Some("Focus more on character's skills, personality, and achievements")
            }
            BiasDimension::RelationshipDefining => {
                Some("Develop character's individual identity beyond family relationships")
            }
            BiasDimension::DialogueImbalance | BiasDimension::ScreenTimeImbalance => None,
        })
        .map(str::to_string)
        .collect();
    out.push("Ensure equal dialogue and screen time for all genders".to_string());
    out.push("Include diverse professional backgrounds for all characters".to_string());
    out
}

impl RewriteEngineBuilder {
    /// RON taxonomy file merged over the base taxonomy.
    pub fn taxonomy_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.taxonomy_path = Some(path.into());
        self
    }

    /// RON rule file merged over the base rules.
    pub fn rules_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.rules_path = Some(path.into());
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Provide the base taxonomy directly instead of the built-in one.
    pub fn with_taxonomy(mut self, taxonomy: Taxonomy) -> Self {
        self.taxonomy = Some(taxonomy);
        self
    }

    /// Provide the base rules directly instead of the built-in ones.
    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Fails when a configured file cannot be read or parsed.
    pub fn build(self) -> Result<RewriteEngine, RewriteError> {
        let mut taxonomy = self.taxonomy.unwrap_or_default();
        if let Some(path) = &self.taxonomy_path {
            taxonomy.merge(Taxonomy::load_from_ron(path)?);
        }

        let mut rules = match self.rules {
            Some(rules) => rules,
            None => RuleSet::builtin()?,
        };
        if let Some(path) = &self.rules_path {
            rules.merge(RuleSet::load_from_ron(path)?);
        }

        Ok(RewriteEngine {
            taxonomy,
            rules,
            seed: self.seed,
        })
    }
}
