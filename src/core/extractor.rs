/// Character extraction: proposes named entities and gathers evidence for
/// each from the sentences that mention it.
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::core::taxonomy::{self, Taxonomy};
use crate::core::text;
use crate::schema::character::{Character, Gender, DEFAULT_AGENCY, MAX_AGENCY, MIN_AGENCY};

/// A capitalized word must occur at least this often to be a candidate.
pub const MIN_MENTIONS: usize = 2;
/// Candidates kept per text, in discovery order.
pub const MAX_CANDIDATES: usize = 10;

/// Deterministic, rule-based character extractor.
#[derive(Debug, Clone, Copy)]
pub struct CharacterExtractor<'t> {
    taxonomy: &'t Taxonomy,
}

impl<'t> CharacterExtractor<'t> {
    pub fn new(taxonomy: &'t Taxonomy) -> Self {
        Self { taxonomy }
    }

    /// Extract characters from `text`.
    ///
    /// Capitalized words occurring at least `MIN_MENTIONS` times (stop-words
    /// and honorifics excluded) become candidates, capped at
    /// `MAX_CANDIDATES` in order of first appearance with no further
    /// tie-break. Words differing only in letter case are distinct.
    ///
    /// Evidence is gathered for the candidate word itself. Only the reported
    /// name and the gazetteer lookup use the widened form (see
    /// `display_name`).
    pub fn extract(&self, text: &str) -> Vec<Character> {
        let candidates = self.candidates(text);
        debug!(candidates = candidates.len(), "extraction candidates");

        let runs = text::capitalized_runs(text);
        let total_words = text::word_count(text);
        let mut characters: Vec<Character> = Vec::new();

        for candidate in &candidates {
            let name = self.display_name(candidate, &candidates, &runs);
            if characters.iter().any(|c| c.name == name) {
                continue;
            }
            if let Some(character) = self.analyze(candidate, name, text, total_words) {
                trace!(
                    name = %character.name,
                    gender = character.gender.label(),
                    agency = character.agency_level,
                    "extracted character"
                );
                characters.push(character);
            }
        }

        characters
    }

    fn candidates<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut counts: FxHashMap<&str, usize> = FxHashMap::default();
        let mut order: Vec<&str> = Vec::new();
        for token in text::capitalized_words(text) {
            let count = counts.entry(token.text).or_insert(0);
            if *count == 0 {
                order.push(token.text);
            }
            *count += 1;
        }

        order
            .into_iter()
            .filter(|w| counts.get(w).copied().unwrap_or(0) >= MIN_MENTIONS)
            .filter(|w| !self.taxonomy.is_excluded_name(w))
            .take(MAX_CANDIDATES)
            .collect()
    }

    /// Widen a candidate to the name it first appears in. Neighbouring
    /// capitalized words join only when they are candidates themselves or
    /// gazetteer names, so sentence-initial words never do.
    fn display_name(&self, candidate: &str, candidates: &[&str], runs: &[Vec<&str>]) -> String {
        let joins = |word: &str| {
            !self.taxonomy.is_excluded_name(word)
                && (candidates.contains(&word) || self.taxonomy.is_gazetteer_name(word))
        };

        for run in runs {
            let Some(idx) = run.iter().position(|w| *w == candidate) else {
                continue;
            };
            let mut start = idx;
            while start > 0 && joins(run[start - 1]) {
                start -= 1;
            }
            let mut end = idx + 1;
            while end < run.len() && joins(run[end]) {
                end += 1;
            }
            return run[start..end].join(" ");
        }
        candidate.to_string()
    }

    fn analyze(
        &self,
        candidate: &str,
        name: String,
        text: &str,
        total_words: usize,
    ) -> Option<Character> {
        let local: Vec<&str> = text::sentences(text)
            .into_iter()
            .filter(|s| text::contains_ci(s, candidate))
            .collect();
        if local.is_empty() {
            return None;
        }
        let context = local.join(" ");

        Some(Character {
            gender: self.infer_gender(&name, &context),
            name,
            professions: owned(taxonomy::present(&context, &self.taxonomy.professions)),
            relationships: owned(taxonomy::present(
                &context,
                &self.taxonomy.relationship_markers,
            )),
            agency_level: self.agency_level(&context),
            appearance_descriptors: owned(taxonomy::present(
                &context,
                &self.taxonomy.appearance_terms,
            )),
            dialogue_count: dialogue_count(candidate, text),
            screen_time_proxy: screen_time_proxy(candidate, text, total_words),
        })
    }

    /// Gazetteer first; otherwise the majority of whole-word pronouns in the
    /// local context. Ties, including zero pronouns, are `Unknown`.
    fn infer_gender(&self, name: &str, context: &str) -> Gender {
        if let Some(gender) = self.taxonomy.gazetteer_gender(name) {
            return gender;
        }

        let words = text::lowercase_words(context);
        let tally = |pronouns: &[String]| words.iter().filter(|w| pronouns.contains(w)).count();
        let female = tally(&self.taxonomy.female_pronouns);
        let male = tally(&self.taxonomy.male_pronouns);

        match female.cmp(&male) {
            std::cmp::Ordering::Greater => Gender::Female,
            std::cmp::Ordering::Less => Gender::Male,
            std::cmp::Ordering::Equal => Gender::Unknown,
        }
    }

    /// Start at the default, +1 per distinct active verb, -1 per distinct
    /// passive phrase, clamped.
    fn agency_level(&self, context: &str) -> u8 {
        let active = taxonomy::present(context, &self.taxonomy.active_verbs).len() as i64;
        let passive = taxonomy::present(context, &self.taxonomy.passive_phrases).len() as i64;
        let level = i64::from(DEFAULT_AGENCY) + active - passive;
        level.clamp(i64::from(MIN_AGENCY), i64::from(MAX_AGENCY)) as u8
    }
}

fn owned(terms: Vec<&String>) -> Vec<String> {
    terms.into_iter().cloned().collect()
}

/// Lines of the full text whose trimmed, upper-cased content starts with the
/// upper-cased name.
fn dialogue_count(name: &str, text: &str) -> usize {
    let upper = name.to_uppercase();
    text.lines()
        .filter(|line| line.trim().to_uppercase().starts_with(&upper))
        .count()
}

/// Mentions per hundred words.
fn screen_time_proxy(name: &str, text: &str, total_words: usize) -> f64 {
    let mentions = text::count_ci(text, name);
    mentions as f64 / total_words.max(1) as f64 * 100.0
}
