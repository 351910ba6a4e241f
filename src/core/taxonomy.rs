/// Indicator taxonomy: every vocabulary the extractor, scorer and rewriter
/// share, built once and passed in explicitly.
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::core::text;
use crate::schema::character::Gender;

#[derive(Debug, Error)]
pub enum TaxonomyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// A phrase and the alternatives it may be rewritten to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Replacement {
    pub phrase: String,
    pub alternatives: Vec<String>,
}

/// Vocabularies used only by the rewrite passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriteVocabulary {
    /// Appearance word → non-appearance trait words.
    pub appearance_replacements: Vec<Replacement>,
    /// Passive phrase → active-agency phrases.
    pub agency_replacements: Vec<Replacement>,
    /// Inserted after a name by the professional identity pass.
    pub profession_qualifiers: Vec<String>,
    /// Profession nouns injected when a passage names no profession at all.
    pub injected_professions: Vec<String>,
    /// Any of these already present suppresses the professional identity pass.
    pub professional_titles: Vec<String>,
    /// Whole words signalling a female character in the passage.
    pub female_context_words: Vec<String>,
}

/// Indicator families counted before and after a rewrite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorFamilies {
    pub relationship: Vec<String>,
    pub passive: Vec<String>,
    pub appearance: Vec<String>,
    pub active: Vec<String>,
    pub profession_signals: Vec<String>,
    pub independence: Vec<String>,
}

impl IndicatorFamilies {
    /// Total hits of the relationship, passive and appearance families.
    pub fn bias_hits(&self, passage: &str) -> usize {
        occurrences(passage, &self.relationship)
            + occurrences(passage, &self.passive)
            + occurrences(passage, &self.appearance)
    }

    pub fn profession_hits(&self, passage: &str) -> usize {
        occurrences(passage, &self.profession_signals)
    }
}

/// Sum of case-insensitive occurrences of every term in `terms`.
pub fn occurrences(passage: &str, terms: &[String]) -> usize {
    terms.iter().map(|t| text::count_ci(passage, t)).sum()
}

/// Terms from `terms` present in `passage`, in list order.
pub fn present<'a>(passage: &str, terms: &'a [String]) -> Vec<&'a String> {
    terms
        .iter()
        .filter(|t| text::contains_ci(passage, t))
        .collect()
}

/// The full indicator taxonomy.
///
/// Missing fields in a RON document fall back to the built-in vocabulary, so
/// an override file only needs the lists it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Taxonomy {
    pub female_names: Vec<String>,
    pub male_names: Vec<String>,
    /// Capitalized function words that are never character names.
    pub stop_words: Vec<String>,
    pub honorifics: Vec<String>,
    pub professions: Vec<String>,
    pub appearance_terms: Vec<String>,
    pub relationship_markers: Vec<String>,
    pub active_verbs: Vec<String>,
    pub passive_phrases: Vec<String>,
    pub female_pronouns: Vec<String>,
    pub male_pronouns: Vec<String>,
    pub rewrite: RewriteVocabulary,
    pub indicators: IndicatorFamilies,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn replacements(list: &[(&str, &[&str])]) -> Vec<Replacement> {
    list.iter()
        .map(|(phrase, alternatives)| Replacement {
            phrase: phrase.to_string(),
            alternatives: words(alternatives),
        })
        .collect()
}

impl Default for RewriteVocabulary {
    fn default() -> Self {
        Self {
            appearance_replacements: replacements(&[
                ("beautiful", &["accomplished", "talented", "skilled", "intelligent"]),
                ("pretty", &["capable", "competent", "experienced", "knowledgeable"]),
                ("gorgeous", &["brilliant", "innovative", "creative", "successful"]),
                ("stunning", &["impressive", "remarkable", "outstanding", "exceptional"]),
                ("attractive", &["engaging", "compelling", "influential", "respected"]),
                ("handsome", &["professional", "accomplished", "skilled", "experienced"]),
                ("good-looking", &["well-regarded", "respected", "competent", "capable"]),
            ]),
            agency_replacements: replacements(&[
                ("waits for", &["actively seeks", "pursues", "works towards", "strives for"]),
                ("hopes for", &["works towards", "actively pursues", "strives to achieve"]),
                ("wishes for", &["actively seeks", "works to obtain", "pursues"]),
                ("dreams of", &["works towards", "actively pursues", "strives for"]),
                ("depends on", &["collaborates with", "works alongside"]),
                ("needs permission", &["makes decisions"]),
                ("is given", &["earns", "achieves", "secures", "obtains"]),
                ("receives", &["earns", "achieves", "obtains", "secures"]),
            ]),
            profession_qualifiers: words(&[
                "a skilled professional",
                "an accomplished expert",
                "a talented specialist",
                "an experienced professional",
                "a successful entrepreneur",
                "a dedicated professional",
            ]),
            injected_professions: words(&[
                "doctor",
                "engineer",
                "teacher",
                "lawyer",
                "businesswoman",
                "artist",
                "writer",
                "scientist",
                "manager",
                "consultant",
                "designer",
                "architect",
                "journalist",
                "researcher",
                "entrepreneur",
            ]),
            professional_titles: words(&[
                "doctor",
                "engineer",
                "lawyer",
                "teacher",
                "scientist",
                "researcher",
                "manager",
                "director",
                "consultant",
                "entrepreneur",
                "artist",
                "writer",
                "journalist",
                "designer",
                "architect",
                "analyst",
                "professional",
                "businesswoman",
            ]),
            female_context_words: words(&["she", "her", "daughter", "wife", "sister", "mother"]),
        }
    }
}

impl Default for IndicatorFamilies {
    fn default() -> Self {
        Self {
            relationship: words(&["daughter of", "wife of", "sister of", "belongs to"]),
            passive: words(&["receives", "waits", "hopes", "follows", "accepts"]),
            appearance: words(&["beautiful", "pretty", "gorgeous", "stunning", "attractive"]),
            active: words(&["decides", "chooses", "leads", "creates", "initiates"]),
            profession_signals: words(&[
                "doctor",
                "engineer",
                "teacher",
                "lawyer",
                "professional",
                "works",
                "career",
            ]),
            independence: words(&["independent", "professional", "career", "self-reliant"]),
        }
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self {
            female_names: words(&[
                "priya", "simran", "rani", "meera", "sonia", "kavya", "anjali", "pooja", "neha",
                "ritu", "deepika", "kareena", "aishwarya", "geeta", "babita", "lajwanti",
            ]),
            male_names: words(&[
                "raj", "rohit", "vijay", "arjun", "rahul", "amit", "suresh", "ravi", "kumar",
                "dev", "shah", "khan", "sharma", "mahavir", "pramod", "dharamvir",
            ]),
            stop_words: words(&[
                "The", "And", "But", "For", "With", "From", "This", "That", "Then", "When",
                "While", "After", "Before", "She", "He", "Her", "His", "They", "Their", "It",
                "In", "On", "At", "As", "If", "Of", "To", "So", "Or", "Yet", "An", "Now",
                "There", "Here", "Who", "What", "Where", "Why", "How", "Later", "Meanwhile",
                "Once", "One",
            ]),
            honorifics: words(&["Mr", "Mrs", "Ms", "Miss", "Dr", "Sir"]),
            professions: words(&[
                "doctor",
                "engineer",
                "teacher",
                "lawyer",
                "businessman",
                "businesswoman",
                "scientist",
                "artist",
                "writer",
                "director",
                "manager",
                "housewife",
                "student",
                "nurse",
                "secretary",
                "cardiologist",
                "surgeon",
                "physician",
                "architect",
                "journalist",
                "researcher",
                "consultant",
                "designer",
                "entrepreneur",
                "professor",
                "singer",
                "salesman",
                "executive",
                "wrestler",
                "accountant",
            ]),
            appearance_terms: words(&[
                "beautiful",
                "pretty",
                "gorgeous",
                "stunning",
                "attractive",
                "handsome",
                "charming",
                "elegant",
                "lovely",
                "cute",
            ]),
            relationship_markers: words(&[
                "daughter of",
                "son of",
                "wife of",
                "husband of",
                "mother of",
                "father of",
                "girlfriend",
                "boyfriend",
                "sister of",
                "brother of",
            ]),
            active_verbs: words(&[
                "decides", "chooses", "leads", "creates", "builds", "fights", "runs", "manages",
            ]),
            passive_phrases: words(&[
                "waits for",
                "depends on",
                "needs permission",
                "asks for help",
            ]),
            female_pronouns: words(&["she", "her"]),
            male_pronouns: words(&["he", "him"]),
            rewrite: RewriteVocabulary::default(),
            indicators: IndicatorFamilies::default(),
        }
    }
}

impl Taxonomy {
    /// Load a taxonomy from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<Taxonomy, TaxonomyError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a taxonomy from a RON string. Omitted fields keep their
    /// built-in values.
    pub fn parse_ron(input: &str) -> Result<Taxonomy, TaxonomyError> {
        Ok(ron::from_str(input)?)
    }

    /// Union every vocabulary of `other` into this one. Existing order is
    /// kept; new entries are appended; duplicates are dropped.
    pub fn merge(&mut self, other: Taxonomy) {
        union(&mut self.female_names, other.female_names);
        union(&mut self.male_names, other.male_names);
        union(&mut self.stop_words, other.stop_words);
        union(&mut self.honorifics, other.honorifics);
        union(&mut self.professions, other.professions);
        union(&mut self.appearance_terms, other.appearance_terms);
        union(&mut self.relationship_markers, other.relationship_markers);
        union(&mut self.active_verbs, other.active_verbs);
        union(&mut self.passive_phrases, other.passive_phrases);
        union(&mut self.female_pronouns, other.female_pronouns);
        union(&mut self.male_pronouns, other.male_pronouns);

        let rewrite = other.rewrite;
        union_replacements(
            &mut self.rewrite.appearance_replacements,
            rewrite.appearance_replacements,
        );
        union_replacements(
            &mut self.rewrite.agency_replacements,
            rewrite.agency_replacements,
        );
        union(
            &mut self.rewrite.profession_qualifiers,
            rewrite.profession_qualifiers,
        );
        union(
            &mut self.rewrite.injected_professions,
            rewrite.injected_professions,
        );
        union(
            &mut self.rewrite.professional_titles,
            rewrite.professional_titles,
        );
        union(
            &mut self.rewrite.female_context_words,
            rewrite.female_context_words,
        );

        let indicators = other.indicators;
        union(&mut self.indicators.relationship, indicators.relationship);
        union(&mut self.indicators.passive, indicators.passive);
        union(&mut self.indicators.appearance, indicators.appearance);
        union(&mut self.indicators.active, indicators.active);
        union(
            &mut self.indicators.profession_signals,
            indicators.profession_signals,
        );
        union(&mut self.indicators.independence, indicators.independence);
    }

    /// Capitalized words that can never start or extend a character name.
    pub fn is_excluded_name(&self, word: &str) -> bool {
        self.stop_words.iter().any(|w| w == word) || self.honorifics.iter().any(|w| w == word)
    }

    /// Whether `word` is exactly one of the gazetteer names, ignoring case.
    pub fn is_gazetteer_name(&self, word: &str) -> bool {
        self.female_names
            .iter()
            .chain(&self.male_names)
            .any(|n| n.eq_ignore_ascii_case(word))
    }

    /// First stage of gender inference: substring match against the
    /// gazetteer. Female names are checked first.
    pub fn gazetteer_gender(&self, name: &str) -> Option<Gender> {
        let lower = name.to_lowercase();
        if self.female_names.iter().any(|n| lower.contains(n.as_str())) {
            return Some(Gender::Female);
        }
        if self.male_names.iter().any(|n| lower.contains(n.as_str())) {
            return Some(Gender::Male);
        }
        None
    }
}

fn union(target: &mut Vec<String>, extra: Vec<String>) {
    for item in extra {
        if !target.contains(&item) {
            target.push(item);
        }
    }
}

fn union_replacements(target: &mut Vec<Replacement>, extra: Vec<Replacement>) {
    for replacement in extra {
        match target.iter_mut().find(|r| r.phrase == replacement.phrase) {
            Some(existing) => union(&mut existing.alternatives, replacement.alternatives),
            None => target.push(replacement),
        }
    }
}
