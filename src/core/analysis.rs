/// Text-unit analysis: extraction plus scoring, reported per unit, with a
/// parallel batch entry point that isolates failures per unit.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use tracing::{info, warn};

use crate::core::extractor::CharacterExtractor;
use crate::core::scorer::BiasScorer;
use crate::core::taxonomy::Taxonomy;
use crate::schema::bias::{BiasLevel, BiasVector};
use crate::schema::character::{Character, Gender};

/// Character counts and the overall reporting band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub female: usize,
    pub male: usize,
    pub level: BiasLevel,
}

impl Summary {
    fn of(characters: &[Character], bias: &BiasVector) -> Self {
        let count = |g: Gender| characters.iter().filter(|c| c.gender == g).count();
        Self {
            total: characters.len(),
            female: count(Gender::Female),
            male: count(Gender::Male),
            level: bias.level(),
        }
    }
}

/// Everything learned about one text unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub title: String,
    pub characters: Vec<Character>,
    pub bias: BiasVector,
    pub summary: Summary,
}

/// Outcome of one unit in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UnitOutcome {
    Analyzed(AnalysisReport),
    Failed { title: String, reason: String },
}

impl UnitOutcome {
    pub fn report(&self) -> Option<&AnalysisReport> {
        match self {
            Self::Analyzed(report) => Some(report),
            Self::Failed { .. } => None,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Analyzed(report) => &report.title,
            Self::Failed { title, .. } => title,
        }
    }
}

/// Owns the taxonomy and runs extraction and scoring with it.
#[derive(Debug, Clone, Default)]
pub struct BiasAnalyzer {
    taxonomy: Taxonomy,
}

impl BiasAnalyzer {
    pub fn new(taxonomy: Taxonomy) -> Self {
        Self { taxonomy }
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    pub fn analyze(&self, title: &str, text: &str) -> AnalysisReport {
        let characters = CharacterExtractor::new(&self.taxonomy).extract(text);
        let bias = BiasScorer::score(&characters);
        let summary = Summary::of(&characters, &bias);
        AnalysisReport {
            title: title.to_string(),
            characters,
            bias,
            summary,
        }
    }

    /// Analyze `(title, text)` units in parallel. Output order matches input
    /// order; a unit that panics is reported as `UnitOutcome::Failed` and
    /// does not affect the others.
    pub fn analyze_batch(&self, units: &[(String, String)]) -> Vec<UnitOutcome> {
        run_units(units, |title, text| self.analyze(title, text))
    }
}

fn run_units<F>(units: &[(String, String)], analyze: F) -> Vec<UnitOutcome>
where
    F: Fn(&str, &str) -> AnalysisReport + Sync,
{
    let outcomes: Vec<UnitOutcome> = units
        .par_iter()
        .map(|(title, text)| {
            let attempt = AssertUnwindSafe(|| analyze(title.as_str(), text.as_str()));
            match panic::catch_unwind(attempt) {
                Ok(report) => UnitOutcome::Analyzed(report),
                Err(payload) => {
                    let reason = panic_message(payload.as_ref());
                    warn!(title = %title, reason = %reason, "unit analysis failed");
                    UnitOutcome::Failed {
                        title: title.clone(),
                        reason,
                    }
                }
            }
        })
        .collect();

    let failed = outcomes
        .iter()
        .filter(|o| matches!(o, UnitOutcome::Failed { .. }))
        .count();
    info!(units = outcomes.len(), failed, "batch analysis complete");
    outcomes
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
