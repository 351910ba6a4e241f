use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Per-dimension threshold used to binarize scores into "biased / not biased".
pub const BINARY_THRESHOLD: f64 = 50.0;

/// The six independently computed bias dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiasDimension {
    OccupationGap,
    AgencyGap,
    AppearanceFocus,
    RelationshipDefining,
    DialogueImbalance,
    ScreenTimeImbalance,
}

impl BiasDimension {
    /// Canonical order, shared by reports and flag derivation.
    pub const ALL: [BiasDimension; 6] = [
        Self::OccupationGap,
        Self::AgencyGap,
        Self::AppearanceFocus,
        Self::RelationshipDefining,
        Self::DialogueImbalance,
        Self::ScreenTimeImbalance,
    ];

    /// Snake-case key used in RON rule files (e.g. "occupation_gap").
    pub fn key(&self) -> &'static str {
        match self {
            Self::OccupationGap => "occupation_gap",
            Self::AgencyGap => "agency_gap",
            Self::AppearanceFocus => "appearance_focus",
            Self::RelationshipDefining => "relationship_defining",
            Self::DialogueImbalance => "dialogue_imbalance",
            Self::ScreenTimeImbalance => "screen_time_imbalance",
        }
    }

    /// Only the first four dimensions drive rewrite rules; the last two are
    /// scoring-only.
    pub fn is_rewritable(&self) -> bool {
        matches!(
            self,
            Self::OccupationGap
                | Self::AgencyGap
                | Self::AppearanceFocus
                | Self::RelationshipDefining
        )
    }

    /// Plain-language description of the pattern this dimension detects.
    pub fn description(&self) -> &'static str {
        match self {
            Self::OccupationGap => "female characters lack professional identity",
            Self::AgencyGap => "female characters are passive rather than active",
            Self::AppearanceFocus => "female characters are described primarily by appearance",
            Self::RelationshipDefining => "female characters are defined only by relationships",
            Self::DialogueImbalance => "female characters speak less than their share",
            Self::ScreenTimeImbalance => "female characters are mentioned less often",
        }
    }
}

impl fmt::Display for BiasDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown bias dimension: {0}")]
pub struct ParseDimensionError(pub String);

impl FromStr for BiasDimension {
    type Err = ParseDimensionError;

    /// Accepts the snake-case key or its camelCase spelling.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "occupation_gap" | "occupationGap" => Ok(Self::OccupationGap),
            "agency_gap" | "agencyGap" => Ok(Self::AgencyGap),
            "appearance_focus" | "appearanceFocus" => Ok(Self::AppearanceFocus),
            "relationship_defining" | "relationshipDefining" => Ok(Self::RelationshipDefining),
            "dialogue_imbalance" | "dialogueImbalance" => Ok(Self::DialogueImbalance),
            "screen_time_imbalance" | "screenTimeImbalance" => Ok(Self::ScreenTimeImbalance),
            other => Err(ParseDimensionError(other.to_string())),
        }
    }
}

/// Reporting band for the overall score. Not used by any computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiasLevel {
    Low,
    Medium,
    High,
}

impl BiasLevel {
    /// `> 60` is high, `> 30` medium, everything else low.
    pub fn from_score(overall: f64) -> Self {
        if overall > 60.0 {
            Self::High
        } else if overall > 30.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Aggregate bias signature over a character set. Every dimension is `>= 0`;
/// `overall` is the arithmetic mean of the six.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BiasVector {
    pub occupation_gap: f64,
    pub agency_gap: f64,
    pub appearance_focus: f64,
    pub relationship_defining: f64,
    pub dialogue_imbalance: f64,
    pub screen_time_imbalance: f64,
    pub overall: f64,
}

impl BiasVector {
    /// Build a vector from the six dimensions, computing `overall`.
    pub fn new(
        occupation_gap: f64,
        agency_gap: f64,
        appearance_focus: f64,
        relationship_defining: f64,
        dialogue_imbalance: f64,
        screen_time_imbalance: f64,
    ) -> Self {
        let overall = (occupation_gap
            + agency_gap
            + appearance_focus
            + relationship_defining
            + dialogue_imbalance
            + screen_time_imbalance)
            / 6.0;
        Self {
            occupation_gap,
            agency_gap,
            appearance_focus,
            relationship_defining,
            dialogue_imbalance,
            screen_time_imbalance,
            overall,
        }
    }

    pub fn get(&self, dimension: BiasDimension) -> f64 {
        match dimension {
            BiasDimension::OccupationGap => self.occupation_gap,
            BiasDimension::AgencyGap => self.agency_gap,
            BiasDimension::AppearanceFocus => self.appearance_focus,
            BiasDimension::RelationshipDefining => self.relationship_defining,
            BiasDimension::DialogueImbalance => self.dialogue_imbalance,
            BiasDimension::ScreenTimeImbalance => self.screen_time_imbalance,
        }
    }

    /// Dimensions scoring strictly above `threshold`, in canonical order.
    pub fn flagged(&self, threshold: f64) -> Vec<BiasDimension> {
        BiasDimension::ALL
            .into_iter()
            .filter(|d| self.get(*d) > threshold)
            .collect()
    }

    /// Rewritable dimensions above `BINARY_THRESHOLD`, ready to hand to the
    /// rewrite engine.
    pub fn rewrite_flags(&self) -> Vec<BiasDimension> {
        self.flagged(BINARY_THRESHOLD)
            .into_iter()
            .filter(BiasDimension::is_rewritable)
            .collect()
    }

    pub fn level(&self) -> BiasLevel {
        BiasLevel::from_score(self.overall)
    }
}
