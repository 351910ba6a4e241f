use serde::{Deserialize, Serialize};

/// Inferred gender of an extracted character. Never ground truth: it comes
/// from a gazetteer lookup or a pronoun tally over the character's sentences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Female,
    Male,
    #[default]
    Unknown,
}

impl Gender {
    /// Lowercase label: "female", "male", "unknown".
    pub fn label(&self) -> &'static str {
        match self {
            Self::Female => "female",
            Self::Male => "male",
            Self::Unknown => "unknown",
        }
    }
}

/// Agency level assigned when no active or passive evidence is found.
pub const DEFAULT_AGENCY: u8 = 5;
/// Lowest agency level after clamping.
pub const MIN_AGENCY: u8 = 1;
/// Highest agency level after clamping.
pub const MAX_AGENCY: u8 = 10;

/// One named entity detected in a text unit, with the evidence gathered
/// from the sentences that mention it.
///
/// Evidence lists follow taxonomy order and hold no duplicates. Empty lists
/// are valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub gender: Gender,
    pub professions: Vec<String>,
    pub relationships: Vec<String>,
    /// Clamped to `MIN_AGENCY..=MAX_AGENCY`.
    pub agency_level: u8,
    pub appearance_descriptors: Vec<String>,
    pub dialogue_count: usize,
    /// Mentions per hundred words of the full text.
    pub screen_time_proxy: f64,
}

impl Character {
    /// A character with no evidence beyond its name and gender.
    pub fn new(name: impl Into<String>, gender: Gender) -> Self {
        Self {
            name: name.into(),
            gender,
            professions: Vec::new(),
            relationships: Vec::new(),
            agency_level: DEFAULT_AGENCY,
            appearance_descriptors: Vec::new(),
            dialogue_count: 0,
            screen_time_proxy: 0.0,
        }
    }

    pub fn has_profession(&self) -> bool {
        !self.professions.is_empty()
    }

    /// Defined through a relationship marker with no profession to balance it.
    pub fn is_relationship_defined(&self) -> bool {
        !self.relationships.is_empty() && self.professions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gender_labels() {
        assert_eq!(Gender::Female.label(), "female");
        assert_eq!(Gender::Male.label(), "male");
        assert_eq!(Gender::Unknown.label(), "unknown");
        assert_eq!(Gender::default(), Gender::Unknown);
    }

    #[test]
    fn new_character_has_neutral_evidence() {
        let c = Character::new("Meera", Gender::Female);
        assert_eq!(c.agency_level, DEFAULT_AGENCY);
        assert!(c.professions.is_empty());
        assert!(!c.has_profession());
        assert!(!c.is_relationship_defined());
        assert_eq!(c.dialogue_count, 0);
    }

    #[test]
    fn relationship_defined_requires_no_profession() {
        let mut c = Character::new("Kavya", Gender::Female);
        c.relationships.push("wife of".to_string());
        assert!(c.is_relationship_defined());

        c.professions.push("teacher".to_string());
        assert!(!c.is_relationship_defined());
    }

    #[test]
    fn ron_round_trip() {
        let mut c = Character::new("Rohit", Gender::Male);
        c.professions.push("engineer".to_string());
        c.screen_time_proxy = 12.5;
        let serialized = ron::to_string(&c).unwrap();
        let deserialized: Character = ron::from_str(&serialized).unwrap();
        assert_eq!(deserialized, c);
    }
}
