/// Bias scoring: six comparative dimensions over an extracted character set.
///
/// Every formula measures a deficit experienced by female-inferred
/// characters. `Unknown` characters are left out of all comparisons, and a
/// set with no female characters scores zero everywhere.
use crate::schema::bias::BiasVector;
use crate::schema::character::{Character, Gender, DEFAULT_AGENCY};

/// Pure scoring over a character set.
pub struct BiasScorer;

impl BiasScorer {
    pub fn score(characters: &[Character]) -> BiasVector {
        let female: Vec<&Character> = by_gender(characters, Gender::Female);
        let male: Vec<&Character> = by_gender(characters, Gender::Male);

        if female.is_empty() {
            return BiasVector::default();
        }

        BiasVector::new(
            occupation_gap(&female, &male),
            agency_gap(&female, &male),
            appearance_focus(&female, &male),
            relationship_defining(&female),
            dialogue_imbalance(&female, &male),
            screen_time_imbalance(&female, &male),
        )
    }
}

fn by_gender(characters: &[Character], gender: Gender) -> Vec<&Character> {
    characters.iter().filter(|c| c.gender == gender).collect()
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Fraction of `group` with at least one profession; the denominator is
/// never below one.
fn profession_rate(group: &[&Character]) -> f64 {
    let with = group.iter().filter(|c| c.has_profession()).count();
    with as f64 / group.len().max(1) as f64
}

fn occupation_gap(female: &[&Character], male: &[&Character]) -> f64 {
    ((profession_rate(male) - profession_rate(female)) * 100.0).max(0.0)
}

fn agency_gap(female: &[&Character], male: &[&Character]) -> f64 {
    let female_mean = mean(female.iter().map(|c| f64::from(c.agency_level))).unwrap_or(0.0);
    let male_mean = mean(male.iter().map(|c| f64::from(c.agency_level)))
        .unwrap_or(f64::from(DEFAULT_AGENCY));
    ((male_mean - female_mean) * 10.0).max(0.0)
}

fn appearance_focus(female: &[&Character], male: &[&Character]) -> f64 {
    let female_mean =
        mean(female.iter().map(|c| c.appearance_descriptors.len() as f64)).unwrap_or(0.0);
    let male_mean =
        mean(male.iter().map(|c| c.appearance_descriptors.len() as f64)).unwrap_or(0.0);
    ((female_mean - male_mean) * 25.0).max(0.0)
}

/// Share of female characters carrying a relationship marker and no
/// profession.
///
/// Unlike the other five this is not a female/male comparison; it is kept
/// as its own conjunction rather than folded into the occupation rate.
fn relationship_defining(female: &[&Character]) -> f64 {
    if female.is_empty() {
        return 0.0;
    }
    let defined = female.iter().filter(|c| c.is_relationship_defined()).count();
    defined as f64 / female.len() as f64 * 100.0
}

fn dialogue_imbalance(female: &[&Character], male: &[&Character]) -> f64 {
    if female.is_empty() || male.is_empty() {
        return 0.0;
    }
    let female_lines: usize = female.iter().map(|c| c.dialogue_count).sum();
    let male_lines: usize = male.iter().map(|c| c.dialogue_count).sum();
    let total = female_lines + male_lines;
    if total == 0 {
        return 0.0;
    }

    let actual = female_lines as f64 / total as f64;
    let expected = female.len() as f64 / (female.len() + male.len()) as f64;
    ((expected - actual) * 100.0).max(0.0)
}

fn screen_time_imbalance(female: &[&Character], male: &[&Character]) -> f64 {
    let (Some(female_mean), Some(male_mean)) = (
        mean(female.iter().map(|c| c.screen_time_proxy)),
        mean(male.iter().map(|c| c.screen_time_proxy)),
    ) else {
        return 0.0;
    };
    ((male_mean - female_mean) * 2.0).max(0.0)
}
