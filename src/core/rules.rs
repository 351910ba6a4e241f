/// Structural substitution rules: ordered pattern → template rewrites per
/// bias dimension, loaded from RON.
use regex::{Captures, Regex};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::schema::bias::{BiasDimension, ParseDimensionError};

/// Rule set compiled into the crate.
const BUILTIN_RULES: &str = include_str!("../../data/rewrite_rules.ron");

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("template parse error: {0}")]
    TemplateParse(String),
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("template references capture {index} but pattern '{pattern}' has {available}")]
    CaptureOutOfRange {
        pattern: String,
        index: usize,
        available: usize,
    },
    #[error(transparent)]
    UnknownDimension(#[from] ParseDimensionError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// A segment of a replacement template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSegment {
    /// Literal text, emitted as-is.
    Literal(String),
    /// Capture group of the rule's pattern: `{1}`.
    Capture(usize),
}

/// A parsed replacement template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub segments: Vec<TemplateSegment>,
}

impl Template {
    /// Parse a replacement template.
    ///
    /// Syntax:
    /// - `{N}` → `Capture(N)`, N a non-negative integer
    /// - `{{` / `}}` → literal braces
    /// - Everything else → `Literal`
    pub fn parse(input: &str) -> Result<Template, RuleError> {
        let mut segments = Vec::new();
        let mut literal_buf = String::new();
        let chars: Vec<char> = input.chars().collect();
        let len = chars.len();
        let mut i = 0;

        while i < len {
            match chars[i] {
                '{' if i + 1 < len && chars[i + 1] == '{' => {
                    literal_buf.push('{');
                    i += 2;
                }
                '{' => {
                    if !literal_buf.is_empty() {
                        segments.push(TemplateSegment::Literal(std::mem::take(
                            &mut literal_buf,
                        )));
                    }

                    let start = i + 1;
                    let mut end = start;
                    while end < len && chars[end] != '}' {
                        if chars[end] == '{' {
                            return Err(RuleError::TemplateParse(
                                "nested braces are not allowed".to_string(),
                            ));
                        }
                        end += 1;
                    }
                    if end == len {
                        return Err(RuleError::TemplateParse("unclosed brace".to_string()));
                    }

                    let content: String = chars[start..end].iter().collect();
                    if content.is_empty() {
                        return Err(RuleError::TemplateParse("empty braces".to_string()));
                    }
                    let index = content.trim().parse::<usize>().map_err(|_| {
                        RuleError::TemplateParse(format!(
                            "invalid capture reference '{}': expected a group number",
                            content
                        ))
                    })?;
                    segments.push(TemplateSegment::Capture(index));
                    i = end + 1;
                }
                '}' if i + 1 < len && chars[i + 1] == '}' => {
                    literal_buf.push('}');
                    i += 2;
                }
                '}' => {
                    return Err(RuleError::TemplateParse(
                        "unmatched closing brace".to_string(),
                    ));
                }
                c => {
                    literal_buf.push(c);
                    i += 1;
                }
            }
        }

        if !literal_buf.is_empty() {
            segments.push(TemplateSegment::Literal(literal_buf));
        }

        Ok(Template { segments })
    }

    /// Highest capture index referenced, if any.
    pub fn max_capture(&self) -> Option<usize> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                TemplateSegment::Capture(i) => Some(*i),
                TemplateSegment::Literal(_) => None,
            })
            .max()
    }

    /// Render against a match. Unmatched optional groups render empty.
    pub fn render(&self, caps: &Captures<'_>) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                TemplateSegment::Literal(s) => out.push_str(s),
                TemplateSegment::Capture(i) => {
                    out.push_str(caps.get(*i).map_or("", |m| m.as_str()));
                }
            }
        }
        out
    }
}

/// One structural rewrite: the first match of `pattern` is replaced by the
/// rendered `template`.
#[derive(Debug, Clone)]
pub struct SubstitutionRule {
    pub pattern: Regex,
    pub template: Template,
    /// Improvement annotation logged when the rule fires.
    pub note: String,
}

impl SubstitutionRule {
    pub fn new(pattern: &str, template: &str, note: &str) -> Result<Self, RuleError> {
        let regex = Regex::new(pattern).map_err(|source| RuleError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        let template = Template::parse(template)?;

        let available = regex.captures_len() - 1;
        if let Some(index) = template.max_capture() {
            if index > available {
                return Err(RuleError::CaptureOutOfRange {
                    pattern: pattern.to_string(),
                    index,
                    available,
                });
            }
        }

        Ok(Self {
            pattern: regex,
            template,
            note: note.to_string(),
        })
    }

    /// Apply to the first match only. `None` when the pattern does not match.
    pub fn apply(&self, text: &str) -> Option<String> {
        let caps = self.pattern.captures(text)?;
        let whole = caps.get(0)?;
        let mut out = String::with_capacity(text.len() + 32);
        out.push_str(&text[..whole.start()]);
        out.push_str(&self.template.render(&caps));
        out.push_str(&text[whole.end()..]);
        Some(out)
    }
}

/// All rewrite rules: ordered structural rules per dimension, plus the
/// independence qualifiers used by the relationship dependency pass.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    pub structural: HashMap<BiasDimension, Vec<SubstitutionRule>>,
    pub independence: Vec<SubstitutionRule>,
}

// RON deserialization helpers; rules are written as plain strings and
// compiled after loading.

#[derive(Debug, Deserialize)]
struct RonRule {
    pattern: String,
    replace: String,
    note: String,
}

#[derive(Debug, Deserialize)]
struct RonRuleSet {
    #[serde(default)]
    structural: HashMap<String, Vec<RonRule>>,
    #[serde(default)]
    independence: Vec<RonRule>,
}

fn compile(rules: Vec<RonRule>) -> Result<Vec<SubstitutionRule>, RuleError> {
    rules
        .into_iter()
        .map(|r| SubstitutionRule::new(&r.pattern, &r.replace, &r.note))
        .collect()
}

impl RuleSet {
    /// The rule set shipped in `data/rewrite_rules.ron`.
    pub fn builtin() -> Result<RuleSet, RuleError> {
        Self::parse_ron(BUILTIN_RULES)
    }

    /// Load a rule set from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<RuleSet, RuleError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a rule set from a RON string. Dimension keys must name one of
    /// the six bias dimensions.
    pub fn parse_ron(input: &str) -> Result<RuleSet, RuleError> {
        let raw: RonRuleSet = ron::from_str(input)?;
        let mut structural = HashMap::new();
        for (key, rules) in raw.structural {
            let dimension: BiasDimension = key.parse()?;
            structural.insert(dimension, compile(rules)?);
        }
        Ok(RuleSet {
            structural,
            independence: compile(raw.independence)?,
        })
    }

    /// Merge another rule set into this one. A dimension's list in `other`
    /// replaces the list here; a non-empty independence list replaces ours.
    pub fn merge(&mut self, other: RuleSet) {
        for (dimension, rules) in other.structural {
            self.structural.insert(dimension, rules);
        }
        if !other.independence.is_empty() {
            self.independence = other.independence;
        }
    }

    /// Ordered structural rules for `dimension`; empty when none are defined.
    pub fn rules_for(&self, dimension: BiasDimension) -> &[SubstitutionRule] {
        self.structural
            .get(&dimension)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_literal_only() {
        let t = Template::parse("a professional").unwrap();
        assert_eq!(
            t.segments,
            vec![TemplateSegment::Literal("a professional".to_string())]
        );
        assert_eq!(t.max_capture(), None);
    }

    #[test]
    fn parse_captures() {
        let t = Template::parse("{1}, a professional and daughter of {2}").unwrap();
        assert_eq!(
            t.segments,
            vec![
                TemplateSegment::Capture(1),
                TemplateSegment::Literal(", a professional and daughter of ".to_string()),
                TemplateSegment::Capture(2),
            ]
        );
        assert_eq!(t.max_capture(), Some(2));
    }

    #[test]
    fn parse_escaped_braces() {
        let t = Template::parse("Use {{braces}} here.").unwrap();
        assert_eq!(
            t.segments,
            vec![TemplateSegment::Literal("Use {braces} here.".to_string())]
        );
    }

    #[test]
    fn parse_errors() {
        assert!(Template::parse("Bad {} here").is_err());
        assert!(Template::parse("Bad {outer{1}} here").is_err());
        assert!(Template::parse("Bad {1 here").is_err());
        assert!(Template::parse("Bad } here").is_err());
        assert!(Template::parse("Bad {name} here").is_err());
    }

    #[test]
    fn rule_fires_on_first_match_only() {
        let rule = SubstitutionRule::new(
            r"\b([A-Z][a-z]+) waits for ([^.]+)",
            "{1} actively seeks {2}",
            "Converted passive action to active agency",
        )
        .unwrap();
        let out = rule
            .apply("Priya waits for news. Meera waits for rain.")
            .unwrap();
        assert_eq!(out, "Priya actively seeks news. Meera waits for rain.");
        assert!(rule.apply("Nobody is waiting.").is_none());
    }

    #[test]
    fn capture_out_of_range_is_rejected() {
        let err = SubstitutionRule::new(r"(\w+) waits", "{2} acts", "note").unwrap_err();
        assert!(matches!(
            err,
            RuleError::CaptureOutOfRange {
                index: 2,
                available: 1,
                ..
            }
        ));
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let err = SubstitutionRule::new(r"([A-Z", "{0}", "note").unwrap_err();
        assert!(matches!(err, RuleError::InvalidPattern { .. }));
    }

    #[test]
    fn builtin_rules_load() {
        let rules = RuleSet::builtin().unwrap();
        for dimension in BiasDimension::ALL {
            assert_eq!(
                rules.rules_for(dimension).is_empty(),
                !dimension.is_rewritable(),
                "unexpected rule coverage for {}",
                dimension
            );
        }
        assert!(!rules.independence.is_empty());
    }

    #[test]
    fn unknown_dimension_key_is_an_error() {
        let input = r#"(
            structural: {
                "plot_gap": [(pattern: "x", replace: "y", note: "z")],
            },
        )"#;
        let err = RuleSet::parse_ron(input).unwrap_err();
        assert!(matches!(err, RuleError::UnknownDimension(_)));
    }

    #[test]
    fn merge_replaces_dimension_lists() {
        let mut base = RuleSet::builtin().unwrap();
        let builtin_agency = base.rules_for(BiasDimension::AgencyGap).len();

        let override_set = RuleSet::parse_ron(
            r#"(
                structural: {
                    "occupation_gap": [
                        (pattern: "([A-Z][a-z]+) cooks", replace: "{1} runs a restaurant", note: "Added career"),
                    ],
                },
            )"#,
        )
        .unwrap();

        base.merge(override_set);
        assert_eq!(base.rules_for(BiasDimension::OccupationGap).len(), 1);
        assert_eq!(base.rules_for(BiasDimension::AgencyGap).len(), builtin_agency);
        assert!(!base.independence.is_empty());
    }

    #[test]
    fn missing_dimension_has_no_rules() {
        let rules = RuleSet::default();
        assert!(rules.rules_for(BiasDimension::AgencyGap).is_empty());
    }
}
