use serde::{Deserialize, Serialize};

/// Which path produced a rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewriteMode {
    /// Deterministic rules plus seeded synonym choice.
    RuleBased,
    /// Text returned by a hosted language model.
    HostedModel,
    /// The hosted model failed and the rule path ran instead.
    Fallback,
}

impl RewriteMode {
    pub fn label(&self) -> &'static str {
        match self {
            Self::RuleBased => "rule_based",
            Self::HostedModel => "hosted_model",
            Self::Fallback => "fallback",
        }
    }

    /// True when the caller asked for the hosted model but did not get it.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Fallback)
    }
}

/// Output of one rewrite call. Produced fresh per call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewriteResult {
    pub original_text: String,
    pub rewritten_text: String,
    /// Narrative fidelity rubric, 0..=100.
    pub quality_score: f64,
    /// Indicator reduction, 0..=100; 50 when the original had no indicators.
    pub bias_reduction_score: f64,
    /// Fired rules and passes, in firing order.
    pub improvements: Vec<String>,
    pub suggestions: Vec<String>,
    pub mode: RewriteMode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_labels() {
        assert_eq!(RewriteMode::RuleBased.label(), "rule_based");
        assert_eq!(RewriteMode::Fallback.label(), "fallback");
        assert!(RewriteMode::Fallback.is_degraded());
        assert!(!RewriteMode::HostedModel.is_degraded());
    }

    #[test]
    fn result_ron_round_trip() {
        let result = RewriteResult {
            original_text: "Priya waits.".to_string(),
            rewritten_text: "Priya pursues.".to_string(),
            quality_score: 80.0,
            bias_reduction_score: 100.0,
            improvements: vec!["Converted passive action to active agency".to_string()],
            suggestions: Vec::new(),
            mode: RewriteMode::Fallback,
        };
        let serialized = ron::to_string(&result).unwrap();
        let deserialized: RewriteResult = ron::from_str(&serialized).unwrap();
        assert_eq!(deserialized, result);
    }
}
