/// Hosted language-model seam. The crate performs no network I/O itself;
/// callers plug a client in through `LanguageModel`.
use thiserror::Error;

use crate::schema::bias::BiasDimension;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model unavailable: {0}")]
    Unavailable(String),
    #[error("model returned an empty completion")]
    EmptyResponse,
}

/// A chat-style request: one system instruction and one user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPrompt {
    pub system: String,
    pub user: String,
}

const SYSTEM_PROMPT: &str =
    "You are an expert script writer specializing in gender-inclusive content.";

const GUIDELINES: &[&str] = &[
    "Give female characters professional identities alongside family relationships",
    "Show female characters taking active decisions and actions",
    "Balance appearance descriptions with character traits and achievements",
    "Maintain all character names and core plot elements",
    "Keep the same tone and style",
];

impl ModelPrompt {
    /// Build the rewrite request for `text` with the flagged dimensions'
    /// descriptions listed as detected biases.
    pub fn for_rewrite(text: &str, flagged: &[BiasDimension]) -> Self {
        let detected: Vec<&str> = flagged.iter().map(|d| d.description()).collect();
        let mut user = String::from(
            "Rewrite the following text to eliminate gender bias while preserving \
             the narrative flow and character relationships.\n\n",
        );
        user.push_str(&format!("Detected biases: {}\n\nGuidelines:\n", detected.join(", ")));
        for (i, line) in GUIDELINES.iter().enumerate() {
            user.push_str(&format!("{}. {}\n", i + 1, line));
        }
        user.push_str(&format!("\nOriginal text: \"{}\"\n\nRewritten text:", text));

        Self {
            system: SYSTEM_PROMPT.to_string(),
            user,
        }
    }
}

/// A text-completion backend.
pub trait LanguageModel: Send + Sync {
    fn complete(&self, prompt: &ModelPrompt) -> Result<String, ModelError>;
}
