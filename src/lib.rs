//! Narrative Bias: gender representation analysis and rewriting for stories.
//!
//! Extracts characters from free text, scores six bias dimensions over them,
//! and rewrites passages with ordered, dimension-specific rules. Everything is
//! driven by one shared indicator taxonomy; a hosted language model can be
//! plugged in for rewriting, with the rule path as fallback.

pub mod core;
pub mod schema;
