pub mod analysis;
pub mod extractor;
pub mod model;
pub mod quality;
pub mod rewriter;
pub mod rules;
pub mod scorer;
pub mod taxonomy;
pub mod text;
