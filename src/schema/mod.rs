pub mod bias;
pub mod character;
pub mod rewrite;
