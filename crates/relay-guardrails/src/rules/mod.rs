//! Built-in guardrail rules.

pub mod model;
pub mod pattern;

pub use model::ModelRule;
pub use pattern::PatternRule;
