pub mod context;
pub mod engine;
mod haversine;
pub mod rule;
pub mod rules;
pub mod scorer;
pub mod thresholds;

pub use context::RuleContext;
pub use engine::RuleEngine;
pub use rule::FraudRule;
pub use scorer::assess;
pub use thresholds::{RuleThresholds, ScoringThresholds};
