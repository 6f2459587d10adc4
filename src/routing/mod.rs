//! Routing core: complexity estimation, scoring strategies, model selection.
//!
//! Everything here is pure and synchronous. Strategies and selectors hold no
//! mutable state, so a wired engine can be shared freely across callers.

pub mod engine;
pub mod estimator;
pub mod selector;
pub mod strategies;

pub use engine::RoutingEngine;
pub use estimator::{default_complexity_estimator, ComplexityEstimator, FeatureExtractor};
pub use selector::ModelSelector;
pub use strategies::{strategy_for, RoutingStrategy};

/// Clamp a score into the canonical [0, 1] range.
pub(crate) fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}
