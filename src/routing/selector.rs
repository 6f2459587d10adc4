//! Model selection: constraint filtering, scoring, and decision building.

use std::cmp::Ordering;

use crate::domain::{ModelConfig, Request, RoutingConstraints, RoutingDecision};
use crate::error::{Error, Result};

use super::estimator::{default_complexity_estimator, ComplexityEstimator};
use super::strategies::{strategy_for, RoutingStrategy};

/// Capability weights used for the `min_quality` hard filter.
const QUALITY_WEIGHTS: [(&str, f64); 5] = [
    ("reasoning", 1.0),
    ("code", 0.8),
    ("analysis", 0.6),
    ("vision", 0.5),
    ("chat", 0.4),
];

/// Tags that satisfy a tight latency budget.
const LOW_LATENCY_TAGS: [&str; 3] = ["low-latency", "realtime", "streaming"];

/// A `max_latency` at or below this value requires a low-latency tag.
const TIGHT_LATENCY_THRESHOLD: f64 = 200.0;

/// Selects the best model given constraints and a routing strategy.
///
/// By default the scoring strategy is resolved per call from the constraint's
/// strategy tag, so a per-request override takes effect. A custom strategy
/// pinned via [`ModelSelector::with_strategy`] is used for every call instead.
pub struct ModelSelector {
    pinned_strategy: Option<Box<dyn RoutingStrategy>>,
    estimator: ComplexityEstimator,
}

impl Default for ModelSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelSelector {
    pub fn new() -> Self {
        Self {
            pinned_strategy: None,
            estimator: default_complexity_estimator(),
        }
    }

    /// Pin a custom scoring strategy, ignoring the constraint's strategy tag.
    pub fn with_strategy(strategy: Box<dyn RoutingStrategy>) -> Self {
        Self {
            pinned_strategy: Some(strategy),
            estimator: default_complexity_estimator(),
        }
    }

    /// Filter, score, and rank candidates, producing a decision.
    ///
    /// Fails with [`Error::NoSuitableModel`] when the hard-constraint filter
    /// leaves zero candidates.
    pub fn select(
        &self,
        available_models: &[ModelConfig],
        request: &Request,
        constraints: &RoutingConstraints,
    ) -> Result<RoutingDecision> {
        let eligible = self.filter_by_constraints(available_models, constraints);
        if eligible.is_empty() {
            return Err(Error::NoSuitableModel(
                "no models satisfy hard constraints".to_string(),
            ));
        }

        let complexity = self.estimator.estimate(request.prompt());

        let owned_strategy;
        let strategy: &dyn RoutingStrategy = match &self.pinned_strategy {
            Some(pinned) => pinned.as_ref(),
            None => {
                owned_strategy = strategy_for(constraints.strategy());
                owned_strategy.as_ref()
            }
        };

        let mut scored: Vec<(&ModelConfig, f64)> = eligible
            .iter()
            .map(|model| (*model, strategy.score_model(model, complexity, constraints)))
            .collect();
        // Stable sort: ties keep catalog order.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        let (best_model, best_score) = scored[0];
        let reasoning =
            build_reasoning(strategy.name(), best_model, best_score, &scored, constraints);
        let alternatives: Vec<ModelConfig> = scored[1..]
            .iter()
            .map(|(model, _)| (*model).clone())
            .collect();

        RoutingDecision::new(
            best_model.clone(),
            best_model.pricing(),
            reasoning,
            alternatives,
        )
    }

    fn filter_by_constraints<'a>(
        &self,
        models: &'a [ModelConfig],
        constraints: &RoutingConstraints,
    ) -> Vec<&'a ModelConfig> {
        models
            .iter()
            .filter(|model| {
                // Price at exactly max_cost is still within budget.
                if let Some(max_cost) = constraints.max_cost() {
                    if model.pricing() > max_cost {
                        return false;
                    }
                }
                if let Some(min_quality) = constraints.min_quality() {
                    if quality_score(model) < min_quality {
                        return false;
                    }
                }
                if let Some(max_latency) = constraints.max_latency() {
                    if max_latency <= TIGHT_LATENCY_THRESHOLD
                        && !supports_low_latency(model)
                    {
                        return false;
                    }
                }
                true
            })
            .collect()
    }
}

/// Weighted capability coverage in [0, 1], used for the quality filter.
fn quality_score(model: &ModelConfig) -> f64 {
    if model.capabilities().is_empty() {
        return 0.0;
    }
    let total: f64 = QUALITY_WEIGHTS.iter().map(|(_, weight)| weight).sum();
    let raw: f64 = QUALITY_WEIGHTS
        .iter()
        .filter(|(cap, _)| model.has_capability(cap))
        .map(|(_, weight)| weight)
        .sum();
    raw / total
}

fn supports_low_latency(model: &ModelConfig) -> bool {
    LOW_LATENCY_TAGS.iter().any(|tag| model.has_capability(tag))
}

fn build_reasoning(
    strategy_name: &str,
    selected: &ModelConfig,
    top_score: f64,
    scored: &[(&ModelConfig, f64)],
    constraints: &RoutingConstraints,
) -> String {
    let mut parts = Vec::new();
    if let Some(max_cost) = constraints.max_cost() {
        parts.push(format!("max_cost={max_cost}"));
    }
    if let Some(max_latency) = constraints.max_latency() {
        parts.push(format!("max_latency={max_latency}"));
    }
    if let Some(min_quality) = constraints.min_quality() {
        parts.push(format!("min_quality={min_quality}"));
    }
    let constraint_text = if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    };

    let alt_names: Vec<&str> = scored
        .iter()
        .skip(1)
        .take(2)
        .map(|(model, _)| model.model_name())
        .collect();
    let alt_text = if alt_names.is_empty() {
        String::new()
    } else {
        format!(". Considered: {}", alt_names.join(", "))
    };

    format!(
        "Strategy {} selected {} with score {:.2} under constraints{}{}",
        strategy_name,
        selected.model_name(),
        top_score,
        constraint_text,
        alt_text
    )
}
