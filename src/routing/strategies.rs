//! Scoring strategies that rank models for selection.
//!
//! Each strategy maps (model, complexity, constraints) to a desirability
//! score in [0, 1]. All variants are stateless pure functions; the strategy
//! name is used for reasoning text only, never for branching.

use super::clamp01;
use crate::domain::{ModelConfig, RoutingConstraints, StrategyKind};

/// Scores model configurations for ranking ahead of selection.
pub trait RoutingStrategy: Send + Sync {
    /// Return a normalized score where higher means more desirable.
    fn score_model(
        &self,
        model: &ModelConfig,
        complexity: f64,
        constraints: &RoutingConstraints,
    ) -> f64;

    /// Stable identifier used for observability and reasoning text.
    fn name(&self) -> &'static str;
}

/// Build the strategy implementation for a configured kind.
pub fn strategy_for(kind: StrategyKind) -> Box<dyn RoutingStrategy> {
    match kind {
        StrategyKind::Balanced => Box::new(BalancedStrategy::default()),
        StrategyKind::CostOptimized => Box::new(CostOptimizedStrategy),
        StrategyKind::QualityOptimized => Box::new(QualityOptimizedStrategy),
        StrategyKind::LatencyOptimized => Box::new(LatencyOptimizedStrategy),
    }
}

/// Prefers the lowest-priced models while respecting constraints.
pub struct CostOptimizedStrategy;

impl RoutingStrategy for CostOptimizedStrategy {
    fn name(&self) -> &'static str {
        "cost_optimized"
    }

    fn score_model(
        &self,
        model: &ModelConfig,
        complexity: f64,
        constraints: &RoutingConstraints,
    ) -> f64 {
        let price = model.pricing().max(1e-6);
        let mut base = 1.0 / (1.0 + price * 10.0);

        // Over-budget models are penalized here, not excluded; the hard
        // filter in the selector is the exclusion path.
        if let Some(max_cost) = constraints.max_cost() {
            if price > max_cost {
                base *= 0.2;
            }
        }

        let penalty = 0.15 * clamp01(complexity);
        clamp01(base * (1.0 - penalty))
    }
}

/// Rewards models that advertise richer reasoning/code capabilities.
pub struct QualityOptimizedStrategy;

const QUALITY_CAPABILITY_WEIGHTS: [(&str, f64); 5] = [
    ("reasoning", 0.4),
    ("code", 0.3),
    ("vision", 0.15),
    ("chat", 0.1),
    ("analysis", 0.05),
];

impl QualityOptimizedStrategy {
    fn capability_score(model: &ModelConfig) -> f64 {
        let total: f64 = QUALITY_CAPABILITY_WEIGHTS
            .iter()
            .map(|(_, weight)| weight)
            .sum();
        let raw: f64 = QUALITY_CAPABILITY_WEIGHTS
            .iter()
            .filter(|(cap, _)| model.has_capability(cap))
            .map(|(_, weight)| weight)
            .sum();
        raw / total
    }
}

impl RoutingStrategy for QualityOptimizedStrategy {
    fn name(&self) -> &'static str {
        "quality_optimized"
    }

    fn score_model(
        &self,
        model: &ModelConfig,
        complexity: f64,
        constraints: &RoutingConstraints,
    ) -> f64 {
        let capability_score = Self::capability_score(model);
        let complexity_boost = 0.5 + 0.5 * clamp01(complexity);
        let mut score = capability_score * complexity_boost;

        if let Some(max_cost) = constraints.max_cost() {
            if model.pricing() > max_cost {
                score *= 0.9;
            }
        }
        if let Some(min_quality) = constraints.min_quality() {
            score += 0.1 * clamp01(min_quality);
        }

        clamp01(score)
    }
}

/// Prefers models tagged with low-latency or streaming capabilities.
pub struct LatencyOptimizedStrategy;

const LATENCY_CAPABILITY_WEIGHTS: [(&str, f64); 4] = [
    ("low-latency", 1.0),
    ("realtime", 0.9),
    ("streaming", 0.7),
    ("batch", -0.4),
];

impl RoutingStrategy for LatencyOptimizedStrategy {
    fn name(&self) -> &'static str {
        "latency_optimized"
    }

    fn score_model(
        &self,
        model: &ModelConfig,
        complexity: f64,
        constraints: &RoutingConstraints,
    ) -> f64 {
        let raw: f64 = LATENCY_CAPABILITY_WEIGHTS
            .iter()
            .filter(|(cap, _)| model.has_capability(cap))
            .map(|(_, weight)| weight)
            .sum();
        let capability_score = raw.max(0.0) / LATENCY_CAPABILITY_WEIGHTS.len() as f64;

        let cost_component = 1.0 / (1.0 + model.pricing() * 5.0);
        let complexity_penalty = 0.1 * clamp01(complexity);

        let mut score = capability_score + 0.3 * cost_component - complexity_penalty;

        if let Some(max_latency) = constraints.max_latency() {
            score *= 1.0 + 1.0 / (max_latency + 1.0);
        }

        clamp01(score)
    }
}

/// Fixed linear blend of the cost, quality, and latency strategies.
///
/// Weights: 0.30 cost, 0.45 quality, 0.25 latency. The default when no
/// explicit strategy is requested.
pub struct BalancedStrategy {
    cost: CostOptimizedStrategy,
    quality: QualityOptimizedStrategy,
    latency: LatencyOptimizedStrategy,
}

impl Default for BalancedStrategy {
    fn default() -> Self {
        Self {
            cost: CostOptimizedStrategy,
            quality: QualityOptimizedStrategy,
            latency: LatencyOptimizedStrategy,
        }
    }
}

impl RoutingStrategy for BalancedStrategy {
    fn name(&self) -> &'static str {
        "balanced"
    }

    fn score_model(
        &self,
        model: &ModelConfig,
        complexity: f64,
        constraints: &RoutingConstraints,
    ) -> f64 {
        let cost_score = self.cost.score_model(model, complexity, constraints);
        let quality_score = self.quality.score_model(model, complexity, constraints);
        let latency_score = self.latency.score_model(model, complexity, constraints);

        clamp01(0.30 * cost_score + 0.45 * quality_score + 0.25 * latency_score)
    }
}
