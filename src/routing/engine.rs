//! Routing engine facade coordinating estimation and selection.

use crate::domain::{ModelConfig, Request, RoutingConstraints, RoutingDecision};
use crate::error::{Error, Result};

use super::estimator::{default_complexity_estimator, ComplexityEstimator};
use super::selector::ModelSelector;

/// High-level facade that orchestrates routing without owning the logic.
///
/// Holds the read-only model catalog; estimates complexity once per route and
/// annotates the selector's reasoning with it.
pub struct RoutingEngine {
    estimator: ComplexityEstimator,
    selector: ModelSelector,
    models: Vec<ModelConfig>,
}

impl RoutingEngine {
    pub fn new(selector: ModelSelector, models: Vec<ModelConfig>) -> Result<Self> {
        if models.is_empty() {
            return Err(Error::Validation(
                "at least one model must be provided to the engine".to_string(),
            ));
        }
        Ok(Self {
            estimator: default_complexity_estimator(),
            selector,
            models,
        })
    }

    pub fn models(&self) -> &[ModelConfig] {
        &self.models
    }

    /// Route a request, appending the complexity estimate to the reasoning.
    pub fn route(
        &self,
        request: &Request,
        constraints: &RoutingConstraints,
    ) -> Result<RoutingDecision> {
        let complexity = self.estimator.estimate(request.prompt());
        let decision = self.selector.select(&self.models, request, constraints)?;

        tracing::debug!(
            model = %decision.selected_model().model_name(),
            complexity = format!("{complexity:.2}"),
            alternatives = decision.alternatives().len(),
            "Routing decision made"
        );

        RoutingDecision::new(
            decision.selected_model().clone(),
            decision.estimated_cost(),
            format!("{} | complexity={:.2}", decision.reasoning(), complexity),
            decision.alternatives().to_vec(),
        )
    }

    /// Human-readable explanation of a decision.
    pub fn explain(&self, decision: &RoutingDecision) -> String {
        let mut explanation = format!(
            "Selected {} from provider {} at estimated cost {:.4}.",
            decision.selected_model().model_name(),
            decision.selected_model().provider(),
            decision.estimated_cost()
        );
        if !decision.alternatives().is_empty() {
            let alt_names: Vec<&str> = decision
                .alternatives()
                .iter()
                .take(3)
                .map(|model| model.model_name())
                .collect();
            explanation.push_str(&format!(
                " Alternatives considered: {}.",
                alt_names.join(", ")
            ));
        }
        explanation.push_str(&format!(" Reasoning: {}", decision.reasoning()));
        explanation
    }
}
