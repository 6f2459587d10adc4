//! Domain value objects for routing decisions.
//!
//! Everything in this module is an immutable value: constructors validate
//! invariants once, and "updates" produce new values. Catalogs built from
//! these types can be shared across tasks without locking.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Maximum accepted prompt length in characters.
pub const MAX_PROMPT_CHARS: usize = 20_000;

/// Provider families the factory can dispatch to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    Google,
    Custom,
}

impl ProviderKind {
    /// Stable lowercase key used in config sections and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Google => "google",
            ProviderKind::Custom => "custom",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "anthropic" => Ok(ProviderKind::Anthropic),
            "google" => Ok(ProviderKind::Google),
            "custom" => Ok(ProviderKind::Custom),
            other => Err(Error::Validation(format!("unknown provider '{other}'"))),
        }
    }
}

/// Pluggable scoring strategies understood by the routing layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Balanced,
    CostOptimized,
    QualityOptimized,
    LatencyOptimized,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Balanced => "balanced",
            StrategyKind::CostOptimized => "cost_optimized",
            StrategyKind::QualityOptimized => "quality_optimized",
            StrategyKind::LatencyOptimized => "latency_optimized",
        }
    }

    /// All accepted strategy names, for config validation messages.
    pub fn allowed_names() -> [&'static str; 4] {
        [
            "balanced",
            "cost_optimized",
            "quality_optimized",
            "latency_optimized",
        ]
    }
}

impl Default for StrategyKind {
    fn default() -> Self {
        StrategyKind::Balanced
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "balanced" => Ok(StrategyKind::Balanced),
            "cost_optimized" => Ok(StrategyKind::CostOptimized),
            "quality_optimized" => Ok(StrategyKind::QualityOptimized),
            "latency_optimized" => Ok(StrategyKind::LatencyOptimized),
            other => Err(Error::Validation(format!(
                "unsupported strategy '{}', expected one of {:?}",
                other,
                StrategyKind::allowed_names()
            ))),
        }
    }
}

/// Immutable configuration for one model option in the catalog.
///
/// Identity is value equality: two configs with identical fields are
/// interchangeable candidates.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    provider: ProviderKind,
    model_name: String,
    pricing: f64,
    capabilities: BTreeSet<String>,
}

impl ModelConfig {
    pub fn new(
        provider: ProviderKind,
        model_name: impl Into<String>,
        pricing: f64,
        capabilities: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<Self> {
        if pricing <= 0.0 {
            return Err(Error::Validation(
                "pricing must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            provider,
            model_name: model_name.into(),
            pricing,
            capabilities: capabilities.into_iter().map(Into::into).collect(),
        })
    }

    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Price per 1K tokens.
    pub fn pricing(&self) -> f64 {
        self.pricing
    }

    pub fn capabilities(&self) -> &BTreeSet<String> {
        &self.capabilities
    }

    pub fn has_capability(&self, tag: &str) -> bool {
        self.capabilities.contains(tag)
    }

    /// Copy of this config bound to a different model name.
    ///
    /// Used by the factory when a registered default config covers a whole
    /// model family.
    pub fn with_model_name(&self, model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            ..self.clone()
        }
    }
}

/// Immutable user request passed through routing.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    prompt: String,
    params: BTreeMap<String, serde_json::Value>,
    metadata: BTreeMap<String, serde_json::Value>,
}

impl Request {
    pub fn new(prompt: impl Into<String>) -> Result<Self> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(Error::Validation(
                "prompt must be a non-empty string".to_string(),
            ));
        }
        if prompt.chars().count() > MAX_PROMPT_CHARS {
            return Err(Error::Validation(format!(
                "prompt exceeds maximum length of {MAX_PROMPT_CHARS} characters"
            )));
        }
        Ok(Self {
            prompt,
            params: BTreeMap::new(),
            metadata: BTreeMap::new(),
        })
    }

    pub fn with_params(mut self, params: BTreeMap<String, serde_json::Value>) -> Self {
        self.params = params;
        self
    }

    pub fn with_metadata_entry(
        &self,
        key: impl Into<String>,
        value: serde_json::Value,
    ) -> Self {
        let mut derived = self.clone();
        derived.metadata.insert(key.into(), value);
        derived
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn params(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.params
    }

    pub fn metadata(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.metadata
    }
}

/// Immutable response produced by a provider adapter or the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    content: String,
    model_used: String,
    cost: f64,
    latency: f64,
    tokens: u64,
}

impl Response {
    pub fn new(
        content: impl Into<String>,
        model_used: impl Into<String>,
        cost: f64,
        latency: f64,
        tokens: u64,
    ) -> Result<Self> {
        if cost < 0.0 {
            return Err(Error::Validation("cost must be non-negative".to_string()));
        }
        if latency < 0.0 {
            return Err(Error::Validation(
                "latency must be non-negative".to_string(),
            ));
        }
        Ok(Self {
            content: content.into(),
            model_used: model_used.into(),
            cost,
            latency,
            tokens,
        })
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn model_used(&self) -> &str {
        &self.model_used
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Wall-clock latency of the provider call in seconds.
    pub fn latency(&self) -> f64 {
        self.latency
    }

    pub fn tokens(&self) -> u64 {
        self.tokens
    }
}

/// Routing guardrails that influence decision making.
///
/// At least one of `max_cost` / `max_latency` must be set.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingConstraints {
    max_cost: Option<f64>,
    max_latency: Option<f64>,
    min_quality: Option<f64>,
    strategy: StrategyKind,
}

impl RoutingConstraints {
    pub fn new(
        max_cost: Option<f64>,
        max_latency: Option<f64>,
        min_quality: Option<f64>,
        strategy: StrategyKind,
    ) -> Result<Self> {
        if let Some(cost) = max_cost {
            if cost <= 0.0 {
                return Err(Error::InvalidConstraints(
                    "max_cost must be greater than zero".to_string(),
                ));
            }
        }
        if let Some(latency) = max_latency {
            if latency <= 0.0 {
                return Err(Error::InvalidConstraints(
                    "max_latency must be greater than zero".to_string(),
                ));
            }
        }
        if let Some(quality) = min_quality {
            if !(0.0..=1.0).contains(&quality) {
                return Err(Error::InvalidConstraints(
                    "min_quality must be between 0 and 1".to_string(),
                ));
            }
        }
        if max_cost.is_none() && max_latency.is_none() {
            return Err(Error::InvalidConstraints(
                "at least one of max_cost or max_latency must be specified".to_string(),
            ));
        }
        Ok(Self {
            max_cost,
            max_latency,
            min_quality,
            strategy,
        })
    }

    pub fn max_cost(&self) -> Option<f64> {
        self.max_cost
    }

    pub fn max_latency(&self) -> Option<f64> {
        self.max_latency
    }

    pub fn min_quality(&self) -> Option<f64> {
        self.min_quality
    }

    pub fn strategy(&self) -> StrategyKind {
        self.strategy
    }
}

/// Result of evaluating constraints against the available models.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingDecision {
    selected_model: ModelConfig,
    estimated_cost: f64,
    reasoning: String,
    alternatives: Vec<ModelConfig>,
}

impl RoutingDecision {
    pub fn new(
        selected_model: ModelConfig,
        estimated_cost: f64,
        reasoning: impl Into<String>,
        alternatives: Vec<ModelConfig>,
    ) -> Result<Self> {
        let reasoning = reasoning.into();
        if estimated_cost < 0.0 {
            return Err(Error::Validation(
                "estimated_cost must be non-negative".to_string(),
            ));
        }
        if reasoning.trim().is_empty() {
            return Err(Error::Validation(
                "reasoning must not be empty".to_string(),
            ));
        }
        if alternatives.contains(&selected_model) {
            return Err(Error::Validation(
                "selected model cannot be listed as an alternative".to_string(),
            ));
        }
        Ok(Self {
            selected_model,
            estimated_cost,
            reasoning,
            alternatives,
        })
    }

    pub fn selected_model(&self) -> &ModelConfig {
        &self.selected_model
    }

    pub fn estimated_cost(&self) -> f64 {
        self.estimated_cost
    }

    pub fn reasoning(&self) -> &str {
        &self.reasoning
    }

    pub fn alternatives(&self) -> &[ModelConfig] {
        &self.alternatives
    }
}
