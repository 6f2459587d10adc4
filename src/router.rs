//! Public router facade: routing, middleware, fallback execution, tracking.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::analytics::UsageTracker;
use crate::config::{AppConfig, ProviderConfig, RouterConfig};
use crate::domain::{
    ModelConfig, ProviderKind, Request, Response, RoutingConstraints, RoutingDecision,
    StrategyKind,
};
use crate::error::{Error, Result};
use crate::middleware::{
    CachingMiddleware, LoggingMiddleware, MiddlewareChain, ValidationMiddleware,
};
use crate::providers::ProviderFactory;
use crate::routing::{ModelSelector, RoutingEngine};

/// Stand-in bounds applied when the caller sets no explicit constraint, wide
/// enough to never filter anything.
const DEFAULT_MAX_COST: f64 = 1000.0;
const DEFAULT_MAX_LATENCY: f64 = 30_000.0;

/// One turn of a chat conversation.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Per-call knobs for [`Router::complete`].
#[derive(Debug, Clone, Default)]
pub struct CompletionOptions {
    pub max_cost: Option<f64>,
    pub max_latency: Option<f64>,
    pub min_quality: Option<f64>,
    pub strategy: Option<StrategyKind>,
    pub params: BTreeMap<String, serde_json::Value>,
}

/// Routes completions across providers with fallback and retry caps.
pub struct Router {
    engine: RoutingEngine,
    factory: ProviderFactory,
    provider_configs: HashMap<ProviderKind, ProviderConfig>,
    fallback_models: Vec<String>,
    forced_provider: Option<ProviderKind>,
    max_retries: u32,
    default_strategy: StrategyKind,
    middleware: MiddlewareChain,
    tracker: Option<UsageTracker>,
}

impl Router {
    pub fn new(
        models: Vec<ModelConfig>,
        provider_configs: HashMap<ProviderKind, ProviderConfig>,
        router_config: &RouterConfig,
    ) -> Result<Self> {
        let engine = RoutingEngine::new(ModelSelector::new(), models)?;

        let mut middleware = MiddlewareChain::new();
        middleware.push(Arc::new(ValidationMiddleware));
        middleware.push(Arc::new(LoggingMiddleware));
        if router_config.enable_cache {
            middleware.push(Arc::new(CachingMiddleware::new()));
        }

        Ok(Self {
            engine,
            factory: ProviderFactory::new(),
            provider_configs,
            fallback_models: router_config.fallback_models.clone(),
            forced_provider: None,
            max_retries: router_config.max_retries,
            default_strategy: router_config.default_strategy,
            middleware,
            tracker: None,
        })
    }

    /// Wire a router straight from a loaded configuration file.
    pub fn from_app_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            config.models.clone(),
            config.providers.clone(),
            &config.router,
        )
    }

    pub fn with_factory(mut self, factory: ProviderFactory) -> Self {
        self.factory = factory;
        self
    }

    pub fn with_tracker(mut self, tracker: UsageTracker) -> Self {
        self.tracker = Some(tracker);
        self
    }

    pub fn with_middleware(mut self, middleware: MiddlewareChain) -> Self {
        self.middleware = middleware;
        self
    }

    /// Replace the configured fallback model list.
    pub fn configure_fallback(&mut self, models: Vec<String>) {
        self.fallback_models = models;
    }

    /// Pin or clear a preferred provider. The provider must have credentials
    /// configured; candidates from other providers are reordered behind it,
    /// never dropped.
    pub fn set_forced_provider(&mut self, provider: Option<ProviderKind>) -> Result<()> {
        if let Some(kind) = provider {
            if !self.provider_configs.contains_key(&kind) {
                return Err(Error::Validation(format!(
                    "cannot force provider '{kind}': no credentials configured"
                )));
            }
        }
        self.forced_provider = provider;
        Ok(())
    }

    /// Complete a prompt against the best model the constraints allow.
    pub async fn complete(&self, prompt: &str, options: CompletionOptions) -> Result<Response> {
        let request = Request::new(prompt)?.with_params(options.params.clone());
        let constraints = self.constraints_from(&options)?;

        self.middleware
            .clone()
            .execute(request, |request| async move {
                let decision = self.engine.route(&request, &constraints)?;
                self.execute_with_fallback(&request, &decision).await
            })
            .await
    }

    /// Complete a chat conversation by flattening it into a single prompt.
    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        options: CompletionOptions,
    ) -> Result<Response> {
        let prompt = messages
            .iter()
            .map(|message| format!("{}: {}", message.role, message.content))
            .collect::<Vec<_>>()
            .join("\n");
        self.complete(&prompt, options).await
    }

    /// Explain where a prompt would be routed, without calling any provider.
    pub fn explain(&self, prompt: &str, options: &CompletionOptions) -> Result<String> {
        let request = Request::new(prompt)?.with_params(options.params.clone());
        let constraints = self.constraints_from(options)?;
        let decision = self.engine.route(&request, &constraints)?;
        Ok(self.engine.explain(&decision))
    }

    fn constraints_from(&self, options: &CompletionOptions) -> Result<RoutingConstraints> {
        RoutingConstraints::new(
            Some(options.max_cost.unwrap_or(DEFAULT_MAX_COST)),
            Some(options.max_latency.unwrap_or(DEFAULT_MAX_LATENCY)),
            options.min_quality,
            options.strategy.unwrap_or(self.default_strategy),
        )
    }

    /// Ordered (model, provider) candidates for one decision: routed models
    /// first, then configured fallbacks not already present, then a stable
    /// reorder if a provider is forced.
    fn build_candidates(&self, decision: &RoutingDecision) -> Vec<(String, ProviderKind)> {
        let mut candidates: Vec<(String, ProviderKind)> = Vec::new();
        candidates.push((
            decision.selected_model().model_name().to_string(),
            decision.selected_model().provider(),
        ));
        for alternative in decision.alternatives() {
            candidates.push((
                alternative.model_name().to_string(),
                alternative.provider(),
            ));
        }

        for fallback in &self.fallback_models {
            if candidates.iter().any(|(name, _)| name == fallback) {
                continue;
            }
            match self.factory.infer_provider_kind(fallback) {
                Some(kind) => candidates.push((fallback.clone(), kind)),
                None => {
                    tracing::debug!(
                        model = %fallback,
                        "Skipping fallback model with no matching provider rule"
                    );
                }
            }
        }

        if let Some(forced) = self.forced_provider {
            let (preferred, rest): (Vec<_>, Vec<_>) = candidates
                .into_iter()
                .partition(|(_, kind)| *kind == forced);
            candidates = preferred;
            candidates.extend(rest);
        }

        candidates
    }

    /// Walk candidates until one succeeds or the attempt budget runs out.
    ///
    /// An attempt is an actual provider invocation; candidates without
    /// configured credentials are skipped for free.
    async fn execute_with_fallback(
        &self,
        request: &Request,
        decision: &RoutingDecision,
    ) -> Result<Response> {
        let candidates = self.build_candidates(decision);
        let mut attempts: u32 = 0;
        let mut last_error: Option<Error> = None;

        for (model_name, kind) in &candidates {
            if attempts >= self.max_retries {
                tracing::warn!(
                    attempts,
                    "Attempt budget exhausted before trying all candidates"
                );
                break;
            }
            let Some(provider_config) = self.provider_configs.get(kind) else {
                tracing::debug!(
                    model = %model_name,
                    provider = %kind,
                    "Skipping candidate without configured credentials"
                );
                continue;
            };

            attempts += 1;
            let outcome = match self.factory.create(model_name, provider_config) {
                Ok(provider) => provider.complete(request).await,
                Err(err) => Err(err),
            };
            match outcome {
                Ok(response) => {
                    if let Some(tracker) = &self.tracker {
                        tracker.track(request, &response, *kind);
                    }
                    return Ok(response);
                }
                Err(err) => {
                    tracing::warn!(
                        model = %model_name,
                        provider = %kind,
                        attempt = attempts,
                        error = %err,
                        "Provider attempt failed, trying next candidate"
                    );
                    last_error = Some(err);
                }
            }
        }

        Err(Error::AllAttemptsFailed {
            last: last_error.map(Box::new),
        })
    }
}
