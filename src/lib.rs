//! modelmux - Cost-aware LLM routing across providers
//!
//! This library scores available models against per-request constraints,
//! picks the best candidate, and executes completions with cross-provider
//! fallback, retry caps, and optional usage analytics.

pub mod analytics;
pub mod config;
pub mod domain;
pub mod error;
pub mod middleware;
pub mod providers;
pub mod router;
pub mod routing;

pub use config::AppConfig;
pub use domain::{
    ModelConfig, ProviderKind, Request, Response, RoutingConstraints, RoutingDecision,
    StrategyKind,
};
pub use error::{Error, Result};
pub use router::{ChatMessage, CompletionOptions, Router};
