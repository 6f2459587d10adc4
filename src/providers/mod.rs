//! Provider adapters and the factory that dispatches to them.
//!
//! Adapters translate a normalized [`Request`](crate::domain::Request) into
//! provider HTTP calls, a normalized [`Response`](crate::domain::Response),
//! and typed errors. Transient failures (rate limits, outages) are retried
//! inside the adapter via [`retry::execute_with_retry`]; everything else
//! surfaces immediately to the fallback core.

pub mod anthropic;
pub mod factory;
pub mod google;
pub mod openai;
pub mod retry;

pub use anthropic::AnthropicProvider;
pub use factory::ProviderFactory;
pub use google::GoogleProvider;
pub use openai::OpenAiProvider;

use async_trait::async_trait;

use crate::domain::{ModelConfig, Request, Response};
use crate::error::Result;

/// Contract every provider adapter satisfies.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Submit a request to the provider and return a normalized response.
    async fn complete(&self, request: &Request) -> Result<Response>;

    /// Whether the provider can stream partial outputs.
    fn supports_streaming(&self) -> bool {
        false
    }

    /// Immutable pricing/model metadata for routing comparisons.
    fn pricing(&self) -> &ModelConfig;
}

/// Crude token estimation based on whitespace splitting.
///
/// Good enough for logging and cost estimates; exact accounting is out of
/// scope.
pub fn count_tokens(text: &str) -> u64 {
    text.split_whitespace().count() as u64
}

/// Estimated cost for a token count at a per-1K-token price, rounded to six
/// decimal places.
pub(crate) fn estimate_cost(tokens: u64, pricing: f64) -> f64 {
    ((tokens as f64 / 1000.0) * pricing * 1e6).round() / 1e6
}

/// Map a non-success HTTP status to the typed error the fallback core
/// understands. Only rate limits and server errors are transient.
pub(crate) fn error_for_status(
    provider: crate::domain::ProviderKind,
    status: reqwest::StatusCode,
    body: &str,
) -> crate::error::Error {
    use crate::error::Error;

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        Error::RateLimited(format!("{provider} rate limit exceeded"))
    } else if status.is_server_error() {
        Error::Unavailable(format!("{provider} unavailable ({status})"))
    } else if status == reqwest::StatusCode::UNAUTHORIZED
        || status == reqwest::StatusCode::FORBIDDEN
    {
        Error::Auth(format!("{provider} rejected credentials ({status})"))
    } else {
        let snippet: String = body.chars().take(200).collect();
        Error::Provider(format!("{provider} request failed ({status}): {snippet}"))
    }
}
