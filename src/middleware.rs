//! Request/response middleware around the completion pipeline.
//!
//! Middlewares run in registration order on the way in and reverse order on
//! the way out. A middleware can short-circuit the pipeline by answering the
//! request itself, which is how the response cache skips provider calls.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{Request, Response};
use crate::error::{Error, Result};

/// Outcome of a middleware's inbound pass.
pub enum Flow {
    /// Hand the (possibly rewritten) request to the next stage.
    Continue(Request),
    /// Answer immediately without touching later stages or providers.
    ShortCircuit(Response),
}

#[async_trait]
pub trait Middleware: Send + Sync {
    /// Inspect or rewrite the request before routing.
    async fn process_request(&self, request: Request) -> Result<Flow> {
        Ok(Flow::Continue(request))
    }

    /// Inspect or rewrite the response after a successful completion.
    async fn process_response(&self, request: &Request, response: Response) -> Result<Response> {
        let _ = request;
        Ok(response)
    }
}

/// Ordered middleware pipeline.
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    stages: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, stage: Arc<dyn Middleware>) {
        self.stages.push(stage);
    }

    /// Run `handler` inside the pipeline.
    pub async fn execute<F, Fut>(&self, request: Request, handler: F) -> Result<Response>
    where
        F: FnOnce(Request) -> Fut,
        Fut: std::future::Future<Output = Result<Response>>,
    {
        let mut request = request;
        for stage in &self.stages {
            match stage.process_request(request).await? {
                Flow::Continue(next) => request = next,
                Flow::ShortCircuit(response) => return Ok(response),
            }
        }

        let mut response = handler(request.clone()).await?;
        for stage in self.stages.iter().rev() {
            response = stage.process_response(&request, response).await?;
        }
        Ok(response)
    }
}

/// Logs one line per request and per response.
pub struct LoggingMiddleware;

#[async_trait]
impl Middleware for LoggingMiddleware {
    async fn process_request(&self, request: Request) -> Result<Flow> {
        tracing::info!(
            prompt_chars = request.prompt().chars().count(),
            "Completion request received"
        );
        Ok(Flow::Continue(request))
    }

    async fn process_response(&self, _request: &Request, response: Response) -> Result<Response> {
        tracing::info!(
            model = %response.model_used(),
            cost = response.cost(),
            tokens = response.tokens(),
            "Completion finished"
        );
        Ok(response)
    }
}

/// Rejects request parameters with out-of-range values before any provider
/// sees them.
pub struct ValidationMiddleware;

#[async_trait]
impl Middleware for ValidationMiddleware {
    async fn process_request(&self, request: Request) -> Result<Flow> {
        if let Some(temperature) = request.params().get("temperature") {
            match temperature.as_f64() {
                Some(value) if (0.0..=2.0).contains(&value) => {}
                _ => {
                    return Err(Error::Validation(
                        "temperature must be a number between 0 and 2".to_string(),
                    ))
                }
            }
        }
        if let Some(max_tokens) = request.params().get("max_tokens") {
            match max_tokens.as_u64() {
                Some(value) if value > 0 => {}
                _ => {
                    return Err(Error::Validation(
                        "max_tokens must be a positive integer".to_string(),
                    ))
                }
            }
        }
        Ok(Flow::Continue(request))
    }
}

/// In-memory exact-prompt response cache.
///
/// Cache hits are marked with zero cost and latency since no provider was
/// invoked.
pub struct CachingMiddleware {
    cache: Mutex<HashMap<String, Response>>,
}

impl CachingMiddleware {
    pub fn new() -> Self {
        Self {
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn cache_key(request: &Request) -> String {
        match serde_json::to_string(request.params()) {
            Ok(params) => format!("{}|{}", request.prompt(), params),
            Err(_) => request.prompt().to_string(),
        }
    }
}

impl Default for CachingMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Middleware for CachingMiddleware {
    async fn process_request(&self, request: Request) -> Result<Flow> {
        let key = Self::cache_key(&request);
        if let Some(hit) = self.cache.lock().await.get(&key) {
            tracing::debug!("Serving completion from cache");
            let cached = Response::new(
                hit.content(),
                hit.model_used(),
                0.0,
                0.0,
                hit.tokens(),
            )?;
            return Ok(Flow::ShortCircuit(cached));
        }
        Ok(Flow::Continue(request))
    }

    async fn process_response(&self, request: &Request, response: Response) -> Result<Response> {
        let key = Self::cache_key(request);
        self.cache.lock().await.insert(key, response.clone());
        Ok(response)
    }
}
