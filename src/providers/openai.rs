//! OpenAI chat completions adapter.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::{ApiKey, ProviderConfig};
use crate::domain::{ModelConfig, ProviderKind, Request, Response};
use crate::error::{Error, Result};
use crate::providers::retry::{execute_with_retry, RetryHooks, RetryPolicy};
use crate::providers::{error_for_status, estimate_cost, Provider};

pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: ApiKey,
    policy: RetryPolicy,
    pricing: ModelConfig,
}

impl OpenAiProvider {
    pub fn new(config: &ProviderConfig, pricing: ModelConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs_f64(config.timeout_secs))
            .build()?;
        Ok(Self::with_client(client, config, pricing))
    }

    /// Build an adapter around an already constructed transport, so the
    /// factory can share one client per credential.
    pub fn with_client(
        client: reqwest::Client,
        config: &ProviderConfig,
        pricing: ModelConfig,
    ) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            policy: RetryPolicy {
                max_retries: config.max_retries,
                backoff_factor: config.backoff_factor,
            },
            pricing,
        }
    }

    fn build_payload(&self, request: &Request) -> Value {
        let mut map = serde_json::Map::new();
        for (key, value) in request.params() {
            map.insert(key.clone(), value.clone());
        }
        map.insert("model".to_string(), json!(self.pricing.model_name()));
        map.insert(
            "messages".to_string(),
            json!([{"role": "user", "content": request.prompt()}]),
        );
        Value::Object(map)
    }

    async fn raw_call(&self, payload: &Value) -> Result<Value> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(payload)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_for_status(ProviderKind::OpenAi, status, &body));
        }
        Ok(response.json().await?)
    }
}

/// Extract (content, tokens) from a chat completions body.
fn parse_body(body: &Value) -> Result<(String, u64)> {
    let content = body
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            Error::Provider("openai response missing choices[0].message.content".to_string())
        })?;
    let tokens = body
        .pointer("/usage/total_tokens")
        .or_else(|| body.pointer("/usage/completion_tokens"))
        .and_then(Value::as_u64)
        .unwrap_or(0);
    Ok((content.to_string(), tokens))
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn complete(&self, request: &Request) -> Result<Response> {
        let payload = self.build_payload(request);
        let start = Instant::now();
        let body =
            execute_with_retry(&self.policy, &RetryHooks::default(), || {
                self.raw_call(&payload)
            })
            .await?;
        let latency = start.elapsed().as_secs_f64();
        let (content, tokens) = parse_body(&body)?;
        let cost = estimate_cost(tokens, self.pricing.pricing());
        Response::new(content, self.pricing.model_name(), cost, latency, tokens)
    }

    fn supports_streaming(&self) -> bool {
        true
    }

    fn pricing(&self) -> &ModelConfig {
        &self.pricing
    }
}
