//! Anthropic messages adapter.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::{ApiKey, ProviderConfig};
use crate::domain::{ModelConfig, ProviderKind, Request, Response};
use crate::error::{Error, Result};
use crate::providers::retry::{execute_with_retry, RetryHooks, RetryPolicy};
use crate::providers::{error_for_status, estimate_cost, Provider};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u64 = 1024;

pub struct AnthropicProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: ApiKey,
    policy: RetryPolicy,
    pricing: ModelConfig,
}

impl AnthropicProvider {
    pub fn new(config: &ProviderConfig, pricing: ModelConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs_f64(config.timeout_secs))
            .build()?;
        Ok(Self::with_client(client, config, pricing))
    }

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
        // The messages API requires max_tokens.
        map.entry("max_tokens".to_string())
            .or_insert_with(|| json!(DEFAULT_MAX_TOKENS));
        map.insert("model".to_string(), json!(self.pricing.model_name()));
        map.insert(
            "messages".to_string(),
            json!([{"role": "user", "content": request.prompt()}]),
        );
        Value::Object(map)
    }

    async fn raw_call(&self, payload: &Value) -> Result<Value> {
        let url = format!("{}/v1/messages", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(payload)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_for_status(ProviderKind::Anthropic, status, &body));
        }
        Ok(response.json().await?)
    }
}

fn parse_body(body: &Value) -> Result<(String, u64)> {
    let content = body
        .pointer("/content/0/text")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            Error::Provider("anthropic response missing content[0].text".to_string())
        })?;
    let tokens = body
        .pointer("/usage/output_tokens")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    Ok((content.to_string(), tokens))
}

#[async_trait]
impl Provider for AnthropicProvider {
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn provider() -> AnthropicProvider {
        let config = ProviderConfig::new("sk-ant-test", "https://api.anthropic.com");
        let pricing = ModelConfig::new(
            ProviderKind::Anthropic,
            "claude-3-opus",
            0.015,
            ["chat", "reasoning"],
        )
        .unwrap();
        AnthropicProvider::new(&config, pricing).unwrap()
    }

    #[test]
    fn payload_defaults_max_tokens() {
        let request = Request::new("hello").unwrap();
        let payload = provider().build_payload(&request);
        assert_eq!(payload["max_tokens"], json!(DEFAULT_MAX_TOKENS));
        assert_eq!(payload["messages"][0]["content"], "hello");
    }

    #[test]
    fn explicit_max_tokens_wins() {
        let mut params = BTreeMap::new();
        params.insert("max_tokens".to_string(), json!(64));
        let request = Request::new("hello").unwrap().with_params(params);
        let payload = provider().build_payload(&request);
        assert_eq!(payload["max_tokens"], json!(64));
    }

    #[test]
    fn parse_body_reads_output_tokens() {
        let body = json!({
            "content": [{"type": "text", "text": "hi there"}],
            "usage": {"input_tokens": 9, "output_tokens": 21},
        });
        assert_eq!(parse_body(&body).unwrap(), ("hi there".to_string(), 21));
    }

    #[test]
    fn parse_body_rejects_empty_content() {
        let body = json!({"content": []});
        assert!(matches!(parse_body(&body), Err(Error::Provider(_))));
    }
}
