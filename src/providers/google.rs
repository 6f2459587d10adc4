//! Google Gemini generateContent adapter.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::{ApiKey, ProviderConfig};
use crate::domain::{ModelConfig, ProviderKind, Request, Response};
use crate::error::{Error, Result};
use crate::providers::retry::{execute_with_retry, RetryHooks, RetryPolicy};
use crate::providers::{error_for_status, estimate_cost, Provider};

pub struct GoogleProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: ApiKey,
    policy: RetryPolicy,
    pricing: ModelConfig,
}

impl GoogleProvider {
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
        let mut payload = json!({
            "contents": [{"parts": [{"text": request.prompt()}]}],
        });
        if !request.params().is_empty() {
            let generation_config: serde_json::Map<String, Value> = request
                .params()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            payload["generationConfig"] = Value::Object(generation_config);
        }
        payload
    }

    async fn raw_call(&self, payload: &Value) -> Result<Value> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url,
            self.pricing.model_name()
        );
        let response = self
            .client
            .post(&url)
            .header("X-Goog-Api-Key", self.api_key.expose_secret())
            .json(payload)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_for_status(ProviderKind::Google, status, &body));
        }
        Ok(response.json().await?)
    }
}

fn parse_body(body: &Value) -> Result<(String, u64)> {
    let content = body
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            Error::Provider(
                "google response missing candidates[0].content.parts[0].text".to_string(),
            )
        })?;
    let tokens = body
        .pointer("/usageMetadata/totalTokenCount")
        .or_else(|| body.pointer("/usageMetadata/candidatesTokenCount"))
        .and_then(Value::as_u64)
        .unwrap_or(0);
    Ok((content.to_string(), tokens))
}

#[async_trait]
impl Provider for GoogleProvider {
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

    fn pricing(&self) -> &ModelConfig {
        &self.pricing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn provider() -> GoogleProvider {
        let config = ProviderConfig::new(
            "g-test",
            "https://generativelanguage.googleapis.com",
        );
        let pricing = ModelConfig::new(
            ProviderKind::Google,
            "gemini-1.5-pro",
            0.01,
            ["chat", "vision"],
        )
        .unwrap();
        GoogleProvider::new(&config, pricing).unwrap()
    }

    #[test]
    fn payload_wraps_prompt_in_contents() {
        let request = Request::new("describe this").unwrap();
        let payload = provider().build_payload(&request);
        assert_eq!(payload["contents"][0]["parts"][0]["text"], "describe this");
        assert!(payload.get("generationConfig").is_none());
    }

    #[test]
    fn params_land_in_generation_config() {
        let mut params = BTreeMap::new();
        params.insert("temperature".to_string(), json!(0.7));
        let request = Request::new("hello").unwrap().with_params(params);
        let payload = provider().build_payload(&request);
        assert_eq!(payload["generationConfig"]["temperature"], json!(0.7));
    }

    #[test]
    fn parse_body_prefers_total_token_count() {
        let body = json!({
            "candidates": [{"content": {"parts": [{"text": "hi"}]}}],
            "usageMetadata": {"totalTokenCount": 33, "candidatesTokenCount": 11},
        });
        assert_eq!(parse_body(&body).unwrap(), ("hi".to_string(), 33));
    }

    #[test]
    fn parse_body_rejects_missing_candidates() {
        let body = json!({"candidates": []});
        assert!(matches!(parse_body(&body), Err(Error::Provider(_))));
    }
}
