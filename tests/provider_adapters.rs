//! Provider adapter tests against mock HTTP servers.

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use modelmux::config::ProviderConfig;
use modelmux::domain::{ModelConfig, ProviderKind, Request};
use modelmux::error::Error;
use modelmux::providers::{
    AnthropicProvider, GoogleProvider, OpenAiProvider, Provider,
};

fn provider_config(server: &MockServer) -> ProviderConfig {
    let mut config = ProviderConfig::new("sk-test", server.uri());
    config.max_retries = 2;
    config.backoff_factor = 0.0;
    config
}

fn openai_pricing() -> ModelConfig {
    ModelConfig::new(ProviderKind::OpenAi, "gpt-4", 0.06, ["chat", "code"]).unwrap()
}

fn openai_body(content: &str, total_tokens: u64) -> serde_json::Value {
    json!({
        "choices": [{"message": {"role": "assistant", "content": content}}],
        "usage": {"prompt_tokens": 5, "completion_tokens": 10, "total_tokens": total_tokens},
    })
}

#[tokio::test]
async fn openai_success_normalizes_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4",
            "messages": [{"role": "user", "content": "hello"}],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_body("hi!", 1000)))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(&provider_config(&server), openai_pricing()).unwrap();
    let request = Request::new("hello").unwrap();
    let response = provider.complete(&request).await.unwrap();

    assert_eq!(response.content(), "hi!");
    assert_eq!(response.model_used(), "gpt-4");
    assert_eq!(response.tokens(), 1000);
    // 1000 tokens at $0.06 per 1K
    assert_eq!(response.cost(), 0.06);
    assert!(response.latency() >= 0.0);
}

#[tokio::test]
async fn openai_retries_rate_limit_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_body("recovered", 10)))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(&provider_config(&server), openai_pricing()).unwrap();
    let response = provider
        .complete(&Request::new("hello").unwrap())
        .await
        .unwrap();
    assert_eq!(response.content(), "recovered");
}

#[tokio::test]
async fn openai_surfaces_unavailable_after_retry_budget() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        // 1 initial attempt + 2 retries
        .expect(3)
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(&provider_config(&server), openai_pricing()).unwrap();
    let result = provider.complete(&Request::new("hello").unwrap()).await;
    assert!(matches!(result, Err(Error::Unavailable(_))));
}

#[tokio::test]
async fn openai_auth_failure_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(&provider_config(&server), openai_pricing()).unwrap();
    let result = provider.complete(&Request::new("hello").unwrap()).await;
    assert!(matches!(result, Err(Error::Auth(_))));
}

#[tokio::test]
async fn openai_client_error_maps_to_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(400).set_body_string("unknown field 'foo'"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(&provider_config(&server), openai_pricing()).unwrap();
    let result = provider.complete(&Request::new("hello").unwrap()).await;
    assert!(matches!(result, Err(Error::Provider(msg)) if msg.contains("unknown field")));
}

#[tokio::test]
async fn anthropic_sends_version_header_and_reads_output_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "sk-test"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": "claude-3-opus",
            "max_tokens": 1024,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{"type": "text", "text": "bonjour"}],
            "usage": {"input_tokens": 12, "output_tokens": 2000},
        })))
        .expect(1)
        .mount(&server)
        .await;

    let pricing = ModelConfig::new(
        ProviderKind::Anthropic,
        "claude-3-opus",
        0.015,
        ["chat", "reasoning"],
    )
    .unwrap();
    let provider = AnthropicProvider::new(&provider_config(&server), pricing).unwrap();
    let response = provider
        .complete(&Request::new("hello").unwrap())
        .await
        .unwrap();

    assert_eq!(response.content(), "bonjour");
    assert_eq!(response.tokens(), 2000);
    assert_eq!(response.cost(), 0.03);
}

#[tokio::test]
async fn google_posts_to_model_scoped_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-1.5-pro:generateContent"))
        .and(header("x-goog-api-key", "sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "hallo"}]}}],
            "usageMetadata": {"totalTokenCount": 500},
        })))
        .expect(1)
        .mount(&server)
        .await;

    let pricing = ModelConfig::new(
        ProviderKind::Google,
        "gemini-1.5-pro",
        0.01,
        ["chat", "vision"],
    )
    .unwrap();
    let provider = GoogleProvider::new(&provider_config(&server), pricing).unwrap();
    let response = provider
        .complete(&Request::new("hello").unwrap())
        .await
        .unwrap();

    assert_eq!(response.content(), "hallo");
    assert_eq!(response.tokens(), 500);
    assert_eq!(response.cost(), 0.005);
}

#[tokio::test]
async fn malformed_success_body_is_a_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(&provider_config(&server), openai_pricing()).unwrap();
    let result = provider.complete(&Request::new("hello").unwrap()).await;
    assert!(matches!(result, Err(Error::Provider(_))));
}
