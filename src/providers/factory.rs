//! Pattern-based provider construction with per-credential client reuse.
//!
//! Model names are matched against an ordered list of regex rules; the first
//! match decides the provider family. One `reqwest::Client` is kept per
//! (family, credential) pair so repeated calls share connection pools, while
//! the adapter built around it always carries the requested model's pricing.

use std::sync::Arc;

use dashmap::DashMap;
use regex::{Regex, RegexBuilder};

use crate::config::ProviderConfig;
use crate::domain::{ModelConfig, ProviderKind};
use crate::error::{Error, Result};
use crate::providers::{AnthropicProvider, GoogleProvider, OpenAiProvider, Provider};

const DEFAULT_RULES: [(&str, ProviderKind); 3] = [
    (r"^(gpt|text-davinci|o1)", ProviderKind::OpenAi),
    (r"^(claude)", ProviderKind::Anthropic),
    (r"^(gemini|palm)", ProviderKind::Google),
];

pub struct ProviderFactory {
    rules: Vec<(Regex, ProviderKind)>,
    clients: DashMap<(ProviderKind, String), reqwest::Client>,
}

impl ProviderFactory {
    /// Factory seeded with the stock OpenAI, Anthropic, and Google rules.
    pub fn new() -> Self {
        let rules = DEFAULT_RULES
            .iter()
            .map(|(pattern, kind)| (compile_rule(pattern).expect("stock rule compiles"), *kind))
            .collect();
        Self {
            rules,
            clients: DashMap::new(),
        }
    }

    /// Append a matching rule. Earlier rules keep priority, so a rule
    /// registered here only fires when no stock rule matched first.
    pub fn register(&mut self, pattern: &str, kind: ProviderKind) -> Result<()> {
        let regex = compile_rule(pattern)
            .map_err(|err| Error::Validation(format!("invalid provider pattern: {err}")))?;
        self.rules.push((regex, kind));
        Ok(())
    }

    /// Provider family for a model name, if any rule matches.
    ///
    /// Usable without credentials; the fallback core calls this to decide
    /// whether a candidate model is worth attempting.
    pub fn infer_provider_kind(&self, model_name: &str) -> Option<ProviderKind> {
        self.rules
            .iter()
            .find(|(regex, _)| regex.is_match(model_name))
            .map(|(_, kind)| *kind)
    }

    /// Build (or fetch from cache) a provider for `model_name`.
    pub fn create(
        &self,
        model_name: &str,
        config: &ProviderConfig,
    ) -> Result<Arc<dyn Provider>> {
        let kind = self
            .infer_provider_kind(model_name)
            .ok_or_else(|| Error::NoProviderRegistered {
                model: model_name.to_string(),
            })?;
        let client = self.client_for(kind, config)?;
        let pricing = default_model_config(kind, model_name)?.with_model_name(model_name);
        let provider: Arc<dyn Provider> = match kind {
            ProviderKind::OpenAi => {
                Arc::new(OpenAiProvider::with_client(client, config, pricing))
            }
            ProviderKind::Anthropic => {
                Arc::new(AnthropicProvider::with_client(client, config, pricing))
            }
            ProviderKind::Google => {
                Arc::new(GoogleProvider::with_client(client, config, pricing))
            }
            // Custom deployments speak the OpenAI wire format against their
            // own base URL.
            ProviderKind::Custom => {
                Arc::new(OpenAiProvider::with_client(client, config, pricing))
            }
        };
        Ok(provider)
    }

    /// One transport per (family, credential). Concurrent first-time callers
    /// may both build a client; the losing insert is dropped, which keeps
    /// the upsert idempotent.
    fn client_for(&self, kind: ProviderKind, config: &ProviderConfig) -> Result<reqwest::Client> {
        let key = (kind, config.api_key.expose_secret().to_string());
        if let Some(existing) = self.clients.get(&key) {
            return Ok(existing.clone());
        }
        let built = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs_f64(config.timeout_secs))
            .build()?;
        Ok(self.clients.entry(key).or_insert(built).clone())
    }
}

impl Default for ProviderFactory {
    fn default() -> Self {
        Self::new()
    }
}

fn compile_rule(pattern: &str) -> std::result::Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

/// Stock catalog entry for a provider family, bound to `model_name` by the
/// caller via [`ModelConfig::with_model_name`].
fn default_model_config(kind: ProviderKind, model_name: &str) -> Result<ModelConfig> {
    match kind {
        ProviderKind::OpenAi => ModelConfig::new(
            ProviderKind::OpenAi,
            "gpt-4",
            0.06,
            ["chat", "reasoning", "code"],
        ),
        ProviderKind::Anthropic => ModelConfig::new(
            ProviderKind::Anthropic,
            "claude-3-opus",
            0.015,
            ["chat", "reasoning", "code"],
        ),
        ProviderKind::Google => ModelConfig::new(
            ProviderKind::Google,
            "gemini-1.5-pro",
            0.01,
            ["chat", "vision", "reasoning"],
        ),
        ProviderKind::Custom => {
            ModelConfig::new(ProviderKind::Custom, model_name, 0.01, ["chat"])
        }
    }
}
