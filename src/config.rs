//! Configuration parsing and validation for modelmux.
//!
//! Two layers of configuration exist:
//! - [`RouterConfig`]: routing behavior (strategy, retry budget, fallbacks),
//!   loadable from environment variables.
//! - [`AppConfig`]: the full TOML file with provider credentials and the
//!   model catalog, with `${VAR}` expansion for secrets.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::{ModelConfig, ProviderKind, StrategyKind};

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Environment variable '{var}' not set for provider '{provider}': {message}")]
    EnvVar {
        var: String,
        provider: String,
        message: String,
    },
}

/// API key wrapper that redacts in Debug/Display/Serialize and zeroizes on drop.
///
/// The inner `SecretString` keeps the credential out of logs; the raw value
/// is only reachable through `.expose_secret()`, so every use is auditable.
#[derive(Clone)]
pub struct ApiKey(SecretString);

impl ApiKey {
    /// Access the raw key value. Call sites are auditable via `grep expose_secret`.
    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl std::fmt::Display for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl Serialize for ApiKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("[REDACTED]")
    }
}

impl<'de> Deserialize<'de> for ApiKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(|s| ApiKey(SecretString::from(s)))
    }
}

impl From<String> for ApiKey {
    fn from(s: String) -> Self {
        ApiKey(SecretString::from(s))
    }
}

impl From<&str> for ApiKey {
    fn from(s: &str) -> Self {
        ApiKey(SecretString::from(s))
    }
}

/// How a provider's API key was resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum KeySource {
    /// Key was a literal string in config (no ${} references)
    Literal,
    /// Key contained ${VAR} references expanded from environment
    EnvExpanded,
    /// Key was auto-discovered from convention env var (holds var name)
    Convention(String),
}

impl std::fmt::Display for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeySource::Literal => write!(f, "config-literal"),
            KeySource::EnvExpanded => write!(f, "env-expanded"),
            KeySource::Convention(var) => write!(f, "convention ({})", var),
        }
    }
}

/// Connection settings shared by all provider adapters of one family.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Credential presented to the provider
    pub api_key: ApiKey,
    /// Base endpoint (e.g., "https://api.openai.com")
    pub base_url: String,
    /// Per-request transport timeout in seconds
    pub timeout_secs: f64,
    /// Retry budget for transient errors inside the adapter
    pub max_retries: u32,
    /// Exponential backoff base: delay = backoff_factor * 2^attempt
    pub backoff_factor: f64,
}

impl ProviderConfig {
    pub fn new(api_key: impl Into<ApiKey>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            timeout_secs: 30.0,
            max_retries: 3,
            backoff_factor: 0.5,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.expose_secret().is_empty() {
            return Err(ConfigError::Validation("api_key must be provided".into()));
        }
        if self.base_url.is_empty() {
            return Err(ConfigError::Validation("base_url must be provided".into()));
        }
        if self.timeout_secs <= 0.0 {
            return Err(ConfigError::Validation(
                "timeout must be greater than zero".into(),
            ));
        }
        if self.backoff_factor <= 0.0 {
            return Err(ConfigError::Validation(
                "backoff_factor must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Routing behavior configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RouterConfig {
    #[serde(default)]
    pub default_strategy: StrategyKind,
    #[serde(default = "default_true")]
    pub enable_analytics: bool,
    #[serde(default)]
    pub enable_cache: bool,
    #[serde(default)]
    pub fallback_models: Vec<String>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_true() -> bool {
    true
}

fn default_max_retries() -> u32 {
    3
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            default_strategy: StrategyKind::Balanced,
            enable_analytics: true,
            enable_cache: false,
            fallback_models: Vec::new(),
            max_retries: default_max_retries(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl RouterConfig {
    /// Load routing settings from `MODELMUX_*` environment variables,
    /// falling back to defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|name| std::env::var(name).ok())
    }

    /// Closure-injected variant of [`Self::from_env`], testable without
    /// touching global env state.
    pub fn from_env_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let default_strategy = match lookup("MODELMUX_DEFAULT_STRATEGY") {
            Some(raw) => StrategyKind::from_str(&raw).map_err(|_| {
                ConfigError::Validation(format!(
                    "MODELMUX_DEFAULT_STRATEGY must be one of {:?}, got '{}'",
                    StrategyKind::allowed_names(),
                    raw
                ))
            })?,
            None => defaults.default_strategy,
        };

        let fallback_models = match lookup("MODELMUX_FALLBACK_MODELS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            None => defaults.fallback_models,
        };

        let config = Self {
            default_strategy,
            enable_analytics: parse_bool(
                lookup("MODELMUX_ENABLE_ANALYTICS").as_deref(),
                defaults.enable_analytics,
            ),
            enable_cache: parse_bool(
                lookup("MODELMUX_ENABLE_CACHE").as_deref(),
                defaults.enable_cache,
            ),
            fallback_models,
            max_retries: parse_int(
                lookup("MODELMUX_MAX_RETRIES").as_deref(),
                defaults.max_retries,
                "MODELMUX_MAX_RETRIES",
            )?,
            timeout_seconds: parse_int(
                lookup("MODELMUX_TIMEOUT_SECONDS").as_deref(),
                defaults.timeout_seconds,
                "MODELMUX_TIMEOUT_SECONDS",
            )?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_seconds == 0 {
            return Err(ConfigError::Validation(
                "timeout_seconds must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

fn parse_bool(value: Option<&str>, default: bool) -> bool {
    match value {
        Some(raw) => match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        None => default,
    }
}

fn parse_int<T: FromStr>(
    value: Option<&str>,
    default: T,
    var: &str,
) -> Result<T, ConfigError> {
    match value {
        Some(raw) => raw.trim().parse().map_err(|_| {
            ConfigError::Validation(format!("{var} must be an integer, got '{raw}'"))
        }),
        None => Ok(default),
    }
}

/// Raw provider section deserialized directly from TOML.
/// `api_key` may contain `${VAR}` references not yet expanded, or be absent
/// entirely (convention lookup applies).
#[derive(Debug, Deserialize)]
struct RawProviderConfig {
    api_key: Option<String>,
    base_url: String,
    #[serde(default = "default_provider_timeout")]
    timeout_secs: f64,
    #[serde(default = "default_max_retries")]
    max_retries: u32,
    #[serde(default = "default_backoff_factor")]
    backoff_factor: f64,
}

fn default_provider_timeout() -> f64 {
    30.0
}

fn default_backoff_factor() -> f64 {
    0.5
}

/// Raw `[[models]]` catalog entry.
#[derive(Debug, Deserialize)]
struct RawModelEntry {
    provider: ProviderKind,
    name: String,
    pricing: f64,
    #[serde(default)]
    capabilities: Vec<String>,
}

/// Raw configuration deserialized directly from TOML.
#[derive(Debug, Deserialize)]
struct RawAppConfig {
    #[serde(default)]
    router: Option<RouterConfig>,
    #[serde(default)]
    providers: BTreeMap<String, RawProviderConfig>,
    #[serde(default)]
    models: Vec<RawModelEntry>,
}

/// Fully resolved application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub router: RouterConfig,
    pub providers: HashMap<ProviderKind, ProviderConfig>,
    pub models: Vec<ModelConfig>,
}

impl AppConfig {
    /// Load configuration from a TOML file with environment variable expansion.
    pub fn from_file(
        path: impl AsRef<Path>,
    ) -> Result<(Self, Vec<(ProviderKind, KeySource)>), ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            source: e,
        })?;
        Self::parse_str(&content)
    }

    /// Parse configuration from a TOML string, expanding `${VAR}` references
    /// against the real environment.
    pub fn parse_str(
        content: &str,
    ) -> Result<(Self, Vec<(ProviderKind, KeySource)>), ConfigError> {
        Self::parse_str_with(content, |name| std::env::var(name).ok())
    }

    /// Parse with a custom env lookup, for tests.
    pub fn parse_str_with<F>(
        content: &str,
        lookup: F,
    ) -> Result<(Self, Vec<(ProviderKind, KeySource)>), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw: RawAppConfig = toml::from_str(content)?;

        let mut providers = HashMap::with_capacity(raw.providers.len());
        let mut key_sources = Vec::with_capacity(raw.providers.len());

        for (section, rp) in raw.providers {
            let kind = ProviderKind::from_str(&section).map_err(|_| {
                ConfigError::Validation(format!(
                    "unknown provider section '[providers.{section}]'"
                ))
            })?;

            let (api_key, source) = match rp.api_key {
                Some(ref raw_key) if raw_key.contains("${") => {
                    let expanded = expand_env_vars_with(raw_key, &section, &lookup)?;
                    (ApiKey::from(expanded), KeySource::EnvExpanded)
                }
                Some(ref raw_key) => (ApiKey::from(raw_key.as_str()), KeySource::Literal),
                None => {
                    let var_name = convention_env_var_name(kind);
                    match lookup(&var_name) {
                        Some(value) => {
                            (ApiKey::from(value), KeySource::Convention(var_name))
                        }
                        None => {
                            return Err(ConfigError::EnvVar {
                                var: var_name.clone(),
                                provider: section,
                                message: format!(
                                    "no api_key in config and convention variable \
                                     '{var_name}' is not set"
                                ),
                            })
                        }
                    }
                }
            };

            let config = ProviderConfig {
                api_key,
                base_url: rp.base_url,
                timeout_secs: rp.timeout_secs,
                max_retries: rp.max_retries,
                backoff_factor: rp.backoff_factor,
            };
            config.validate()?;

            key_sources.push((kind, source));
            providers.insert(kind, config);
        }

        let mut models = Vec::with_capacity(raw.models.len());
        for entry in raw.models {
            let model = ModelConfig::new(
                entry.provider,
                entry.name.clone(),
                entry.pricing,
                entry.capabilities,
            )
            .map_err(|e| {
                ConfigError::Validation(format!("model '{}': {e}", entry.name))
            })?;
            models.push(model);
        }

        let router = raw.router.unwrap_or_default();
        router.validate()?;

        let config = AppConfig {
            router,
            providers,
            models,
        };
        config.validate()?;

        Ok((config, key_sources))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.providers.is_empty() {
            return Err(ConfigError::Validation(
                "at least one [providers.*] section must be configured".into(),
            ));
        }
        if self.models.is_empty() {
            return Err(ConfigError::Validation(
                "at least one [[models]] entry must be configured".into(),
            ));
        }
        for model in &self.models {
            if model.provider() != ProviderKind::Custom
                && !self.providers.contains_key(&model.provider())
            {
                tracing::warn!(
                    model = %model.model_name(),
                    provider = %model.provider(),
                    "Catalog model has no configured provider credentials"
                );
            }
        }
        Ok(())
    }
}

/// Expand all `${VAR}` references in a string using a custom lookup function.
///
/// Supports multiple `${VAR}` in one string. Fails on the first missing
/// variable, unclosed `${`, or empty variable name.
fn expand_env_vars_with<F>(
    input: &str,
    provider_name: &str,
    lookup: F,
) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if !input.contains("${") {
        return Ok(input.to_string());
    }

    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let end = after.find('}').ok_or_else(|| ConfigError::EnvVar {
            var: "<unclosed>".to_string(),
            provider: provider_name.to_string(),
            message: format!("Unclosed '${{' in config value: {}", input),
        })?;

        let var_name = &after[..end];
        if var_name.is_empty() {
            return Err(ConfigError::EnvVar {
                var: "".to_string(),
                provider: provider_name.to_string(),
                message: "Empty variable name in '${}' reference".to_string(),
            });
        }

        let value = lookup(var_name).ok_or_else(|| ConfigError::EnvVar {
            var: var_name.to_string(),
            provider: provider_name.to_string(),
            message: format!(
                "Environment variable '{}' is not set (referenced in provider '{}')",
                var_name, provider_name
            ),
        })?;

        result.push_str(&value);
        rest = &after[end + 1..];
    }

    result.push_str(rest);
    Ok(result)
}

/// Derive the convention-based env var name for a provider family.
///
/// "openai" -> "MODELMUX_OPENAI_API_KEY", "anthropic" -> "MODELMUX_ANTHROPIC_API_KEY".
pub fn convention_env_var_name(kind: ProviderKind) -> String {
    format!("MODELMUX_{}_API_KEY", kind.as_str().to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL_TOML: &str = r#"
        [providers.openai]
        api_key = "sk-test-123"
        base_url = "https://api.openai.com"

        [[models]]
        provider = "openai"
        name = "gpt-4"
        pricing = 0.06
        capabilities = ["chat", "reasoning", "code"]
    "#;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn parse_minimal_config() {
        let (config, sources) = AppConfig::parse_str_with(MINIMAL_TOML, no_env).unwrap();
        assert_eq!(config.providers.len(), 1);
        assert_eq!(config.models.len(), 1);
        assert_eq!(config.models[0].model_name(), "gpt-4");
        assert_eq!(config.router.default_strategy, StrategyKind::Balanced);
        assert_eq!(sources, vec![(ProviderKind::OpenAi, KeySource::Literal)]);
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
            [router]
            default_strategy = "cost_optimized"
            enable_analytics = false
            enable_cache = true
            fallback_models = ["gpt-3.5-turbo", "claude-3-haiku"]
            max_retries = 2
            timeout_seconds = 10

            [providers.openai]
            api_key = "sk-a"
            base_url = "https://api.openai.com"
            timeout_secs = 15.0
            max_retries = 1
            backoff_factor = 0.25

            [providers.anthropic]
            api_key = "sk-b"
            base_url = "https://api.anthropic.com"

            [[models]]
            provider = "openai"
            name = "gpt-4"
            pricing = 0.06
            capabilities = ["chat", "reasoning"]

            [[models]]
            provider = "anthropic"
            name = "claude-3-opus"
            pricing = 0.015
            capabilities = ["chat", "reasoning", "code"]
        "#;

        let (config, _) = AppConfig::parse_str_with(toml, no_env).unwrap();
        assert_eq!(config.router.default_strategy, StrategyKind::CostOptimized);
        assert!(!config.router.enable_analytics);
        assert!(config.router.enable_cache);
        assert_eq!(config.router.fallback_models.len(), 2);
        assert_eq!(config.router.max_retries, 2);

        let openai = &config.providers[&ProviderKind::OpenAi];
        assert_eq!(openai.timeout_secs, 15.0);
        assert_eq!(openai.max_retries, 1);
        assert_eq!(openai.backoff_factor, 0.25);

        let anthropic = &config.providers[&ProviderKind::Anthropic];
        assert_eq!(anthropic.timeout_secs, 30.0);
        assert_eq!(config.models.len(), 2);
    }

    #[test]
    fn config_without_providers_fails() {
        let toml = r#"
            [[models]]
            provider = "openai"
            name = "gpt-4"
            pricing = 0.06
        "#;
        let result = AppConfig::parse_str_with(toml, no_env);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn config_without_models_fails() {
        let toml = r#"
            [providers.openai]
            api_key = "sk-a"
            base_url = "https://api.openai.com"
        "#;
        let result = AppConfig::parse_str_with(toml, no_env);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn unknown_provider_section_fails() {
        let toml = r#"
            [providers.acme]
            api_key = "k"
            base_url = "https://acme.example.com"

            [[models]]
            provider = "openai"
            name = "gpt-4"
            pricing = 0.06
        "#;
        let result = AppConfig::parse_str_with(toml, no_env);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn non_positive_pricing_fails() {
        let toml = r#"
            [providers.openai]
            api_key = "k"
            base_url = "https://api.openai.com"

            [[models]]
            provider = "openai"
            name = "gpt-4"
            pricing = 0.0
        "#;
        let result = AppConfig::parse_str_with(toml, no_env);
        assert!(result.is_err());
    }

    #[test]
    fn env_expanded_key() {
        let toml = r#"
            [providers.openai]
            api_key = "${OPENAI_KEY}"
            base_url = "https://api.openai.com"

            [[models]]
            provider = "openai"
            name = "gpt-4"
            pricing = 0.06
        "#;
        let lookup = |name: &str| match name {
            "OPENAI_KEY" => Some("sk-from-env".to_string()),
            _ => None,
        };
        let (config, sources) = AppConfig::parse_str_with(toml, lookup).unwrap();
        assert_eq!(
            config.providers[&ProviderKind::OpenAi]
                .api_key
                .expose_secret(),
            "sk-from-env"
        );
        assert_eq!(sources[0].1, KeySource::EnvExpanded);
    }

    #[test]
    fn missing_env_var_fails_with_names() {
        let toml = r#"
            [providers.openai]
            api_key = "${DEFINITELY_MISSING_KEY}"
            base_url = "https://api.openai.com"

            [[models]]
            provider = "openai"
            name = "gpt-4"
            pricing = 0.06
        "#;
        let err = AppConfig::parse_str_with(toml, no_env).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("DEFINITELY_MISSING_KEY"));
        assert!(text.contains("openai"));
    }

    #[test]
    fn convention_key_lookup() {
        let toml = r#"
            [providers.anthropic]
            base_url = "https://api.anthropic.com"

            [[models]]
            provider = "anthropic"
            name = "claude-3-opus"
            pricing = 0.015
        "#;
        let lookup = |name: &str| match name {
            "MODELMUX_ANTHROPIC_API_KEY" => Some("sk-conv".to_string()),
            _ => None,
        };
        let (config, sources) = AppConfig::parse_str_with(toml, lookup).unwrap();
        assert_eq!(
            config.providers[&ProviderKind::Anthropic]
                .api_key
                .expose_secret(),
            "sk-conv"
        );
        assert_eq!(
            sources[0].1,
            KeySource::Convention("MODELMUX_ANTHROPIC_API_KEY".to_string())
        );
    }

    #[test]
    fn missing_key_without_convention_fails() {
        let toml = r#"
            [providers.google]
            base_url = "https://generativelanguage.googleapis.com"

            [[models]]
            provider = "google"
            name = "gemini-1.5-pro"
            pricing = 0.01
        "#;
        let err = AppConfig::parse_str_with(toml, no_env).unwrap_err();
        assert!(err.to_string().contains("MODELMUX_GOOGLE_API_KEY"));
    }

    // Expansion tests drive the lookup closure, never global env state.

    #[test]
    fn expand_single_var() {
        let lookup = |name: &str| match name {
            "MY_KEY" => Some("sk-abcd".to_string()),
            _ => None,
        };
        let result = expand_env_vars_with("${MY_KEY}", "test", lookup).unwrap();
        assert_eq!(result, "sk-abcd");
    }

    #[test]
    fn expand_multiple_vars() {
        let lookup = |name: &str| match name {
            "SCHEME" => Some("https".to_string()),
            "HOST" => Some("example.com".to_string()),
            _ => None,
        };
        let result = expand_env_vars_with("${SCHEME}://${HOST}/v1", "test", lookup).unwrap();
        assert_eq!(result, "https://example.com/v1");
    }

    #[test]
    fn expand_no_vars_passthrough() {
        let lookup = |_: &str| -> Option<String> { panic!("should not be called") };
        let result = expand_env_vars_with("literal-value", "test", lookup).unwrap();
        assert_eq!(result, "literal-value");
    }

    #[test]
    fn expand_unclosed_brace_fails() {
        let lookup = |_: &str| -> Option<String> { panic!("should not be called") };
        let err = expand_env_vars_with("${UNCLOSED", "test", lookup).unwrap_err();
        assert!(err.to_string().to_lowercase().contains("unclosed"));
    }

    #[test]
    fn expand_empty_var_name_fails() {
        let lookup = |_: &str| -> Option<String> { panic!("should not be called") };
        let err = expand_env_vars_with("${}", "test", lookup).unwrap_err();
        assert!(err.to_string().to_lowercase().contains("empty"));
    }

    #[test]
    fn expand_dollar_without_brace_passthrough() {
        let lookup = |_: &str| -> Option<String> { panic!("should not be called") };
        let result = expand_env_vars_with("$NOT_A_VAR", "test", lookup).unwrap();
        assert_eq!(result, "$NOT_A_VAR");
    }

    // ApiKey redaction

    #[test]
    fn api_key_debug_and_display_redaction() {
        let key = ApiKey::from("super-secret-token");
        assert_eq!(format!("{:?}", key), "[REDACTED]");
        assert_eq!(format!("{}", key), "[REDACTED]");
    }

    #[test]
    fn api_key_serialize_redaction() {
        let key = ApiKey::from("real-secret-value");
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"[REDACTED]\"");
    }

    #[test]
    fn provider_config_debug_redaction() {
        let config = ProviderConfig::new("sk-very-secret", "https://api.openai.com");
        let debug = format!("{:?}", config);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("sk-very-secret"));
    }

    // RouterConfig env loading

    #[test]
    fn router_config_defaults() {
        let config = RouterConfig::from_env_with(|_| None).unwrap();
        assert_eq!(config.default_strategy, StrategyKind::Balanced);
        assert!(config.enable_analytics);
        assert!(!config.enable_cache);
        assert!(config.fallback_models.is_empty());
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.timeout_seconds, 30);
    }

    #[test]
    fn router_config_from_env_overrides() {
        let lookup = |name: &str| match name {
            "MODELMUX_DEFAULT_STRATEGY" => Some("latency_optimized".to_string()),
            "MODELMUX_ENABLE_ANALYTICS" => Some("off".to_string()),
            "MODELMUX_ENABLE_CACHE" => Some("yes".to_string()),
            "MODELMUX_FALLBACK_MODELS" => Some("gpt-3.5-turbo, claude-3-haiku,".to_string()),
            "MODELMUX_MAX_RETRIES" => Some("5".to_string()),
            "MODELMUX_TIMEOUT_SECONDS" => Some("60".to_string()),
            _ => None,
        };
        let config = RouterConfig::from_env_with(lookup).unwrap();
        assert_eq!(config.default_strategy, StrategyKind::LatencyOptimized);
        assert!(!config.enable_analytics);
        assert!(config.enable_cache);
        assert_eq!(
            config.fallback_models,
            vec!["gpt-3.5-turbo".to_string(), "claude-3-haiku".to_string()]
        );
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.timeout_seconds, 60);
    }

    #[test]
    fn router_config_rejects_bad_strategy() {
        let lookup = |name: &str| match name {
            "MODELMUX_DEFAULT_STRATEGY" => Some("fastest".to_string()),
            _ => None,
        };
        assert!(RouterConfig::from_env_with(lookup).is_err());
    }

    #[test]
    fn router_config_rejects_bad_integer() {
        let lookup = |name: &str| match name {
            "MODELMUX_MAX_RETRIES" => Some("many".to_string()),
            _ => None,
        };
        assert!(RouterConfig::from_env_with(lookup).is_err());
    }

    #[test]
    fn router_config_rejects_zero_timeout() {
        let lookup = |name: &str| match name {
            "MODELMUX_TIMEOUT_SECONDS" => Some("0".to_string()),
            _ => None,
        };
        assert!(RouterConfig::from_env_with(lookup).is_err());
    }

    #[test]
    fn unrecognized_bool_falls_back_to_default() {
        assert!(parse_bool(Some("maybe"), true));
        assert!(!parse_bool(Some("maybe"), false));
    }
}
