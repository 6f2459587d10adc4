//! Prompt complexity estimation for routing decisions.

use regex::Regex;

use super::clamp01;
use crate::error::{Error, Result};

/// Extracts a normalized feature score (0-1) from a prompt.
///
/// Extractors are pure functions of text; adding or removing extractors
/// changes the blend but not the estimator contract.
pub trait FeatureExtractor: Send + Sync {
    fn extract(&self, prompt: &str) -> f64;
}

/// Aggregates feature extractors into a single 0-1 complexity score.
pub struct ComplexityEstimator {
    features: Vec<Box<dyn FeatureExtractor>>,
}

impl ComplexityEstimator {
    /// Fails when given zero extractors: that is a wiring mistake, not a
    /// runtime condition.
    pub fn new(features: Vec<Box<dyn FeatureExtractor>>) -> Result<Self> {
        if features.is_empty() {
            return Err(Error::Validation(
                "at least one feature extractor must be provided".to_string(),
            ));
        }
        Ok(Self { features })
    }

    /// Average of clamped extractor scores. Empty or whitespace-only prompts
    /// score exactly 0.0.
    pub fn estimate(&self, prompt: &str) -> f64 {
        if prompt.trim().is_empty() {
            return 0.0;
        }
        let sum: f64 = self
            .features
            .iter()
            .map(|feature| clamp01(feature.extract(prompt)))
            .sum();
        clamp01(sum / self.features.len() as f64)
    }
}

/// Scores prompts higher as they grow longer relative to a target length.
pub struct LengthFeature {
    target_chars: usize,
}

impl LengthFeature {
    pub fn new(target_chars: usize) -> Self {
        Self {
            target_chars: target_chars.max(1),
        }
    }
}

impl Default for LengthFeature {
    fn default() -> Self {
        Self::new(300)
    }
}

impl FeatureExtractor for LengthFeature {
    fn extract(&self, prompt: &str) -> f64 {
        clamp01(prompt.chars().count() as f64 / self.target_chars as f64)
    }
}

/// Detects code-specific structures such as fenced blocks or syntax tokens.
pub struct CodeBlockFeature {
    fence: Regex,
}

const CODE_KEYWORDS: [&str; 8] = [
    "def ", "class ", "select ", "function", "public ", "{", ";", "</",
];

impl Default for CodeBlockFeature {
    fn default() -> Self {
        Self {
            fence: Regex::new(r"(?s)```.+?```").expect("valid fence pattern"),
        }
    }
}

impl FeatureExtractor for CodeBlockFeature {
    fn extract(&self, prompt: &str) -> f64 {
        if self.fence.is_match(prompt) {
            return 1.0;
        }
        let lowered = prompt.to_lowercase();
        let matches = CODE_KEYWORDS
            .iter()
            .filter(|keyword| lowered.contains(keyword.trim()))
            .count();
        clamp01(matches as f64 / CODE_KEYWORDS.len() as f64)
    }
}

/// Counts reasoning verbs/phrases that usually imply higher complexity.
#[derive(Default)]
pub struct ReasoningKeywordFeature;

const REASONING_KEYWORDS: [&str; 8] = [
    "reason",
    "explain",
    "derive",
    "analyze",
    "justify",
    "step-by-step",
    "compare",
    "evaluate",
];

impl FeatureExtractor for ReasoningKeywordFeature {
    fn extract(&self, prompt: &str) -> f64 {
        let lowered = prompt.to_lowercase();
        let matches = REASONING_KEYWORDS
            .iter()
            .filter(|keyword| lowered.contains(*keyword))
            .count();
        clamp01(matches as f64 / 2.0)
    }
}

/// Detects technical vocabulary spanning math, CS, and engineering domains.
#[derive(Default)]
pub struct TechnicalTermFeature;

const TECHNICAL_TERMS: [&str; 11] = [
    "tensor",
    "gradient",
    "database",
    "encryption",
    "neural",
    "api",
    "schema",
    "complexity",
    "algorithm",
    "probability",
    "latency",
];

impl FeatureExtractor for TechnicalTermFeature {
    fn extract(&self, prompt: &str) -> f64 {
        let lowered = prompt.to_lowercase();
        let matches = TECHNICAL_TERMS
            .iter()
            .filter(|term| lowered.contains(*term))
            .count();
        clamp01(matches as f64 / 3.0)
    }
}

/// Estimator wired with the built-in feature set.
pub fn default_complexity_estimator() -> ComplexityEstimator {
    ComplexityEstimator::new(vec![
        Box::new(LengthFeature::default()),
        Box::new(CodeBlockFeature::default()),
        Box::new(ReasoningKeywordFeature),
        Box::new(TechnicalTermFeature),
    ])
    .expect("built-in feature set is non-empty")
}
