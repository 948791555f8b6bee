use crate::types::{ReviewError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

pub const DEFAULT_SENTIMENT_ENDPOINT: &str =
    "https://api-inference.huggingface.co/models/cardiffnlp/twitter-roberta-base-sentiment-latest";
pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Toggles for the preprocessing stages
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PreprocessOptions {
    pub remove_duplicates: bool,
    pub filter_english: bool,
    /// Similarity (0-100) at or above which two reviews are duplicates
    pub dedup_threshold: u8,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            remove_duplicates: true,
            filter_english: true,
            dedup_threshold: 85,
        }
    }
}

impl PreprocessOptions {
    pub fn validate(&self) -> Result<()> {
        if self.dedup_threshold > 100 {
            return Err(ReviewError::Config(format!(
                "dedup threshold must be within 0-100, got {}",
                self.dedup_threshold
            )));
        }
        Ok(())
    }
}

/// Retry schedule for calls to external models
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles after every failure
    pub initial_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1000,
        }
    }
}

impl RetryConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentConfig {
    pub endpoint: String,
    #[serde(skip_serializing)]
    pub api_token: Option<String>,
    pub batch_size: usize,
    pub timeout_seconds: u64,
    pub retry: RetryConfig,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_SENTIMENT_ENDPOINT.to_string(),
            api_token: None,
            batch_size: 32,
            timeout_seconds: 60,
            retry: RetryConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Aspect extraction only runs when a key is present
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub endpoint: String,
    pub model: String,
    pub timeout_seconds: u64,
    /// Pause between consecutive reviews to stay under rate limits
    pub request_spacing_ms: u64,
    pub retry: RetryConfig,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            timeout_seconds: 30,
            request_spacing_ms: 100,
            retry: RetryConfig::default(),
        }
    }
}

impl ExtractionConfig {
    pub fn is_enabled(&self) -> bool {
        self.api_key.as_deref().map_or(false, |key| !key.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    pub preprocess: PreprocessOptions,
    pub sentiment: SentimentConfig,
    pub extraction: ExtractionConfig,
}

impl AnalyzerConfig {
    /// Defaults overlaid with `GEMINI_API_KEY`, `GEMINI_MODEL`, `HF_API_TOKEN`
    /// and `SENTIMENT_ENDPOINT` when set
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(key) = env::var("GEMINI_API_KEY") {
            if !key.trim().is_empty() {
                config.extraction.api_key = Some(key);
            }
        }
        if let Ok(model) = env::var("GEMINI_MODEL") {
            config.extraction.model = model;
        }
        if let Ok(token) = env::var("HF_API_TOKEN") {
            if !token.trim().is_empty() {
                config.sentiment.api_token = Some(token);
            }
        }
        if let Ok(endpoint) = env::var("SENTIMENT_ENDPOINT") {
            config.sentiment.endpoint = endpoint;
        }

        config
    }

    pub fn validate(&self) -> Result<()> {
        self.preprocess.validate()?;
        if self.sentiment.batch_size == 0 {
            return Err(ReviewError::Config("sentiment batch size must be positive".to_string()));
        }
        Ok(())
    }
}
