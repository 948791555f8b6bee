use crate::config::SentimentConfig;
use crate::types::{Result, ReviewError, SentimentLabel, SentimentPrediction};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Trait for sentiment models that label review text
#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    /// Get the name of this classifier
    fn classifier_name(&self) -> String;

    /// Classify one batch. Implementations must return exactly one prediction per text, in order.
    async fn classify_chunk(&self, texts: &[String]) -> Result<Vec<SentimentPrediction>>;

    /// Classify any number of texts, `batch_size` at a time
    async fn classify_batch(&self, texts: &[String], batch_size: usize) -> Result<Vec<SentimentPrediction>> {
        let mut predictions = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(batch_size.max(1)) {
            let chunk_predictions = self.classify_chunk(chunk).await?;
            ensure_aligned(&self.classifier_name(), chunk.len(), chunk_predictions.len())?;
            predictions.extend(chunk_predictions);
        }

        Ok(predictions)
    }
}

pub(crate) fn ensure_aligned(adapter: &str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(ReviewError::Model {
            adapter: adapter.to_string(),
            message: format!("expected {} predictions, got {}", expected, actual),
        })
    }
}

/// Map raw model labels onto the crate's labels.
///
/// Upper-case labels are lowercased, and the positional `LABEL_n` names used by
/// three-class RoBERTa sentiment heads map to negative/neutral/positive.
pub fn normalize_label(raw: &str) -> SentimentLabel {
    match raw.trim() {
        "LABEL_0" => SentimentLabel::Negative,
        "LABEL_1" => SentimentLabel::Neutral,
        "LABEL_2" => SentimentLabel::Positive,
        other => SentimentLabel::parse(other),
    }
}

#[derive(Debug, Deserialize)]
struct ScoredLabel {
    label: String,
    score: f64,
}

/// The inference API answers with either one list of scored labels per input
/// or a single scored label per input, depending on the pipeline settings
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceOutput {
    AllScores(Vec<ScoredLabel>),
    Top(ScoredLabel),
}

impl InferenceOutput {
    fn best(self) -> Option<ScoredLabel> {
        match self {
            InferenceOutput::Top(label) => Some(label),
            InferenceOutput::AllScores(labels) => labels
                .into_iter()
                .max_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(std::cmp::Ordering::Equal)),
        }
    }
}

/// Sentiment classifier backed by a Hugging Face text-classification endpoint
pub struct HuggingFaceClassifier {
    client: Client,
    config: SentimentConfig,
}

impl HuggingFaceClassifier {
    pub fn new(config: SentimentConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl SentimentClassifier for HuggingFaceClassifier {
    fn classifier_name(&self) -> String {
        format!("huggingface ({})", self.config.endpoint)
    }

    async fn classify_chunk(&self, texts: &[String]) -> Result<Vec<SentimentPrediction>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Classifying {} texts via {}", texts.len(), self.config.endpoint);

        let mut request = self
            .client
            .post(&self.config.endpoint)
            .json(&serde_json::json!({ "inputs": texts }));

        if let Some(token) = &self.config.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReviewError::Model {
                adapter: self.classifier_name(),
                message: format!("HTTP {}: {}", status, body),
            });
        }

        let outputs: Vec<InferenceOutput> = response.json().await?;

        outputs
            .into_iter()
            .map(|output| {
                output
                    .best()
                    .map(|best| SentimentPrediction {
                        label: normalize_label(&best.label),
                        score: best.score,
                    })
                    .ok_or_else(|| ReviewError::Model {
                        adapter: self.classifier_name(),
                        message: "empty prediction".to_string(),
                    })
            })
            .collect()
    }
}

const POSITIVE_WORDS: &[&str] = &[
    "amazing", "best", "delicious", "excellent", "fantastic", "friendly", "good", "great", "love", "perfect",
];

const NEGATIVE_WORDS: &[&str] = &[
    "awful", "bad", "cold", "dirty", "horrible", "overpriced", "rude", "slow", "terrible", "worst",
];

/// Lexicon-based classifier for development and testing.
///
/// Counts positive and negative cue words; the larger side wins and a tie is
/// neutral. Exact texts can be pinned to a fixed prediction.
#[derive(Debug, Default, Clone)]
pub struct MockSentimentClassifier {
    pinned: HashMap<String, SentimentPrediction>,
    always_fail: bool,
}

impl MockSentimentClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prediction(mut self, text: &str, label: SentimentLabel, score: f64) -> Self {
        self.pinned.insert(text.to_string(), SentimentPrediction { label, score });
        self
    }

    /// A classifier whose every call fails
    pub fn failing() -> Self {
        Self {
            always_fail: true,
            ..Self::default()
        }
    }

    fn predict(&self, text: &str) -> SentimentPrediction {
        if let Some(prediction) = self.pinned.get(text) {
            return prediction.clone();
        }

        let lowered = text.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        let positive = words.iter().filter(|w| POSITIVE_WORDS.contains(w)).count();
        let negative = words.iter().filter(|w| NEGATIVE_WORDS.contains(w)).count();

        let label = match positive.cmp(&negative) {
            std::cmp::Ordering::Greater => SentimentLabel::Positive,
            std::cmp::Ordering::Less => SentimentLabel::Negative,
            std::cmp::Ordering::Equal => SentimentLabel::Neutral,
        };
        let margin = positive.abs_diff(negative) as f64;

        SentimentPrediction {
            label,
            score: (0.6 + 0.1 * margin).min(0.99),
        }
    }
}

#[async_trait]
impl SentimentClassifier for MockSentimentClassifier {
    fn classifier_name(&self) -> String {
        "mock sentiment".to_string()
    }

    async fn classify_chunk(&self, texts: &[String]) -> Result<Vec<SentimentPrediction>> {
        if self.always_fail {
            return Err(ReviewError::Model {
                adapter: self.classifier_name(),
                message: "mock failure".to_string(),
            });
        }

        Ok(texts.iter().map(|text| self.predict(text)).collect())
    }
}
