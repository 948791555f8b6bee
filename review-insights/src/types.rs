use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Sentiment label attached to a review or an aspect mention.
///
/// Classifiers are expected to return one of the three canonical labels, but
/// anything else is kept verbatim (lowercased) instead of being discarded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
    Other(String),
}

impl SentimentLabel {
    pub fn parse(raw: &str) -> Self {
        let label = raw.trim().to_lowercase();
        match label.as_str() {
            "positive" => SentimentLabel::Positive,
            "negative" => SentimentLabel::Negative,
            "neutral" => SentimentLabel::Neutral,
            _ => SentimentLabel::Other(label),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Other(label) => label.as_str(),
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for SentimentLabel {
    fn from(raw: String) -> Self {
        SentimentLabel::parse(&raw)
    }
}

impl From<SentimentLabel> for String {
    fn from(label: SentimentLabel) -> Self {
        label.as_str().to_string()
    }
}

/// One occurrence of an aspect inside a single review, as returned by the
/// extractor. Every field is optional: a missing key or a value of the wrong
/// JSON type deserializes to `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AspectMention {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub sentiment: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub quote: Option<String>,
}

impl AspectMention {
    pub fn new(name: &str, sentiment: &str, quote: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            sentiment: Some(sentiment.to_string()),
            quote: Some(quote.to_string()),
        }
    }

    /// Aggregation key of this mention, `None` when the name is missing or blank
    pub fn key(&self) -> Option<String> {
        let key = aspect_key(self.name.as_deref().unwrap_or(""));
        if key.is_empty() {
            None
        } else {
            Some(key)
        }
    }
}

/// Normalized aspect identity: trimmed and lowercased
pub fn aspect_key(name: &str) -> String {
    name.trim().to_lowercase()
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        _ => None,
    })
}

/// A single customer review moving through the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// Position of the row in the loaded dataset, kept across removals
    pub source_row: usize,
    pub review_text: String,
    pub cleaned_text: String,
    pub rating: Option<f64>,
    pub date: Option<NaiveDateTime>,
    pub source: Option<String>,
    pub sentiment: Option<SentimentLabel>,
    pub sentiment_confidence: Option<f64>,
    pub aspects: Vec<AspectMention>,
}

impl Review {
    pub fn new(source_row: usize, review_text: impl Into<String>) -> Self {
        Self {
            source_row,
            review_text: review_text.into(),
            cleaned_text: String::new(),
            rating: None,
            date: None,
            source: None,
            sentiment: None,
            sentiment_confidence: None,
            aspects: Vec::new(),
        }
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn with_date(mut self, date: NaiveDateTime) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_cleaned_text(mut self, cleaned_text: impl Into<String>) -> Self {
        self.cleaned_text = cleaned_text.into();
        self
    }

    pub fn with_sentiment(mut self, label: SentimentLabel, confidence: f64) -> Self {
        self.sentiment = Some(label);
        self.sentiment_confidence = Some(confidence);
        self
    }

    pub fn with_aspects(mut self, aspects: Vec<AspectMention>) -> Self {
        self.aspects = aspects;
        self
    }
}

/// A quote retained by the aggregator for one aspect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AspectQuote {
    pub quote: String,
    pub sentiment: String,
}

/// Per-aspect summary statistics, one row per aggregation key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AspectSummary {
    pub name: String,
    pub count: usize,
    pub positive_count: usize,
    pub negative_count: usize,
    pub neutral_count: usize,
    /// Mentions whose sentiment was not one of the canonical labels, keyed by
    /// the literal lowercased label (missing sentiment counts under "")
    pub other_counts: BTreeMap<String, usize>,
    pub positive_ratio: f64,
    pub quotes: Vec<AspectQuote>,
}

/// Representative quote chosen by the ranker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub quote: String,
    pub sentiment: String,
    pub confidence: f64,
}

/// Sentiment classifier output for one text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentPrediction {
    pub label: SentimentLabel,
    pub score: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Error parsing CSV file: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing required columns: {}", .columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    #[error("CSV file is empty")]
    EmptyDataset,

    #[error("{0}")]
    NoValidReviews(String),

    #[error("Could not decode CSV file. Please ensure it's a valid CSV file.")]
    Decode,

    #[error("Language detection failed: {0}")]
    LanguageDetection(String),

    #[error("Model error from {adapter}: {message}")]
    Model { adapter: String, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("General error: {0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, ReviewError>;
