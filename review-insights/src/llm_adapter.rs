use crate::config::ExtractionConfig;
use crate::types::{AspectMention, Result, ReviewError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Aspects the extraction prompt suggests to the model
pub const CANDIDATE_ASPECTS: &[&str] = &[
    "food quality",
    "service",
    "ambiance",
    "price",
    "cleanliness",
    "location",
    "wait time",
    "portion size",
];

/// Trait for language-model adapters that pull aspects out of a review
#[async_trait]
pub trait AspectExtractor: Send + Sync {
    /// Get the name of this adapter
    fn adapter_name(&self) -> String;

    /// Extract aspect mentions from a single cleaned review
    async fn extract(&self, text: &str) -> Result<Vec<AspectMention>>;
}

/// Prompt sent to the model for one review
pub fn build_prompt(review_text: &str) -> String {
    format!(
        "Analyze this review and extract mentioned aspects with their sentiment.\n\
         Return JSON only, no markdown:\n\
         {{\"aspects\": [{{\"name\": \"food quality\", \"sentiment\": \"positive\", \"quote\": \"exact phrase\"}}]}}\n\n\
         Possible aspects: {}\n\n\
         Review: {}",
        CANDIDATE_ASPECTS.join(", "),
        review_text
    )
}

/// Parse the model's answer into aspect mentions.
///
/// A surrounding Markdown code fence is stripped first. Only invalid JSON is
/// an error; a missing or non-list `aspects` field yields no mentions, and list
/// entries that are not objects are skipped.
pub fn parse_aspect_response(raw: &str) -> Result<Vec<AspectMention>> {
    let body = strip_code_fence(raw.trim());
    let value: serde_json::Value = serde_json::from_str(&body)?;

    let entries = match value.get("aspects").and_then(|aspects| aspects.as_array()) {
        Some(entries) => entries,
        None => return Ok(Vec::new()),
    };

    Ok(entries
        .iter()
        .filter(|entry| entry.is_object())
        .filter_map(|entry| serde_json::from_value::<AspectMention>(entry.clone()).ok())
        .collect())
}

/// Keep only the lines between code fences when the text starts with one
fn strip_code_fence(text: &str) -> String {
    if !text.starts_with("```") {
        return text.to_string();
    }

    let mut inside = false;
    let mut lines = Vec::new();
    for line in text.lines() {
        if line.trim().starts_with("```") {
            inside = !inside;
            continue;
        }
        if inside {
            lines.push(line);
        }
    }

    lines.join("\n")
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    text: Option<String>,
}

/// Aspect extractor backed by the Gemini `generateContent` API
pub struct GeminiExtractor {
    client: Client,
    api_key: String,
    config: ExtractionConfig,
}

impl GeminiExtractor {
    pub fn new(api_key: impl Into<String>, config: ExtractionConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            config,
        })
    }

    fn request_url(&self) -> Result<Url> {
        let base = format!(
            "{}/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        );
        Url::parse_with_params(&base, &[("key", self.api_key.as_str())])
            .map_err(|e| ReviewError::Config(format!("invalid Gemini endpoint {}: {}", base, e)))
    }
}

#[async_trait]
impl AspectExtractor for GeminiExtractor {
    fn adapter_name(&self) -> String {
        format!("gemini ({})", self.config.model)
    }

    async fn extract(&self, text: &str) -> Result<Vec<AspectMention>> {
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": build_prompt(text) }] }]
        });

        let response = self.client.post(self.request_url()?).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ReviewError::Model {
                adapter: self.adapter_name(),
                message: format!("HTTP {}: {}", status, detail),
            });
        }

        let payload: GenerateContentResponse = response.json().await?;
        let answer: String = payload
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
            .unwrap_or_default();

        if answer.trim().is_empty() {
            return Err(ReviewError::Model {
                adapter: self.adapter_name(),
                message: "empty response".to_string(),
            });
        }

        debug!("Gemini answered with {} bytes", answer.len());
        parse_aspect_response(&answer)
    }
}

const MOCK_VOCABULARY: &[(&str, &str)] = &[
    ("food", "food quality"),
    ("meal", "food quality"),
    ("service", "service"),
    ("staff", "service"),
    ("waiter", "service"),
    ("price", "price"),
    ("expensive", "price"),
    ("cheap", "price"),
    ("atmosphere", "ambiance"),
    ("music", "ambiance"),
    ("clean", "cleanliness"),
    ("dirty", "cleanliness"),
    ("wait", "wait time"),
    ("portion", "portion size"),
];

const MOCK_POSITIVE: &[&str] = &["great", "good", "excellent", "delicious", "friendly", "amazing", "clean", "cheap"];
const MOCK_NEGATIVE: &[&str] = &["bad", "terrible", "slow", "rude", "cold", "dirty", "expensive", "awful"];

/// Mock extractor for development and testing.
///
/// Splits a review into clauses and reports an aspect for every clause that
/// contains a vocabulary keyword; the clause itself becomes the quote. Canned
/// raw responses can be registered per text to exercise response parsing, and
/// a number of leading calls can be made to fail to exercise retries.
#[derive(Debug, Default)]
pub struct MockAspectExtractor {
    canned: HashMap<String, String>,
    failures_remaining: AtomicU32,
    calls: AtomicU32,
}

impl MockAspectExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `text` with `raw_response` as if the model had returned it
    pub fn with_canned_response(mut self, text: &str, raw_response: &str) -> Self {
        self.canned.insert(text.to_string(), raw_response.to_string());
        self
    }

    /// Fail the next `count` calls before answering normally
    pub fn failing_first(self, count: u32) -> Self {
        self.failures_remaining.store(count, Ordering::SeqCst);
        self
    }

    /// Number of `extract` calls made so far, failed ones included
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn spot_aspects(text: &str) -> Vec<AspectMention> {
        let mut mentions: Vec<AspectMention> = Vec::new();

        for clause in text.split(|c| matches!(c, '.' | '!' | '?' | ',' | ';')) {
            let clause = clause.trim();
            let lowered = clause.to_lowercase();
            let words: Vec<&str> = lowered
                .split(|c: char| !c.is_alphanumeric())
                .filter(|w| !w.is_empty())
                .collect();

            let Some((_, aspect)) = MOCK_VOCABULARY
                .iter()
                .find(|(keyword, _)| words.iter().any(|w| w.starts_with(keyword)))
            else {
                continue;
            };

            if mentions.iter().any(|m| m.name.as_deref() == Some(*aspect)) {
                continue;
            }

            let positive = words.iter().filter(|w| MOCK_POSITIVE.contains(w)).count();
            let negative = words.iter().filter(|w| MOCK_NEGATIVE.contains(w)).count();
            let sentiment = match positive.cmp(&negative) {
                std::cmp::Ordering::Greater => "positive",
                std::cmp::Ordering::Less => "negative",
                std::cmp::Ordering::Equal => "neutral",
            };

            mentions.push(AspectMention::new(aspect, sentiment, clause));
        }

        mentions
    }
}

#[async_trait]
impl AspectExtractor for MockAspectExtractor {
    fn adapter_name(&self) -> String {
        "mock extractor".to_string()
    }

    async fn extract(&self, text: &str) -> Result<Vec<AspectMention>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let should_fail = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(ReviewError::Model {
                adapter: self.adapter_name(),
                message: "simulated outage".to_string(),
            });
        }

        if let Some(raw) = self.canned.get(text) {
            return parse_aspect_response(raw);
        }

        Ok(Self::spot_aspects(text))
    }
}
