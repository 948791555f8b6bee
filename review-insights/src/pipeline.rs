use crate::aggregator::aggregate;
use crate::cache::{fingerprint, ResultCache};
use crate::config::{AnalyzerConfig, RetryConfig};
use crate::language::{LanguageClassifier, WhatlangClassifier};
use crate::llm_adapter::{AspectExtractor, GeminiExtractor};
use crate::processing::{preprocess, PreprocessReport};
use crate::ranking::top_quotes;
use crate::retry::retry_with_backoff;
use crate::sentiment::{ensure_aligned, HuggingFaceClassifier, SentimentClassifier};
use crate::types::{AspectSummary, Quote, Result, Review, ReviewError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Everything produced for one dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub reviews: Vec<Review>,
    /// `None` when aspect extraction did not run
    pub aspect_summaries: Option<Vec<AspectSummary>>,
    pub report: PreprocessReport,
}

impl AnalysisResult {
    pub fn aspects_extracted(&self) -> bool {
        self.aspect_summaries.is_some()
    }

    pub fn top_quotes(&self, aspect_name: &str, n: usize) -> Vec<Quote> {
        top_quotes(&self.reviews, aspect_name, n)
    }
}

/// Label every review's sentiment, one batch at a time.
///
/// A batch that still fails after retries leaves its reviews unscored.
pub async fn annotate_sentiment(
    reviews: &mut [Review],
    classifier: &dyn SentimentClassifier,
    batch_size: usize,
    retry: &RetryConfig,
) {
    let batch_size = batch_size.max(1);

    for (batch_index, batch) in reviews.chunks_mut(batch_size).enumerate() {
        let texts: Vec<String> = batch.iter().map(|r| r.cleaned_text.clone()).collect();
        let texts = texts.as_slice();

        let outcome = retry_with_backoff(retry, "sentiment classification", || async move {
            let predictions = classifier.classify_batch(texts, batch_size).await?;
            ensure_aligned(&classifier.classifier_name(), texts.len(), predictions.len())?;
            Ok::<_, ReviewError>(predictions)
        })
        .await;

        match outcome {
            Ok(predictions) => {
                for (review, prediction) in batch.iter_mut().zip(predictions) {
                    review.sentiment = Some(prediction.label);
                    review.sentiment_confidence = Some(prediction.score);
                }
            }
            Err(e) => {
                warn!("Sentiment batch {} left unscored: {}", batch_index, e);
            }
        }
    }
}

/// Extract aspects for every review, sequentially.
///
/// Without an extractor every review gets an empty aspect list. A review whose
/// extraction still fails after retries also gets an empty list. `on_progress`
/// is called with (done, total) after each review.
pub async fn annotate_aspects<F>(
    reviews: &mut [Review],
    extractor: Option<&dyn AspectExtractor>,
    retry: &RetryConfig,
    request_spacing: Duration,
    mut on_progress: F,
) where
    F: FnMut(usize, usize),
{
    let Some(extractor) = extractor else {
        for review in reviews.iter_mut() {
            review.aspects.clear();
        }
        return;
    };

    let total = reviews.len();
    for (index, review) in reviews.iter_mut().enumerate() {
        if index > 0 && !request_spacing.is_zero() {
            tokio::time::sleep(request_spacing).await;
        }

        let text = review.cleaned_text.as_str();
        review.aspects = match retry_with_backoff(retry, "aspect extraction", || extractor.extract(text)).await {
            Ok(aspects) => aspects,
            Err(e) => {
                warn!("Error extracting aspects for review {}: {}", review.source_row, e);
                Vec::new()
            }
        };

        on_progress(index + 1, total);
    }
}

/// Runs the whole analysis: preprocessing, sentiment, aspects, aggregation
pub struct ReviewAnalyzer {
    config: AnalyzerConfig,
    language: Box<dyn LanguageClassifier>,
    sentiment: Box<dyn SentimentClassifier>,
    extractor: Option<Box<dyn AspectExtractor>>,
    cache: ResultCache<AnalysisResult>,
}

impl ReviewAnalyzer {
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::new()
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn cache(&self) -> &ResultCache<AnalysisResult> {
        &self.cache
    }

    pub fn extraction_enabled(&self) -> bool {
        self.extractor.is_some()
    }

    pub async fn analyze(&mut self, reviews: Vec<Review>) -> Result<Arc<AnalysisResult>> {
        self.analyze_with_progress(reviews, |_, _| {}).await
    }

    /// Analyze a loaded dataset, reusing the cached result for identical input and options
    pub async fn analyze_with_progress<F>(&mut self, reviews: Vec<Review>, on_progress: F) -> Result<Arc<AnalysisResult>>
    where
        F: FnMut(usize, usize),
    {
        self.config.validate()?;

        let key = fingerprint(&reviews, &self.config.preprocess, self.extraction_enabled());
        if let Some(cached) = self.cache.get(&key) {
            info!("Reusing cached analysis for {} reviews", reviews.len());
            return Ok(cached);
        }

        let result = self.run(reviews, on_progress).await;
        Ok(self.cache.insert(key, result))
    }

    /// Drop cached results so the next call recomputes
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    async fn run<F>(&self, reviews: Vec<Review>, on_progress: F) -> AnalysisResult
    where
        F: FnMut(usize, usize),
    {
        info!("Step 1/3: Preprocessing {} reviews", reviews.len());
        let preprocessed = preprocess(reviews, &self.config.preprocess, self.language.as_ref());
        let mut reviews = preprocessed.reviews;

        if reviews.is_empty() {
            warn!("No reviews remaining after preprocessing");
        }

        info!("Step 2/3: Analyzing sentiment for {} reviews", reviews.len());
        annotate_sentiment(
            &mut reviews,
            self.sentiment.as_ref(),
            self.config.sentiment.batch_size,
            &self.config.sentiment.retry,
        )
        .await;

        let extractor = self.extractor.as_deref();
        match extractor {
            Some(extractor) => info!("Step 3/3: Extracting aspects with {}", extractor.adapter_name()),
            None => warn!("No API key provided. Skipping aspect extraction."),
        }
        annotate_aspects(
            &mut reviews,
            extractor,
            &self.config.extraction.retry,
            Duration::from_millis(self.config.extraction.request_spacing_ms),
            on_progress,
        )
        .await;

        let aspect_summaries = extractor.map(|_| aggregate(&reviews));
        if let Some(summaries) = &aspect_summaries {
            debug!("Found {} distinct aspects", summaries.len());
        }

        info!("Processed {} reviews successfully", reviews.len());
        AnalysisResult {
            reviews,
            aspect_summaries,
            report: preprocessed.report,
        }
    }
}

/// Builder for wiring the analyzer's collaborators
pub struct AnalyzerBuilder {
    config: AnalyzerConfig,
    language: Option<Box<dyn LanguageClassifier>>,
    sentiment: Option<Box<dyn SentimentClassifier>>,
    extractor: Option<Box<dyn AspectExtractor>>,
}

impl AnalyzerBuilder {
    pub fn new() -> Self {
        Self {
            config: AnalyzerConfig::default(),
            language: None,
            sentiment: None,
            extractor: None,
        }
    }

    pub fn config(mut self, config: AnalyzerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn language_classifier(mut self, classifier: Box<dyn LanguageClassifier>) -> Self {
        self.language = Some(classifier);
        self
    }

    pub fn sentiment_classifier(mut self, classifier: Box<dyn SentimentClassifier>) -> Self {
        self.sentiment = Some(classifier);
        self
    }

    /// Use this extractor regardless of whether an API key is configured
    pub fn aspect_extractor(mut self, extractor: Box<dyn AspectExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Fill any collaborator not set explicitly with its production adapter.
    /// The Gemini extractor is only created when an API key is configured.
    pub fn build(self) -> Result<ReviewAnalyzer> {
        self.config.validate()?;

        let language = self.language.unwrap_or_else(|| Box::new(WhatlangClassifier::new()));

        let sentiment = match self.sentiment {
            Some(sentiment) => sentiment,
            None => Box::new(HuggingFaceClassifier::new(self.config.sentiment.clone())?),
        };

        let extractor = match (self.extractor, self.config.extraction.api_key.as_deref()) {
            (Some(extractor), _) => Some(extractor),
            (None, Some(key)) if self.config.extraction.is_enabled() => {
                Some(Box::new(GeminiExtractor::new(key, self.config.extraction.clone())?) as Box<dyn AspectExtractor>)
            }
            (None, _) => None,
        };

        info!(
            "Analyzer ready: language={}, sentiment={}, aspects={}",
            language.classifier_name(),
            sentiment.classifier_name(),
            extractor.as_ref().map(|e| e.adapter_name()).unwrap_or_else(|| "disabled".to_string())
        );

        Ok(ReviewAnalyzer {
            config: self.config,
            language,
            sentiment,
            extractor,
            cache: ResultCache::new(),
        })
    }
}

impl Default for AnalyzerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
