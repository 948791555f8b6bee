use crate::types::{ReviewError, Result};
use tracing::debug;
use whatlang::Lang;

/// Texts shorter than this (after trimming) are never classified as English
pub const MIN_CLASSIFIABLE_CHARS: usize = 3;

pub const ENGLISH: &str = "en";

/// Language identification backend
pub trait LanguageClassifier: Send + Sync {
    fn classifier_name(&self) -> String;

    /// Predict the language of `text`, returning an ISO 639-1 code where one exists
    fn detect(&self, text: &str) -> Result<String>;
}

/// Decide whether a cleaned review is English.
///
/// Classifier failures count as English so that unstable predictions on short
/// text do not wipe out valid reviews.
pub fn is_english(text: &str, classifier: &dyn LanguageClassifier) -> bool {
    if text.trim().chars().count() < MIN_CLASSIFIABLE_CHARS {
        return false;
    }

    match classifier.detect(text) {
        Ok(lang) => lang == ENGLISH,
        Err(e) => {
            debug!("{} could not classify text, keeping it: {}", classifier.classifier_name(), e);
            true
        }
    }
}

/// Trigram-based detector backed by `whatlang`
#[derive(Debug, Default, Clone, Copy)]
pub struct WhatlangClassifier;

impl WhatlangClassifier {
    pub fn new() -> Self {
        Self
    }
}

impl LanguageClassifier for WhatlangClassifier {
    fn classifier_name(&self) -> String {
        "whatlang".to_string()
    }

    fn detect(&self, text: &str) -> Result<String> {
        let info = whatlang::detect(text)
            .ok_or_else(|| ReviewError::LanguageDetection("no language features in text".to_string()))?;

        Ok(match info.lang() {
            Lang::Eng => ENGLISH.to_string(),
            Lang::Spa => "es".to_string(),
            Lang::Fra => "fr".to_string(),
            Lang::Deu => "de".to_string(),
            Lang::Ita => "it".to_string(),
            Lang::Por => "pt".to_string(),
            Lang::Nld => "nl".to_string(),
            other => other.code().to_string(),
        })
    }
}

/// Deterministic classifier for tests and offline runs.
///
/// Texts containing one of the registered markers get that marker's language;
/// everything else is English. Texts containing a failure marker make
/// `detect` return an error.
#[derive(Debug, Default, Clone)]
pub struct MockLanguageClassifier {
    rules: Vec<(String, String)>,
    failure_markers: Vec<String>,
}

impl MockLanguageClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(mut self, marker: &str, language: &str) -> Self {
        self.rules.push((marker.to_lowercase(), language.to_string()));
        self
    }

    pub fn failing_on(mut self, marker: &str) -> Self {
        self.failure_markers.push(marker.to_lowercase());
        self
    }
}

impl LanguageClassifier for MockLanguageClassifier {
    fn classifier_name(&self) -> String {
        "mock".to_string()
    }

    fn detect(&self, text: &str) -> Result<String> {
        let lowered = text.to_lowercase();

        if self.failure_markers.iter().any(|marker| lowered.contains(marker)) {
            return Err(ReviewError::LanguageDetection("mock failure".to_string()));
        }

        let language = self
            .rules
            .iter()
            .find(|(marker, _)| lowered.contains(marker))
            .map(|(_, language)| language.clone())
            .unwrap_or_else(|| ENGLISH.to_string());

        Ok(language)
    }
}
