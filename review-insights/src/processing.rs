use crate::config::PreprocessOptions;
use crate::dedup::find_duplicate_indices;
use crate::language::{is_english, LanguageClassifier};
use crate::text::normalize;
use crate::types::Review;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// One step of the preprocessing pipeline
pub trait ProcessingStage {
    /// Transform the working set. Stages only ever drop rows, never add or reorder them.
    fn process(&self, reviews: Vec<Review>) -> StageOutput;

    /// Get the name of this processing stage
    fn stage_name(&self) -> String;
}

/// Output from a processing stage
#[derive(Debug, Clone)]
pub struct StageOutput {
    pub reviews: Vec<Review>,
    pub removed: usize,
}

impl StageOutput {
    fn kept_all(reviews: Vec<Review>) -> Self {
        Self { reviews, removed: 0 }
    }
}

/// Fills `cleaned_text` for every review
pub struct NormalizeStage;

impl ProcessingStage for NormalizeStage {
    fn process(&self, mut reviews: Vec<Review>) -> StageOutput {
        debug!("Normalizing {} reviews", reviews.len());

        for review in &mut reviews {
            review.cleaned_text = normalize(&review.review_text);
        }

        StageOutput::kept_all(reviews)
    }

    fn stage_name(&self) -> String {
        "normalize".to_string()
    }
}

/// Drops reviews whose cleaned text ended up empty
pub struct DropEmptyStage;

impl ProcessingStage for DropEmptyStage {
    fn process(&self, reviews: Vec<Review>) -> StageOutput {
        let before = reviews.len();
        let reviews: Vec<Review> = reviews
            .into_iter()
            .filter(|review| !review.cleaned_text.is_empty())
            .collect();

        StageOutput {
            removed: before - reviews.len(),
            reviews,
        }
    }

    fn stage_name(&self) -> String {
        "drop_empty".to_string()
    }
}

/// Keeps English reviews only
pub struct LanguageFilterStage<'a> {
    classifier: &'a dyn LanguageClassifier,
}

impl<'a> LanguageFilterStage<'a> {
    pub fn new(classifier: &'a dyn LanguageClassifier) -> Self {
        Self { classifier }
    }
}

impl ProcessingStage for LanguageFilterStage<'_> {
    fn process(&self, reviews: Vec<Review>) -> StageOutput {
        debug!("Filtering {} reviews with {}", reviews.len(), self.classifier.classifier_name());

        let before = reviews.len();
        let reviews: Vec<Review> = reviews
            .into_iter()
            .filter(|review| is_english(&review.cleaned_text, self.classifier))
            .collect();

        StageOutput {
            removed: before - reviews.len(),
            reviews,
        }
    }

    fn stage_name(&self) -> String {
        "language_filter".to_string()
    }
}

/// Collapses near-duplicate reviews, keeping the first of each group
pub struct DeduplicationStage {
    threshold: u8,
}

impl DeduplicationStage {
    pub fn new(threshold: u8) -> Self {
        Self { threshold }
    }
}

impl ProcessingStage for DeduplicationStage {
    fn process(&self, reviews: Vec<Review>) -> StageOutput {
        debug!("Deduplicating {} reviews at threshold {}", reviews.len(), self.threshold);

        let duplicates = {
            let texts: Vec<&str> = reviews.iter().map(|r| r.cleaned_text.as_str()).collect();
            find_duplicate_indices(texts.as_slice(), self.threshold)
        };

        if duplicates.is_empty() {
            return StageOutput::kept_all(reviews);
        }

        // `duplicates` is sorted, so a single forward walk finds every index
        let mut pending = duplicates.iter().peekable();
        let reviews: Vec<Review> = reviews
            .into_iter()
            .enumerate()
            .filter_map(|(index, review)| {
                if pending.peek() == Some(&&index) {
                    pending.next();
                    None
                } else {
                    Some(review)
                }
            })
            .collect();

        StageOutput {
            removed: duplicates.len(),
            reviews,
        }
    }

    fn stage_name(&self) -> String {
        "deduplicate".to_string()
    }
}

/// Row counts observed while preprocessing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreprocessReport {
    pub input_rows: usize,
    pub empty_removed: usize,
    pub non_english_removed: usize,
    pub duplicates_removed: usize,
    pub output_rows: usize,
}

/// Surviving reviews plus what was removed along the way
#[derive(Debug, Clone)]
pub struct Preprocessed {
    pub reviews: Vec<Review>,
    pub report: PreprocessReport,
}

/// Normalize, drop empties, optionally filter to English and deduplicate.
///
/// Any stage that leaves nothing behind ends the run early. Surviving reviews
/// keep their relative input order; their position in the returned vector is
/// their new dense index.
pub fn preprocess(
    reviews: Vec<Review>,
    options: &PreprocessOptions,
    classifier: &dyn LanguageClassifier,
) -> Preprocessed {
    let mut report = PreprocessReport {
        input_rows: reviews.len(),
        ..Default::default()
    };

    if reviews.is_empty() {
        return Preprocessed { reviews, report };
    }

    let reviews = NormalizeStage.process(reviews).reviews;

    let output = DropEmptyStage.process(reviews);
    report.empty_removed = output.removed;
    if output.removed > 0 {
        info!("Dropped {} review(s) with no text left after cleaning", output.removed);
    }
    let mut reviews = output.reviews;

    if !reviews.is_empty() && options.filter_english {
        let output = LanguageFilterStage::new(classifier).process(reviews);
        report.non_english_removed = output.removed;
        if output.removed > 0 {
            info!("Filtered out {} non-English review(s)", output.removed);
        }
        reviews = output.reviews;
    }

    if !reviews.is_empty() && options.remove_duplicates {
        let output = DeduplicationStage::new(options.dedup_threshold).process(reviews);
        report.duplicates_removed = output.removed;
        if output.removed > 0 {
            info!("Removed {} duplicate review(s)", output.removed);
        }
        reviews = output.reviews;
    }

    report.output_rows = reviews.len();
    debug!("Preprocessing kept {}/{} reviews", report.output_rows, report.input_rows);

    Preprocessed { reviews, report }
}
