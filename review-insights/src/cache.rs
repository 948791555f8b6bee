use crate::config::PreprocessOptions;
use crate::types::Review;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Content hash of a dataset together with the options it was processed with
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fingerprint the raw input fields of `reviews` plus the processing options.
///
/// Only whether aspect extraction is enabled is hashed, never the credential.
pub fn fingerprint(reviews: &[Review], options: &PreprocessOptions, extraction_enabled: bool) -> Fingerprint {
    let mut hasher = Sha256::new();

    update_field(&mut hasher, &[u8::from(options.remove_duplicates), u8::from(options.filter_english)]);
    update_field(&mut hasher, &[options.dedup_threshold, u8::from(extraction_enabled)]);
    update_field(&mut hasher, &(reviews.len() as u64).to_le_bytes());

    for review in reviews {
        update_field(&mut hasher, review.review_text.as_bytes());
        update_field(&mut hasher, &review.rating.map(f64::to_bits).unwrap_or(u64::MAX).to_le_bytes());
        let date = review.date.map(|d| d.to_string()).unwrap_or_default();
        update_field(&mut hasher, date.as_bytes());
        update_field(&mut hasher, review.source.as_deref().unwrap_or("").as_bytes());
    }

    Fingerprint(format!("{:x}", hasher.finalize()))
}

// Length prefix keeps ("ab", "c") and ("a", "bc") apart
fn update_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

/// In-memory results keyed by fingerprint, recomputed only on a miss
#[derive(Debug)]
pub struct ResultCache<T> {
    entries: HashMap<Fingerprint, Arc<T>>,
    hits: u64,
    misses: u64,
}

impl<T> Default for ResultCache<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }
}

impl<T> ResultCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, key: &Fingerprint) -> Option<Arc<T>> {
        match self.entries.get(key) {
            Some(value) => {
                self.hits += 1;
                debug!("Result cache hit for {}", key);
                Some(value.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, key: Fingerprint, value: T) -> Arc<T> {
        let value = Arc::new(value);
        self.entries.insert(key, value.clone());
        value
    }

    pub fn invalidate(&mut self, key: &Fingerprint) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (hits, misses) since creation
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}
