use crate::types::{AspectMention, AspectQuote, AspectSummary, Review};
use indexmap::IndexMap;
use std::collections::BTreeMap;
use tracing::debug;

/// Running counts for one aspect
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AspectTally {
    pub count: usize,
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
    pub other: BTreeMap<String, usize>,
    pub quotes: Vec<AspectQuote>,
}

impl AspectTally {
    fn record(&mut self, mention: &AspectMention) {
        // Only lowercased, not trimmed: " positive" is its own label
        let sentiment = mention.sentiment.as_deref().unwrap_or("").to_lowercase();

        self.count += 1;
        match sentiment.as_str() {
            "positive" => self.positive += 1,
            "negative" => self.negative += 1,
            "neutral" => self.neutral += 1,
            _ => *self.other.entry(sentiment.clone()).or_insert(0) += 1,
        }

        if let Some(quote) = mention.quote.as_deref().filter(|q| !q.is_empty()) {
            self.quotes.push(AspectQuote {
                quote: quote.to_string(),
                sentiment,
            });
        }
    }

    fn into_summary(self, name: String) -> AspectSummary {
        let positive_ratio = if self.count > 0 {
            self.positive as f64 / self.count as f64
        } else {
            0.0
        };

        AspectSummary {
            name,
            count: self.count,
            positive_count: self.positive,
            negative_count: self.negative,
            neutral_count: self.neutral,
            other_counts: self.other,
            positive_ratio,
            quotes: self.quotes,
        }
    }
}

/// Aspect tallies keyed by aggregation key, in first-seen order
#[derive(Debug, Clone, Default)]
pub struct AspectTable {
    entries: IndexMap<String, AspectTally>,
}

impl AspectTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tally for `key`, inserting an empty one if this is the first mention
    pub fn entry_or_insert(&mut self, key: String) -> &mut AspectTally {
        self.entries.entry(key).or_default()
    }

    pub fn get(&self, key: &str) -> Option<&AspectTally> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fold one mention into the table; mentions without a usable name are ignored
    pub fn fold_mention(mut self, mention: &AspectMention) -> Self {
        if let Some(key) = mention.key() {
            self.entry_or_insert(key).record(mention);
        }
        self
    }

    /// Summaries ordered by mention count, most mentioned first. Equal counts
    /// keep first-seen order, but callers should not rely on that.
    pub fn into_summaries(self) -> Vec<AspectSummary> {
        let mut summaries: Vec<AspectSummary> = self
            .entries
            .into_iter()
            .map(|(name, tally)| tally.into_summary(name))
            .collect();

        summaries.sort_by(|a, b| b.count.cmp(&a.count));
        summaries
    }
}

/// Fold every aspect mention of every review into per-aspect summaries
pub fn aggregate(reviews: &[Review]) -> Vec<AspectSummary> {
    let table = reviews
        .iter()
        .flat_map(|review| review.aspects.iter())
        .fold(AspectTable::new(), AspectTable::fold_mention);

    debug!("Aggregated {} distinct aspects from {} reviews", table.len(), reviews.len());
    table.into_summaries()
}
