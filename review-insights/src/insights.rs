//! Dataset-level views over processed reviews: headline counts, the
//! sentiment timeline, search and aspect tone bands.

use crate::types::{AspectSummary, Review, SentimentLabel};
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Headline numbers for a processed review set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentOverview {
    pub total: usize,
    pub positive: usize,
    pub negative: usize,
    /// Label counts over scored reviews, most frequent first
    pub distribution: Vec<(String, usize)>,
}

pub fn overview(reviews: &[Review]) -> SentimentOverview {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for label in reviews.iter().filter_map(|r| r.sentiment.as_ref()) {
        *counts.entry(label.to_string()).or_insert(0) += 1;
    }

    let mut distribution: Vec<(String, usize)> = counts.into_iter().collect();
    distribution.sort_by(|a, b| b.1.cmp(&a.1));

    SentimentOverview {
        total: reviews.len(),
        positive: count_label(reviews, &SentimentLabel::Positive),
        negative: count_label(reviews, &SentimentLabel::Negative),
        distribution,
    }
}

fn count_label(reviews: &[Review], label: &SentimentLabel) -> usize {
    reviews.iter().filter(|r| r.sentiment.as_ref() == Some(label)).count()
}

/// Review counts per sentiment for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub date: NaiveDate,
    pub counts: BTreeMap<String, usize>,
}

/// Daily sentiment counts, oldest day first.
///
/// Every point carries every label seen anywhere in the timeline, with zero
/// for days that lack it. `None` when no scored review has a date.
pub fn sentiment_timeline(reviews: &[Review]) -> Option<Vec<TimelinePoint>> {
    let mut days: BTreeMap<NaiveDate, BTreeMap<String, usize>> = BTreeMap::new();
    let mut labels: BTreeSet<String> = BTreeSet::new();

    for review in reviews {
        let (Some(date), Some(label)) = (review.date, review.sentiment.as_ref()) else {
            continue;
        };
        let label = label.to_string();
        *days.entry(date.date()).or_default().entry(label.clone()).or_insert(0) += 1;
        labels.insert(label);
    }

    if days.is_empty() {
        return None;
    }

    Some(
        days.into_iter()
            .map(|(date, mut counts)| {
                for label in &labels {
                    counts.entry(label.clone()).or_insert(0);
                }
                TimelinePoint { date, counts }
            })
            .collect(),
    )
}

/// Reviews whose cleaned text contains `term`, ignoring case. An empty term matches everything.
pub fn search<'a>(reviews: &'a [Review], term: &str) -> Vec<&'a Review> {
    let needle = term.to_lowercase();
    reviews
        .iter()
        .filter(|review| needle.is_empty() || review.cleaned_text.to_lowercase().contains(&needle))
        .collect()
}

/// Coarse reading of an aspect's positive share
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectTone {
    Favorable,
    Mixed,
    Unfavorable,
}

impl AspectTone {
    pub fn from_ratio(positive_ratio: f64) -> Self {
        if positive_ratio >= 0.6 {
            AspectTone::Favorable
        } else if positive_ratio <= 0.4 {
            AspectTone::Unfavorable
        } else {
            AspectTone::Mixed
        }
    }
}

impl AspectSummary {
    pub fn tone(&self) -> AspectTone {
        AspectTone::from_ratio(self.positive_ratio)
    }
}

/// Comma-separated aspect names of one review, as shown in tables
pub fn aspects_display(review: &Review) -> String {
    review
        .aspects
        .iter()
        .map(|mention| mention.name.as_deref().unwrap_or(""))
        .collect::<Vec<_>>()
        .join(", ")
}
