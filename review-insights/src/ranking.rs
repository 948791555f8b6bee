use crate::types::{aspect_key, Quote, Review};
use std::cmp::Ordering;

/// Confidence assumed for reviews that were never scored
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Pick up to `n` representative quotes for an aspect.
///
/// Quotes are ordered by the confidence of the review they came from, highest
/// first. Positive and negative quotes always come before neutral ones; neutral
/// quotes only fill the slots left over. Quotes with any other sentiment label
/// are never chosen. Equal confidences keep review order, then mention order.
pub fn top_quotes(reviews: &[Review], aspect_name: &str, n: usize) -> Vec<Quote> {
    let target = aspect_key(aspect_name);
    let target = target.as_str();

    let mut quotes: Vec<Quote> = reviews
        .iter()
        .flat_map(|review| {
            let confidence = review.sentiment_confidence.unwrap_or(DEFAULT_CONFIDENCE);
            review.aspects.iter().filter_map(move |mention| {
                if aspect_key(mention.name.as_deref().unwrap_or("")) != target {
                    return None;
                }
                let quote = mention.quote.as_deref().filter(|q| !q.is_empty())?;
                Some(Quote {
                    quote: quote.to_string(),
                    sentiment: mention.sentiment.clone().unwrap_or_else(|| "neutral".to_string()),
                    confidence,
                })
            })
        })
        .collect();

    // Stable sort, so ties stay in collection order
    quotes.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap_or(Ordering::Equal));

    let (polar, rest): (Vec<Quote>, Vec<Quote>) = quotes
        .into_iter()
        .partition(|q| q.sentiment == "positive" || q.sentiment == "negative");
    let neutral = rest.into_iter().filter(|q| q.sentiment == "neutral");

    polar.into_iter().chain(neutral).take(n).collect()
}
