use crate::insights::aspects_display;
use crate::types::{AspectSummary, Result, Review};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

pub const REVIEW_COLUMNS: &[&str] = &[
    "review_text",
    "cleaned_text",
    "rating",
    "date",
    "source",
    "sentiment",
    "sentiment_confidence",
    "aspects",
    "aspects_display",
];

pub const SUMMARY_COLUMNS: &[&str] = &[
    "name",
    "count",
    "positive_count",
    "negative_count",
    "neutral_count",
    "positive_ratio",
];

/// Write the enriched review set as CSV. Aspect mentions are embedded as a JSON array.
pub fn write_reviews_csv<W: Write>(writer: W, reviews: &[Review]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(REVIEW_COLUMNS)?;

    for review in reviews {
        let aspects = serde_json::to_string(&review.aspects)?;
        csv_writer.write_record([
            review.review_text.clone(),
            review.cleaned_text.clone(),
            review.rating.map(|r| r.to_string()).unwrap_or_default(),
            review
                .date
                .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default(),
            review.source.clone().unwrap_or_default(),
            review.sentiment.as_ref().map(|s| s.to_string()).unwrap_or_default(),
            review
                .sentiment_confidence
                .map(|c| format!("{:.4}", c))
                .unwrap_or_default(),
            aspects,
            aspects_display(review),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Write the aspect summary table as CSV
pub fn write_summary_csv<W: Write>(writer: W, summaries: &[AspectSummary]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(SUMMARY_COLUMNS)?;

    for summary in summaries {
        csv_writer.write_record([
            summary.name.clone(),
            summary.count.to_string(),
            summary.positive_count.to_string(),
            summary.negative_count.to_string(),
            summary.neutral_count.to_string(),
            format!("{:.4}", summary.positive_ratio),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn export_reviews(path: impl AsRef<Path>, reviews: &[Review]) -> Result<()> {
    let path = path.as_ref();
    write_reviews_csv(File::create(path)?, reviews)?;
    info!("Exported {} reviews to {}", reviews.len(), path.display());
    Ok(())
}

pub fn export_summary(path: impl AsRef<Path>, summaries: &[AspectSummary]) -> Result<()> {
    let path = path.as_ref();
    write_summary_csv(File::create(path)?, summaries)?;
    info!("Exported {} aspect summaries to {}", summaries.len(), path.display());
    Ok(())
}
