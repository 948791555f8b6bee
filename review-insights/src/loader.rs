use crate::types::{Result, Review, ReviewError};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use encoding_rs::WINDOWS_1252;
use std::borrow::Cow;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

pub const REQUIRED_COLUMNS: &[&str] = &["review_text"];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M", "%m/%d/%Y %H:%M"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%d.%m.%Y"];

/// Load reviews from a CSV file on disk
pub fn load_csv_path(path: impl AsRef<Path>) -> Result<Vec<Review>> {
    let path = path.as_ref();
    debug!("Loading reviews from {}", path.display());
    let bytes = fs::read(path)?;
    load_csv_bytes(&bytes)
}

/// Load and validate reviews from raw CSV bytes.
///
/// Only `review_text` is required. Rows without review text are dropped;
/// unparseable `rating` and `date` values become `None`.
pub fn load_csv_bytes(bytes: &[u8]) -> Result<Vec<Review>> {
    let content = decode(bytes)?;
    if content.trim().is_empty() {
        return Err(ReviewError::EmptyDataset);
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h.trim() == name);

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|name| column(name).is_none())
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ReviewError::MissingColumns { columns: missing });
    }

    let text_col = column("review_text").ok_or(ReviewError::EmptyDataset)?;
    let rating_col = column("rating");
    let date_col = column("date");
    let source_col = column("source");

    let mut total_rows = 0;
    let mut reviews = Vec::new();

    for (row, record) in reader.records().enumerate() {
        let record = record?;
        total_rows += 1;

        let text = match record.get(text_col).filter(|t| !t.trim().is_empty()) {
            Some(text) => text,
            None => continue,
        };

        let mut review = Review::new(row, text);
        review.rating = rating_col.and_then(|c| record.get(c)).and_then(parse_rating);
        review.date = date_col.and_then(|c| record.get(c)).and_then(parse_date);
        review.source = source_col
            .and_then(|c| record.get(c))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        reviews.push(review);
    }

    if total_rows == 0 {
        return Err(ReviewError::EmptyDataset);
    }
    if reviews.is_empty() {
        return Err(ReviewError::NoValidReviews(
            "review_text column contains no valid data".to_string(),
        ));
    }

    info!("Loaded {} reviews ({} rows without review text skipped)", reviews.len(), total_rows - reviews.len());
    Ok(reviews)
}

/// UTF-8 first (BOM tolerated), then Windows-1252
fn decode(bytes: &[u8]) -> Result<Cow<'_, str>> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF".as_slice()).unwrap_or(bytes);

    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok(Cow::Borrowed(text));
    }

    debug!("Input is not valid UTF-8, falling back to {}", WINDOWS_1252.name());
    WINDOWS_1252
        .decode_without_bom_handling_and_without_replacement(bytes)
        .ok_or(ReviewError::Decode)
}

pub fn parse_rating(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
