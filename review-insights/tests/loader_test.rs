use chrono::NaiveDate;
use review_insights::export::{export_reviews, export_summary, write_reviews_csv, REVIEW_COLUMNS};
use review_insights::loader::{load_csv_bytes, load_csv_path, parse_date, parse_rating};
use review_insights::types::{AspectMention, Result, Review, ReviewError, SentimentLabel};
use review_insights::aggregate;
use std::fs;

#[test]
fn test_load_csv_with_optional_columns() -> Result<()> {
    let csv = "review_text,rating,date,source\n\
               Great pasta,5,2024-03-01,Yelp\n\
               \"Slow, but friendly\",not a number,yesterday,\n\
               ,4,2024-03-02,Google\n\
               Lovely view,3.5,2024-03-03 18:30:00,  Google  \n";

    let reviews = load_csv_bytes(csv.as_bytes())?;
    assert_eq!(reviews.len(), 3);

    assert_eq!(reviews[0].review_text, "Great pasta");
    assert_eq!(reviews[0].rating, Some(5.0));
    assert_eq!(
        reviews[0].date,
        NaiveDate::from_ymd_opt(2024, 3, 1).and_then(|d| d.and_hms_opt(0, 0, 0))
    );
    assert_eq!(reviews[0].source.as_deref(), Some("Yelp"));

    assert_eq!(reviews[1].review_text, "Slow, but friendly");
    assert_eq!(reviews[1].rating, None);
    assert_eq!(reviews[1].date, None);
    assert_eq!(reviews[1].source, None);

    assert_eq!(reviews[2].source_row, 3);
    assert_eq!(reviews[2].rating, Some(3.5));
    assert_eq!(reviews[2].source.as_deref(), Some("Google"));
    assert!(reviews.iter().all(|r| r.sentiment.is_none() && r.aspects.is_empty()));
    Ok(())
}

#[test]
fn test_load_csv_only_review_text_required() -> Result<()> {
    let reviews = load_csv_bytes(b"review_text\nFirst\nSecond\n")?;
    assert_eq!(reviews.len(), 2);
    assert!(reviews.iter().all(|r| r.rating.is_none() && r.date.is_none() && r.source.is_none()));
    Ok(())
}

#[test]
fn test_load_csv_rejects_bad_datasets() {
    match load_csv_bytes(b"text,rating\nhello,5\n") {
        Err(ReviewError::MissingColumns { columns }) => assert_eq!(columns, vec!["review_text".to_string()]),
        other => panic!("expected MissingColumns, got {:?}", other),
    }

    assert!(matches!(load_csv_bytes(b""), Err(ReviewError::EmptyDataset)));
    assert!(matches!(load_csv_bytes(b"  \n\n"), Err(ReviewError::EmptyDataset)));
    assert!(matches!(load_csv_bytes(b"review_text,rating\n"), Err(ReviewError::EmptyDataset)));

    let err = load_csv_bytes(b"review_text,rating\n,5\n   ,4\n").unwrap_err();
    assert!(matches!(err, ReviewError::NoValidReviews(_)));
    assert_eq!(err.to_string(), "review_text column contains no valid data");
}

#[test]
fn test_load_csv_encodings() -> Result<()> {
    let with_bom = b"\xEF\xBB\xBFreview_text\nCaf\xC3\xA9 was nice\n";
    let reviews = load_csv_bytes(with_bom)?;
    assert_eq!(reviews[0].review_text, "Café was nice");

    let latin1 = b"review_text\nCaf\xE9 was nice\n";
    let reviews = load_csv_bytes(latin1)?;
    assert_eq!(reviews[0].review_text, "Café was nice");
    Ok(())
}

#[test]
fn test_value_coercion() {
    assert_eq!(parse_rating(" 4 "), Some(4.0));
    assert_eq!(parse_rating("NaN"), None);
    assert_eq!(parse_rating("five"), None);

    assert!(parse_date("2024-01-15T10:00:00Z").is_some());
    assert!(parse_date("01/15/2024").is_some());
    assert_eq!(parse_date(""), None);
    assert_eq!(parse_date("soon"), None);
}

#[test]
fn test_export_round_trip() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("reviews.csv");
    fs::write(&input, "review_text,rating,source\nGreat food,5,Yelp\nRude staff,1,Google\n")?;

    let reviews: Vec<Review> = load_csv_path(&input)?
        .into_iter()
        .map(|review| {
            let text = review.review_text.clone();
            review.with_cleaned_text(text)
        })
        .collect();
    let reviews = vec![
        reviews[0]
            .clone()
            .with_sentiment(SentimentLabel::Positive, 0.91)
            .with_aspects(vec![AspectMention::new("food quality", "positive", "Great food")]),
        reviews[1]
            .clone()
            .with_sentiment(SentimentLabel::Negative, 0.88)
            .with_aspects(vec![
                AspectMention::new("service", "negative", "Rude staff"),
                AspectMention::new("ambiance", "neutral", ""),
            ]),
    ];

    let reviews_out = dir.path().join("processed.csv");
    export_reviews(&reviews_out, &reviews)?;

    let mut reader = csv::Reader::from_path(&reviews_out)?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    assert_eq!(headers, REVIEW_COLUMNS);

    let rows: Vec<csv::StringRecord> = reader.records().collect::<std::result::Result<_, _>>()?;
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][5], "positive");
    assert_eq!(&rows[0][6], "0.9100");
    assert_eq!(&rows[1][8], "service, ambiance");

    let aspects: Vec<AspectMention> = serde_json::from_str(&rows[1][7])?;
    assert_eq!(aspects, reviews[1].aspects);

    // The exported file loads back as a dataset
    let reloaded = load_csv_path(&reviews_out)?;
    assert_eq!(reloaded.len(), 2);
    assert_eq!(reloaded[1].source.as_deref(), Some("Google"));
    assert_eq!(reloaded[0].rating, Some(5.0));

    let summary_out = dir.path().join("summary.csv");
    export_summary(&summary_out, &aggregate(&reviews))?;
    let summary = fs::read_to_string(&summary_out)?;
    assert!(summary.starts_with("name,count,positive_count,negative_count,neutral_count,positive_ratio"));
    assert!(summary.contains("food quality,1,1,0,0,1.0000"));
    Ok(())
}

#[test]
fn test_write_reviews_csv_to_memory() -> Result<()> {
    let reviews = vec![Review::new(0, "Plain").with_cleaned_text("Plain")];
    let mut buffer = Vec::new();
    write_reviews_csv(&mut buffer, &reviews)?;

    let text = String::from_utf8(buffer).expect("csv output is utf-8");
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some(REVIEW_COLUMNS.join(",").as_str()));
    assert_eq!(lines.next(), Some("Plain,Plain,,,,,,[],"));
    Ok(())
}
