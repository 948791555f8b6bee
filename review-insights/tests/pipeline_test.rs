use review_insights::cache::fingerprint;
use review_insights::config::{AnalyzerConfig, PreprocessOptions, RetryConfig};
use review_insights::digest::{compose_report, title_case, ReportOptions};
use review_insights::insights::{overview, search, sentiment_timeline};
use review_insights::pipeline::{annotate_aspects, ReviewAnalyzer};
use review_insights::types::{Result, Review, SentimentLabel};
use review_insights::{MockAspectExtractor, MockLanguageClassifier, MockSentimentClassifier};
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

fn fast_config() -> AnalyzerConfig {
    let retry = RetryConfig {
        max_attempts: 2,
        initial_delay_ms: 1,
    };
    let mut config = AnalyzerConfig::default();
    config.sentiment.batch_size = 2;
    config.sentiment.retry = retry.clone();
    config.extraction.retry = retry;
    config.extraction.request_spacing_ms = 0;
    config
}

fn sample_reviews() -> Vec<Review> {
    let day = |d: u32| NaiveDate::from_ymd_opt(2024, 5, d).and_then(|date| date.and_hms_opt(12, 0, 0));
    let texts = [
        "Great food, friendly staff",
        "The food was cold, the waiter was rude",
        "Delicious food",
        "Comida excelente",
        "Great food, friendly staff!",
    ];

    texts
        .iter()
        .enumerate()
        .map(|(row, text)| {
            let mut review = Review::new(row, *text);
            review.date = day(1 + (row as u32 % 2));
            review
        })
        .collect()
}

fn analyzer(with_extractor: bool) -> Result<ReviewAnalyzer> {
    let mut builder = ReviewAnalyzer::builder()
        .config(fast_config())
        .language_classifier(Box::new(MockLanguageClassifier::new().with_rule("comida", "es")))
        .sentiment_classifier(Box::new(MockSentimentClassifier::new()));
    if with_extractor {
        builder = builder.aspect_extractor(Box::new(MockAspectExtractor::new()));
    }
    builder.build()
}

#[tokio::test]
async fn test_analysis_end_to_end() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .try_init();

    let mut analyzer = analyzer(true)?;
    let mut progress = Vec::new();
    let result = analyzer
        .analyze_with_progress(sample_reviews(), |done, total| progress.push((done, total)))
        .await?;

    info!("Analyzed {} reviews", result.reviews.len());
    assert_eq!(result.reviews.len(), 3);
    assert_eq!(result.report.non_english_removed, 1);
    assert_eq!(result.report.duplicates_removed, 1);
    assert_eq!(progress, vec![(1, 3), (2, 3), (3, 3)]);

    let labels: Vec<Option<SentimentLabel>> = result.reviews.iter().map(|r| r.sentiment.clone()).collect();
    assert_eq!(
        labels,
        vec![
            Some(SentimentLabel::Positive),
            Some(SentimentLabel::Negative),
            Some(SentimentLabel::Positive)
        ]
    );
    assert!(result.reviews.iter().all(|r| r.sentiment_confidence.is_some()));

    assert!(result.aspects_extracted());
    let summaries = result.aspect_summaries.as_ref().expect("aspects were extracted");
    let names: Vec<&str> = summaries.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["food quality", "service"]);
    assert_eq!(summaries[0].count, 3);
    assert_eq!(summaries[0].positive_count, 2);
    assert_eq!(summaries[1].negative_count, 1);

    let quotes: Vec<String> = result.top_quotes("Food Quality", 3).into_iter().map(|q| q.quote).collect();
    assert_eq!(quotes, vec!["Great food", "The food was cold", "Delicious food"]);
    Ok(())
}

#[tokio::test]
async fn test_analysis_without_extractor_skips_aspects() -> Result<()> {
    let mut analyzer = analyzer(false)?;
    assert!(!analyzer.extraction_enabled());

    let result = analyzer.analyze(sample_reviews()).await?;

    assert!(result.aspect_summaries.is_none());
    assert!(result.reviews.iter().all(|r| r.aspects.is_empty()));
    assert!(result.reviews.iter().all(|r| r.sentiment.is_some()));

    let report = compose_report(&result, &ReportOptions::default());
    assert!(report.contains("Aspect analysis skipped"));
    Ok(())
}

#[tokio::test]
async fn test_sentiment_outage_leaves_reviews_unscored() -> Result<()> {
    let mut analyzer = ReviewAnalyzer::builder()
        .config(fast_config())
        .language_classifier(Box::new(MockLanguageClassifier::new()))
        .sentiment_classifier(Box::new(MockSentimentClassifier::failing()))
        .aspect_extractor(Box::new(MockAspectExtractor::new()))
        .build()?;

    let result = analyzer.analyze(sample_reviews()).await?;

    assert!(!result.reviews.is_empty());
    assert!(result.reviews.iter().all(|r| r.sentiment.is_none() && r.sentiment_confidence.is_none()));
    assert!(result.aspect_summaries.as_ref().is_some_and(|s| !s.is_empty()));
    Ok(())
}

#[tokio::test]
async fn test_aspect_extraction_retries_then_succeeds() {
    let extractor = MockAspectExtractor::new().failing_first(2);
    let retry = RetryConfig {
        max_attempts: 3,
        initial_delay_ms: 1,
    };
    let mut reviews = vec![Review::new(0, "Friendly staff").with_cleaned_text("Friendly staff")];

    annotate_aspects(&mut reviews, Some(&extractor), &retry, Duration::ZERO, |_, _| {}).await;

    assert_eq!(extractor.call_count(), 3);
    assert_eq!(reviews[0].aspects.len(), 1);
    assert_eq!(reviews[0].aspects[0].name.as_deref(), Some("service"));
    assert_eq!(reviews[0].aspects[0].sentiment.as_deref(), Some("positive"));
}

#[tokio::test]
async fn test_aspect_extraction_gives_up_per_review() {
    let extractor = MockAspectExtractor::new().failing_first(2);
    let retry = RetryConfig {
        max_attempts: 2,
        initial_delay_ms: 1,
    };
    let mut reviews = vec![
        Review::new(0, "Great food").with_cleaned_text("Great food"),
        Review::new(1, "Cheap prices").with_cleaned_text("Cheap prices"),
    ];

    annotate_aspects(&mut reviews, Some(&extractor), &retry, Duration::from_millis(1), |_, _| {}).await;

    assert_eq!(extractor.call_count(), 3);
    assert!(reviews[0].aspects.is_empty());
    assert_eq!(reviews[1].aspects[0].name.as_deref(), Some("price"));
}

#[tokio::test]
async fn test_canned_model_response_flows_into_summary() -> Result<()> {
    let raw = "```json\n{\"aspects\": [{\"name\": \"Wait Time\", \"sentiment\": \"negative\", \"quote\": \"forty minutes\"}]}\n```";
    let extractor = MockAspectExtractor::new().with_canned_response("We waited forty minutes", raw);

    let mut analyzer = ReviewAnalyzer::builder()
        .config(fast_config())
        .language_classifier(Box::new(MockLanguageClassifier::new()))
        .sentiment_classifier(Box::new(MockSentimentClassifier::new()))
        .aspect_extractor(Box::new(extractor))
        .build()?;

    let result = analyzer.analyze(vec![Review::new(0, "<p>We waited forty minutes</p>")]).await?;

    let summaries = result.aspect_summaries.as_ref().expect("aspects were extracted");
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].name, "wait time");
    assert_eq!(summaries[0].negative_count, 1);

    let report = compose_report(&result, &ReportOptions::default());
    assert!(report.contains("1. Wait Time (1 mentions, 0.0% positive, unfavorable)"));
    assert!(report.contains("\"forty minutes\" [negative"));
    Ok(())
}

#[tokio::test]
async fn test_repeated_analysis_hits_cache() -> Result<()> {
    let mut analyzer = analyzer(true)?;

    let first = analyzer.analyze(sample_reviews()).await?;
    let second = analyzer.analyze(sample_reviews()).await?;
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(analyzer.cache().stats(), (1, 1));

    let mut changed = sample_reviews();
    changed[2].review_text.push_str(" and dessert");
    let third = analyzer.analyze(changed).await?;
    assert!(!Arc::ptr_eq(&first, &third));
    assert_eq!(analyzer.cache().len(), 2);

    analyzer.clear_cache();
    let fourth = analyzer.analyze(sample_reviews()).await?;
    assert!(!Arc::ptr_eq(&first, &fourth));
    assert_eq!(first.reviews, fourth.reviews);
    Ok(())
}

#[test]
fn test_fingerprint_tracks_inputs_and_options() {
    let reviews = sample_reviews();
    let options = PreprocessOptions::default();

    let base = fingerprint(&reviews, &options, true);
    assert_eq!(base, fingerprint(&sample_reviews(), &options, true));
    assert_ne!(base, fingerprint(&reviews, &options, false));

    let looser = PreprocessOptions {
        dedup_threshold: 70,
        ..Default::default()
    };
    assert_ne!(base, fingerprint(&reviews, &looser, true));
    assert_ne!(base, fingerprint(&reviews[1..], &options, true));
    assert_eq!(base.as_str().len(), 64);
}

#[tokio::test]
async fn test_nothing_left_after_preprocessing() -> Result<()> {
    let mut analyzer = analyzer(true)?;
    let reviews = vec![Review::new(0, "Comida excelente"), Review::new(1, "<br/>")];

    let result = analyzer.analyze(reviews).await?;

    assert!(result.reviews.is_empty());
    assert_eq!(result.report.output_rows, 0);
    assert_eq!(result.aspect_summaries.as_deref(), Some(&[][..]));

    let report = compose_report(&result, &ReportOptions::default());
    assert!(report.starts_with("No reviews left to analyze."));
    assert!(report.contains("No aspects found"));
    Ok(())
}

#[test]
fn test_invalid_threshold_is_rejected() {
    let mut config = fast_config();
    config.preprocess.dedup_threshold = 101;

    let built = ReviewAnalyzer::builder()
        .config(config)
        .language_classifier(Box::new(MockLanguageClassifier::new()))
        .sentiment_classifier(Box::new(MockSentimentClassifier::new()))
        .build();
    assert!(built.is_err());
}

#[tokio::test]
async fn test_insights_over_results() -> Result<()> {
    let mut analyzer = analyzer(true)?;
    let result = analyzer.analyze(sample_reviews()).await?;

    let stats = overview(&result.reviews);
    assert_eq!(stats.total, 3);
    assert_eq!(stats.positive, 2);
    assert_eq!(stats.negative, 1);
    assert_eq!(stats.distribution, vec![("positive".to_string(), 2), ("negative".to_string(), 1)]);

    let timeline = sentiment_timeline(&result.reviews).expect("reviews are dated");
    assert_eq!(timeline.len(), 2);
    assert_eq!(timeline[0].date, NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date"));
    assert_eq!(timeline[0].counts.get("positive"), Some(&2));
    assert_eq!(timeline[0].counts.get("negative"), Some(&0));
    assert_eq!(timeline[1].counts.get("negative"), Some(&1));

    let hits = search(&result.reviews, "FOOD");
    assert_eq!(hits.len(), 3);
    assert_eq!(search(&result.reviews, "waiter").len(), 1);
    assert_eq!(search(&result.reviews, "").len(), 3);

    assert_eq!(title_case("food quality"), "Food Quality");
    assert!(sentiment_timeline(&[Review::new(0, "undated")]).is_none());
    Ok(())
}
