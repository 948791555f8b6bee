use anyhow::{bail, Context, Result};
use clap::Parser;
use review_insights::export::{export_reviews, export_summary};
use review_insights::insights::{search, sentiment_timeline};
use review_insights::{compose_report, load_csv_path, AnalyzerConfig, ReportOptions, ReviewAnalyzer};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Analyze customer reviews: clean, deduplicate, score sentiment and summarize aspects
#[derive(Parser, Debug)]
#[command(name = "review-insights", version, about)]
struct Cli {
    /// CSV file with a `review_text` column (optional `rating`, `date`, `source`)
    input: PathBuf,

    /// Keep near-duplicate reviews
    #[arg(long)]
    no_dedup: bool,

    /// Keep reviews not detected as English
    #[arg(long)]
    keep_non_english: bool,

    /// Similarity percentage at or above which two reviews are duplicates (70-100 recommended)
    #[arg(long, default_value_t = 85, value_parser = clap::value_parser!(u8).range(0..=100))]
    threshold: u8,

    /// Gemini API key; aspect extraction is skipped without one
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Hugging Face token for the sentiment endpoint
    #[arg(long, env = "HF_API_TOKEN", hide_env_values = true)]
    hf_token: Option<String>,

    /// Quotes shown per aspect in the report
    #[arg(long, default_value_t = 3)]
    top_quotes: usize,

    /// Only list reviews containing this text
    #[arg(long)]
    search: Option<String>,

    /// Write the processed reviews to this CSV file
    #[arg(long)]
    reviews_out: Option<PathBuf>,

    /// Write the aspect summary to this CSV file
    #[arg(long)]
    summary_out: Option<PathBuf>,

    /// Print the daily sentiment timeline
    #[arg(long)]
    timeline: bool,
}

impl Cli {
    fn analyzer_config(&self) -> AnalyzerConfig {
        let mut config = AnalyzerConfig::from_env();
        config.preprocess.remove_duplicates = !self.no_dedup;
        config.preprocess.filter_english = !self.keep_non_english;
        config.preprocess.dedup_threshold = self.threshold;
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            config.extraction.api_key = Some(key.clone());
        }
        if let Some(token) = self.hf_token.as_ref().filter(|t| !t.trim().is_empty()) {
            config.sentiment.api_token = Some(token.clone());
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let reviews = load_csv_path(&cli.input).with_context(|| format!("Failed to load {}", cli.input.display()))?;

    let mut analyzer = ReviewAnalyzer::builder()
        .config(cli.analyzer_config())
        .build()
        .context("Failed to set up the analyzer")?;

    let result = analyzer
        .analyze_with_progress(reviews, |done, total| {
            if done % 10 == 0 || done == total {
                info!("Extracted aspects for {}/{} reviews", done, total);
            }
        })
        .await?;

    if result.reviews.is_empty() {
        bail!("No reviews remaining after preprocessing");
    }

    let options = ReportOptions {
        quotes_per_aspect: cli.top_quotes,
        ..Default::default()
    };
    println!("{}", compose_report(&result, &options));

    if cli.timeline {
        match sentiment_timeline(&result.reviews) {
            Some(points) => {
                println!("Sentiment Timeline:");
                for point in points {
                    let counts: Vec<String> = point.counts.iter().map(|(label, n)| format!("{}={}", label, n)).collect();
                    println!("   {}  {}", point.date, counts.join(" "));
                }
            }
            None => warn!("No dated reviews, timeline unavailable"),
        }
    }

    if let Some(term) = &cli.search {
        let matches = search(&result.reviews, term);
        println!("Found {} review(s) matching \"{}\":", matches.len(), term);
        for review in matches {
            let sentiment = review.sentiment.as_ref().map(|s| s.to_string()).unwrap_or_else(|| "unscored".to_string());
            println!("   [{}] {}", sentiment, review.cleaned_text);
        }
    }

    if let Some(path) = &cli.reviews_out {
        export_reviews(path, &result.reviews).with_context(|| format!("Failed to write {}", path.display()))?;
    }
    if let Some(path) = &cli.summary_out {
        match &result.aspect_summaries {
            Some(summaries) => export_summary(path, summaries)
                .with_context(|| format!("Failed to write {}", path.display()))?,
            None => warn!("Aspect extraction did not run, not writing {}", path.display()),
        }
    }

    Ok(())
}
