use crate::insights::{overview, AspectTone};
use crate::pipeline::AnalysisResult;
use crate::ranking::top_quotes;
use crate::types::{AspectSummary, Review};
use tracing::debug;

/// How much of the aspect table a report shows
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Maximum aspects listed, most mentioned first
    pub max_aspects: usize,
    /// Representative quotes per aspect
    pub quotes_per_aspect: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            max_aspects: 10,
            quotes_per_aspect: 3,
        }
    }
}

/// Render an analysis as a plain-text report
pub fn compose_report(result: &AnalysisResult, options: &ReportOptions) -> String {
    let mut report = String::new();
    report.push_str(&compose_overview(&result.reviews));

    let r = &result.report;
    report.push_str(&format!(
        "Preprocessing: {} loaded, {} empty, {} non-English, {} duplicates removed\n\n",
        r.input_rows, r.empty_removed, r.non_english_removed, r.duplicates_removed
    ));

    match &result.aspect_summaries {
        None => report.push_str("Aspect analysis skipped (no API key configured).\n"),
        Some(summaries) if summaries.is_empty() => report.push_str("No aspects found in the reviews.\n"),
        Some(summaries) => {
            report.push_str("Aspect Analysis:\n\n");
            for (i, summary) in summaries.iter().take(options.max_aspects).enumerate() {
                report.push_str(&compose_aspect(i + 1, summary, &result.reviews, options.quotes_per_aspect));
            }
        }
    }

    debug!("Composed report of {} bytes", report.len());
    report
}

fn compose_overview(reviews: &[Review]) -> String {
    let overview = overview(reviews);
    if overview.total == 0 {
        return "No reviews left to analyze.\n\n".to_string();
    }

    let mut text = String::new();
    text.push_str("Review Overview:\n");
    text.push_str(&format!("   Total reviews: {}\n", overview.total));
    text.push_str(&format!(
        "   Positive: {} ({:.1}%)\n",
        overview.positive,
        percent(overview.positive, overview.total)
    ));
    text.push_str(&format!(
        "   Negative: {} ({:.1}%)\n",
        overview.negative,
        percent(overview.negative, overview.total)
    ));
    for (label, count) in &overview.distribution {
        text.push_str(&format!("   [{}] {}\n", label, count));
    }
    text.push('\n');
    text
}

fn compose_aspect(rank: usize, summary: &AspectSummary, reviews: &[Review], quotes: usize) -> String {
    let mut text = format!(
        "{}. {} ({} mentions, {:.1}% positive, {})\n",
        rank,
        title_case(&summary.name),
        summary.count,
        summary.positive_ratio * 100.0,
        tone_label(summary.tone())
    );
    text.push_str(&format!(
        "   Positive: {}  Negative: {}  Neutral: {}\n",
        summary.positive_count, summary.negative_count, summary.neutral_count
    ));

    for quote in top_quotes(reviews, &summary.name, quotes) {
        text.push_str(&format!("   - \"{}\" [{}, {:.2}]\n", quote.quote, quote.sentiment, quote.confidence));
    }
    text.push('\n');
    text
}

fn tone_label(tone: AspectTone) -> &'static str {
    match tone {
        AspectTone::Favorable => "favorable",
        AspectTone::Mixed => "mixed",
        AspectTone::Unfavorable => "unfavorable",
    }
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

/// "food quality" -> "Food Quality"
pub fn title_case(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
