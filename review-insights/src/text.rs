//! Review text cleanup applied before language filtering and deduplication.

use once_cell::sync::Lazy;
use regex::Regex;

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid tag pattern"));

static URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https?://(?:[a-zA-Z0-9$-_@.&+!*\\(),]|%[0-9a-fA-F]{2})+").expect("valid url pattern")
});

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("valid email pattern")
});

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Strip markup, URLs and email addresses, then collapse whitespace.
///
/// ```
/// use review_insights::text::normalize;
/// assert_eq!(normalize("<p>Visit https://example.com or email test@test.com</p>"), "Visit or email");
/// ```
///
/// Removing one pattern can occasionally splice together text that matches
/// another, so the passes repeat until the output stops changing. This keeps
/// `normalize(normalize(x)) == normalize(x)` for every input.
pub fn normalize(raw: &str) -> String {
    let mut current = single_pass(raw);
    loop {
        let next = single_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Normalize a possibly missing value; absent input becomes an empty string
pub fn normalize_opt(raw: Option<&str>) -> String {
    raw.map(normalize).unwrap_or_default()
}

fn single_pass(text: &str) -> String {
    let text = HTML_TAG.replace_all(text, "");
    let text = URL.replace_all(&text, "");
    let text = EMAIL.replace_all(&text, "");
    let text = WHITESPACE.replace_all(&text, " ");
    text.trim().to_string()
}
