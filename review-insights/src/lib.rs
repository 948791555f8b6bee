pub mod aggregator;
pub mod cache;
pub mod config;
pub mod dedup;
pub mod digest;
pub mod export;
pub mod insights;
pub mod language;
pub mod llm_adapter;
pub mod loader;
pub mod pipeline;
pub mod processing;
pub mod ranking;
pub mod retry;
pub mod sentiment;
pub mod text;
pub mod types;

pub use aggregator::aggregate;
pub use config::{AnalyzerConfig, ExtractionConfig, PreprocessOptions, RetryConfig, SentimentConfig};
pub use dedup::find_duplicate_indices;
pub use digest::{compose_report, ReportOptions};
pub use language::{is_english, LanguageClassifier, MockLanguageClassifier, WhatlangClassifier};
pub use llm_adapter::{AspectExtractor, GeminiExtractor, MockAspectExtractor};
pub use loader::{load_csv_bytes, load_csv_path};
pub use pipeline::{AnalysisResult, AnalyzerBuilder, ReviewAnalyzer};
pub use processing::{preprocess, PreprocessReport};
pub use ranking::top_quotes;
pub use sentiment::{HuggingFaceClassifier, MockSentimentClassifier, SentimentClassifier};
pub use text::normalize;
pub use types::*;
