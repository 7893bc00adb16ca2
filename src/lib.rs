// Caption Summary API Library
//
// This crate provides a local HTTP API that extracts video captions with yt-dlp
// and summarizes text with a T5 sequence-to-sequence model.

pub mod caption_fetcher;
pub mod caption_parser;
pub mod config;
pub mod config_loader;
pub mod config_validator;
pub mod error;
pub mod file_utils;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod summarizer;

// Re-export common types for easier access
pub use caption_fetcher::{CaptionFetcher, TranscriptSource};
pub use config::{FetcherConfig, GenerationConfig, MetricsConfig, ServerConfig};
pub use error::{FetchError, HandlerError, ModelLoadError, SummarizeError};
pub use metrics::{create_metrics_exporter, Metrics};
pub use models::{ErrorResponse, HealthResponse, SummaryResponse, TranscriptResponse};
pub use summarizer::{SummarizationService, TextSummarizer};
