// Caption Summary API configuration
//
// This module contains configuration structures and constants for the API.
// It centralizes all configuration parameters and provides defaults from environment variables.

use std::env;
use std::path::PathBuf;

/// Default values for configuration
pub mod defaults {
    // Host the server binds to; the service is local-only
    pub const HOST: &str = "127.0.0.1";

    // Default HTTP port
    pub const PORT: u16 = 5000;

    // Keep-alive timeout in seconds
    pub const KEEPALIVE_SECONDS: u64 = 75;

    // Subtitle download tool
    pub const YTDLP_COMMAND: &str = "yt-dlp";

    // Directory where caption files are written during a fetch
    pub const CAPTION_TMP_DIR: &str = ".";

    // Prefix of every temporary caption file
    pub const CAPTION_FILE_PREFIX: &str = "temp_transcript";

    // Caption format requested from the tool
    pub const CAPTION_FORMAT: &str = "vtt";

    // Cookie file handed to the tool when present
    pub const COOKIES_FILE: &str = "cookies.txt";

    // Subtitle language
    pub const CAPTION_LANGUAGE: &str = "en";

    pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

    // Instruction prefix selecting the summarization task
    pub const TASK_PREFIX: &str = "summarize: ";

    pub const MAX_INPUT_TOKENS: usize = 512;
    pub const MAX_LENGTH: usize = 150;
    pub const MIN_LENGTH: usize = 30;
    pub const NUM_BEAMS: usize = 4;
    pub const NO_REPEAT_NGRAM_SIZE: usize = 3;
    pub const REPETITION_PENALTY: f32 = 2.0;
    pub const LENGTH_PENALTY: f32 = 1.0;
    pub const EARLY_STOPPING: bool = true;

    // Valid metrics backends
    pub const VALID_METRICS_BACKENDS: [&str; 3] = ["prometheus", "none", "disabled"];
}

/// Configuration for the caption fetcher
#[derive(Clone, Debug)]
pub struct FetcherConfig {
    /// Path or name of the yt-dlp executable
    pub command: String,
    /// Directory receiving the temporary caption files
    pub temp_dir: PathBuf,
    /// Stem prefix shared by all temporary caption files
    pub file_prefix: String,
    /// Optional cookie file; skipped with a warning when absent
    pub cookies_file: PathBuf,
    /// Subtitle language code
    pub language: String,
    /// Browser User-Agent sent by the tool
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            command: env::var("YTDLP_COMMAND")
                .unwrap_or_else(|_| String::from(defaults::YTDLP_COMMAND)),
            temp_dir: PathBuf::from(
                env::var("CAPTION_TMP_DIR")
                    .unwrap_or_else(|_| String::from(defaults::CAPTION_TMP_DIR)),
            ),
            file_prefix: String::from(defaults::CAPTION_FILE_PREFIX),
            cookies_file: PathBuf::from(
                env::var("CAPTION_COOKIES_FILE")
                    .unwrap_or_else(|_| String::from(defaults::COOKIES_FILE)),
            ),
            language: env::var("CAPTION_LANGUAGE")
                .unwrap_or_else(|_| String::from(defaults::CAPTION_LANGUAGE)),
            user_agent: env::var("CAPTION_USER_AGENT")
                .unwrap_or_else(|_| String::from(defaults::USER_AGENT)),
        }
    }
}

impl FetcherConfig {
    /// Ensures the temporary directory exists
    pub fn ensure_temp_dir(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.temp_dir)
    }
}

/// Decoding parameters used for every summary
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationConfig {
    /// Prepended to the input text before tokenization
    pub task_prefix: String,
    /// Input is truncated to this many tokens
    pub max_input_tokens: usize,
    /// Upper bound on the decoder sequence, start token included
    pub max_length: usize,
    /// The end-of-sequence token is suppressed below this length
    pub min_length: usize,
    pub num_beams: usize,
    /// 0 disables the constraint
    pub no_repeat_ngram_size: usize,
    /// 1.0 disables the penalty
    pub repetition_penalty: f32,
    pub length_penalty: f32,
    /// Stop once `num_beams` finished hypotheses exist
    pub early_stopping: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            task_prefix: String::from(defaults::TASK_PREFIX),
            max_input_tokens: defaults::MAX_INPUT_TOKENS,
            max_length: defaults::MAX_LENGTH,
            min_length: defaults::MIN_LENGTH,
            num_beams: defaults::NUM_BEAMS,
            no_repeat_ngram_size: defaults::NO_REPEAT_NGRAM_SIZE,
            repetition_penalty: defaults::REPETITION_PENALTY,
            length_penalty: defaults::LENGTH_PENALTY,
            early_stopping: defaults::EARLY_STOPPING,
        }
    }
}

/// HTTP server settings
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Number of actix workers, 0 means one per CPU core
    pub workers: usize,
    pub keep_alive: u64,
}

impl ServerConfig {
    /// Builds the server settings for the given port, reading the rest from the environment
    pub fn with_port(port: u16) -> Self {
        Self {
            host: String::from(defaults::HOST),
            port,
            workers: env::var("HTTP_WORKER_NUMBER")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
            keep_alive: env::var("CAPTION_SUMMARY_API_KEEPALIVE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults::KEEPALIVE_SECONDS),
        }
    }

    /// Effective worker count
    pub fn worker_count(&self) -> usize {
        if self.workers == 0 {
            num_cpus::get()
        } else {
            self.workers
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration for metrics collection and export
#[derive(Clone, Debug)]
pub struct MetricsConfig {
    /// Type of metrics exporter ("prometheus", "none")
    pub exporter_type: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        let metrics_enabled = env::var("METRICS_ENABLED")
            .ok()
            .and_then(|s| s.parse::<bool>().ok())
            .unwrap_or(true);

        if !metrics_enabled {
            return Self::new("disabled");
        }
        Self::new(&env::var("METRICS_BACKEND").unwrap_or_else(|_| "none".to_string()))
    }
}

impl MetricsConfig {
    /// Backend names are matched case-insensitively
    pub fn new(exporter_type: &str) -> Self {
        Self {
            exporter_type: exporter_type.trim().to_lowercase(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self.exporter_type.as_str(), "none" | "disabled")
    }
}
