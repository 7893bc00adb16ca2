//! Summarization Service
//!
//! Owns the once-loaded [`ModelHandle`] and turns arbitrary text into a summary with the
//! configured beam search settings. The handle is set at most once and never replaced.

pub mod generation;
pub mod model;

use log::info;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use crate::config::GenerationConfig;
use crate::error::{ModelLoadError, SummarizeError};

pub use self::model::ModelHandle;

/// Anything able to summarize text; used by the HTTP handlers
pub trait TextSummarizer: Send + Sync {
    fn summarize(&self, text: &str) -> Result<String, SummarizeError>;

    fn is_loaded(&self) -> bool;
}

/// Service wrapping the T5 model
pub struct SummarizationService {
    // decoding mutates candle's internal caches, so calls are serialized
    model: OnceLock<Mutex<ModelHandle>>,
    generation: GenerationConfig,
}

impl SummarizationService {
    /// Create a service with no model; every summary fails until [`load_model`](Self::load_model)
    pub fn new(generation: GenerationConfig) -> Self {
        Self {
            model: OnceLock::new(),
            generation,
        }
    }

    /// Load the model from `path`. Fails if loading fails or a model is already present.
    pub fn load_model(&self, path: &Path) -> Result<(), ModelLoadError> {
        if self.model.get().is_some() {
            return Err(ModelLoadError::AlreadyLoaded);
        }
        let handle = ModelHandle::load(path)?;
        self.model
            .set(Mutex::new(handle))
            .map_err(|_| ModelLoadError::AlreadyLoaded)
    }
}

impl TextSummarizer for SummarizationService {
    fn summarize(&self, text: &str) -> Result<String, SummarizeError> {
        if text.trim().is_empty() {
            return Err(SummarizeError::EmptyInput);
        }
        let model = self.model.get().ok_or(SummarizeError::ModelNotLoaded)?;

        info!("Summarizing text ({} chars)...", text.len());
        let prompt = format!("{}{}", self.generation.task_prefix, text);

        let mut handle = model
            .lock()
            .map_err(|_| SummarizeError::Generation("model lock poisoned".to_string()))?;
        let summary = handle.generate(&prompt, &self.generation)?;

        info!("Summary generated ({} chars)", summary.len());
        Ok(summary)
    }

    fn is_loaded(&self) -> bool {
        self.model.get().is_some()
    }
}
