// Caption Summary API data models
//
// This module contains the request and response types used across the API.

use serde::{Deserialize, Serialize};

/// Outcome tag carried by every response body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
    Ok,
}

/// Body of `POST /get_transcript`
#[derive(Debug, Deserialize)]
pub struct TranscriptRequest {
    /// Video URL handed to the download tool
    pub url: String,
}

/// Body of `POST /summarize`
#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    /// Text to summarize; a missing field reads as empty
    #[serde(default)]
    pub text: String,
}

/// Successful transcript fetch
#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub status: ResponseStatus,
    pub transcript: String,
}

impl TranscriptResponse {
    pub fn new(transcript: String) -> Self {
        Self {
            status: ResponseStatus::Success,
            transcript,
        }
    }
}

/// Successful summarization
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub status: ResponseStatus,
    pub summary: String,
}

impl SummaryResponse {
    pub fn new(summary: String) -> Self {
        Self {
            status: ResponseStatus::Success,
            summary,
        }
    }
}

/// Error envelope for API
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: ResponseStatus,
    /// Error message
    pub message: String,
}

impl ErrorResponse {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            status: ResponseStatus::Error,
            message: message.into(),
        }
    }
}

/// Response for `GET /health`
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: ResponseStatus,
    pub model_loaded: bool,
}

impl HealthResponse {
    pub fn new(model_loaded: bool) -> Self {
        Self {
            status: ResponseStatus::Ok,
            model_loaded,
        }
    }
}
