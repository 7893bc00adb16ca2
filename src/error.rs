// Error handling for the Caption Summary API
//
// This module defines error types and handling for the API.
// It centralizes error definitions and provides helpful conversion traits.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use actix_web::{http::StatusCode, HttpResponse, ResponseError};

use crate::models::ErrorResponse;

/// Errors raised while acquiring a transcript
#[derive(Error, Debug)]
pub enum FetchError {
    /// The download tool failed; carries the tool's own message
    #[error("Download failed: {0}")]
    Download(String),

    /// The tool ran but produced no caption file
    #[error("No subtitles found for this video (language: {0})")]
    NoSubtitles(String),

    /// Reading the caption file failed
    #[error("Failed to read caption file: {0}")]
    Io(#[from] io::Error),
}

impl FetchError {
    /// Short label used in metrics
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Download(_) => "download_error",
            FetchError::NoSubtitles(_) => "no_subtitles",
            FetchError::Io(_) => "io_error",
        }
    }
}

/// Errors raised by the summarization service
#[derive(Error, Debug)]
pub enum SummarizeError {
    #[error("No text provided")]
    EmptyInput,

    #[error("Model not loaded")]
    ModelNotLoaded,

    /// Encode, generate or decode failed
    #[error("Generation failed: {0}")]
    Generation(String),
}

impl SummarizeError {
    /// Short label used in metrics
    pub fn kind(&self) -> &'static str {
        match self {
            SummarizeError::EmptyInput => "empty_input",
            SummarizeError::ModelNotLoaded => "model_not_loaded",
            SummarizeError::Generation(_) => "generation_error",
        }
    }
}

impl From<candle_core::Error> for SummarizeError {
    fn from(err: candle_core::Error) -> Self {
        SummarizeError::Generation(err.to_string())
    }
}

/// Errors raised while loading the model at startup. All of them are fatal.
#[derive(Error, Debug)]
pub enum ModelLoadError {
    #[error("Required model file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Failed to read model files: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid model config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Failed to load model weights: {0}")]
    Candle(#[from] candle_core::Error),

    #[error("Failed to load tokenizer: {0}")]
    Tokenizer(String),

    #[error("Model already loaded")]
    AlreadyLoaded,
}

/// Errors that can occur in the API handlers
#[derive(Error, Debug)]
pub enum HandlerError {
    /// Malformed or incomplete request body
    #[error("{0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Summarize(#[from] SummarizeError),

    /// Failure outside the service taxonomy (e.g. the blocking pool went away)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    /// Create a new InvalidRequest error
    pub fn invalid_request<S: Into<String>>(msg: S) -> Self {
        Self::InvalidRequest(msg.into())
    }
}

impl ResponseError for HandlerError {
    fn status_code(&self) -> StatusCode {
        match self {
            HandlerError::InvalidRequest(_)
            | HandlerError::Summarize(SummarizeError::EmptyInput) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse::new(self.to_string()))
    }
}

impl From<actix_web::error::BlockingError> for HandlerError {
    fn from(err: actix_web::error::BlockingError) -> Self {
        HandlerError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_json(err: HandlerError) -> (StatusCode, serde_json::Value) {
        let response = err.error_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[actix_web::test]
    async fn empty_input_is_a_bad_request() {
        let (status, body) = body_json(SummarizeError::EmptyInput.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "No text provided");
    }

    #[actix_web::test]
    async fn backend_failures_are_server_errors() {
        let (status, body) = body_json(SummarizeError::ModelNotLoaded.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Model not loaded");

        let (status, body) =
            body_json(FetchError::NoSubtitles("en".to_string()).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body["message"],
            "No subtitles found for this video (language: en)"
        );
    }

    #[test]
    fn download_error_keeps_tool_message() {
        let err = FetchError::Download("ERROR: [youtube] abc: Video unavailable".to_string());
        assert_eq!(
            err.to_string(),
            "Download failed: ERROR: [youtube] abc: Video unavailable"
        );
    }

    #[actix_web::test]
    async fn invalid_request_message_is_passed_through() {
        let (status, body) = body_json(HandlerError::invalid_request("No URL provided")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "No URL provided");
    }
}
