// API route handlers for the Caption Summary API
//
// This module contains the route handlers for the API.
// It maps JSON requests onto the caption fetcher and the summarization service.

use crate::caption_fetcher::TranscriptSource;
use crate::error::HandlerError;
use crate::models::{
    ErrorResponse, HealthResponse, SummarizeRequest, SummaryResponse, TranscriptRequest,
    TranscriptResponse,
};
use crate::summarizer::TextSummarizer;
use crate::Metrics;
use actix_web::{get, post, web, HttpResponse, ResponseError};
use log::{error, info};
use std::sync::Arc;
use std::time::Instant;

/// Record the HTTP metrics of a finished request and hand the result back
async fn finish(
    metrics: &Metrics,
    method: &str,
    endpoint: &str,
    start_time: Instant,
    result: Result<HttpResponse, HandlerError>,
) -> Result<HttpResponse, HandlerError> {
    let status = match &result {
        Ok(response) => response.status().as_u16(),
        Err(e) => e.status_code().as_u16(),
    };
    metrics
        .record_http_request(method, endpoint, status, start_time.elapsed().as_secs_f64())
        .await;
    result
}

async fn fetch_transcript(
    url: &str,
    source: &dyn TranscriptSource,
    metrics: &Metrics,
) -> Result<HttpResponse, HandlerError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(HandlerError::invalid_request("No URL provided"));
    }

    info!("Fetching transcript for: {}", url);
    let start_time = Instant::now();
    let outcome = source.fetch_transcript(url).await;
    let elapsed = start_time.elapsed().as_secs_f64();

    match outcome {
        Ok(transcript) => {
            metrics
                .record_transcript_fetch("success", elapsed, transcript.len())
                .await;
            info!("Success! Extracted {} chars", transcript.len());
            Ok(HttpResponse::Ok().json(TranscriptResponse::new(transcript)))
        }
        Err(e) => {
            metrics.record_transcript_fetch(e.kind(), elapsed, 0).await;
            error!("Transcript fetch failed for {}: {}", url, e);
            Err(e.into())
        }
    }
}

async fn run_summary(
    text: String,
    summarizer: Arc<dyn TextSummarizer>,
    metrics: &Metrics,
) -> Result<HttpResponse, HandlerError> {
    let start_time = Instant::now();
    let outcome = web::block(move || summarizer.summarize(&text)).await?;
    let elapsed = start_time.elapsed().as_secs_f64();

    match outcome {
        Ok(summary) => {
            metrics.record_summary("success", elapsed).await;
            Ok(HttpResponse::Ok().json(SummaryResponse::new(summary)))
        }
        Err(e) => {
            metrics.record_summary(e.kind(), elapsed).await;
            error!("Summarization failed: {}", e);
            Err(e.into())
        }
    }
}

/// Handler for transcript requests
///
/// Downloads the caption track of `url` and returns it as one flattened string.
#[post("/get_transcript")]
pub async fn get_transcript(
    body: web::Json<TranscriptRequest>,
    source: web::Data<dyn TranscriptSource>,
    metrics: web::Data<Metrics>,
) -> Result<HttpResponse, HandlerError> {
    let start_time = Instant::now();
    let result = fetch_transcript(&body.url, source.get_ref(), &metrics).await;
    finish(&metrics, "POST", "/get_transcript", start_time, result).await
}

/// Handler for summarization requests
///
/// Generation is compute bound, so it runs on the blocking thread pool.
#[post("/summarize")]
pub async fn summarize(
    body: web::Json<SummarizeRequest>,
    summarizer: web::Data<dyn TextSummarizer>,
    metrics: web::Data<Metrics>,
) -> Result<HttpResponse, HandlerError> {
    let start_time = Instant::now();
    let result = run_summary(body.into_inner().text, summarizer.into_inner(), &metrics).await;
    finish(&metrics, "POST", "/summarize", start_time, result).await
}

/// Health check; always 200 and side-effect free
#[get("/health")]
pub async fn health(summarizer: web::Data<dyn TextSummarizer>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse::new(summarizer.is_loaded()))
}

/// Metrics endpoint handler
pub async fn metrics_handler(metrics: web::Data<Metrics>) -> HttpResponse {
    match metrics.export().await {
        Ok(data) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4; charset=utf-8")
            .body(data),
        Err(e) => HttpResponse::InternalServerError()
            .json(ErrorResponse::new(format!("Failed to export metrics: {}", e))),
    }
}
