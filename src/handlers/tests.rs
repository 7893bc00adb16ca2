use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use async_trait::async_trait;
use serde_json::{json, Value};

use super::{configure, cors_headers, fallback};
use crate::caption_fetcher::TranscriptSource;
use crate::config::GenerationConfig;
use crate::error::{FetchError, SummarizeError};
use crate::summarizer::{SummarizationService, TextSummarizer};
use crate::Metrics;

enum FakeOutcome {
    Transcript(&'static str),
    NoSubtitles,
    DownloadFails(&'static str),
}

struct FakeSource(FakeOutcome);

#[async_trait]
impl TranscriptSource for FakeSource {
    async fn fetch_transcript(&self, _url: &str) -> Result<String, FetchError> {
        match &self.0 {
            FakeOutcome::Transcript(t) => Ok(t.to_string()),
            FakeOutcome::NoSubtitles => Err(FetchError::NoSubtitles("en".to_string())),
            FakeOutcome::DownloadFails(m) => Err(FetchError::Download(m.to_string())),
        }
    }
}

/// Loaded-model stand-in returning a fixed summary or a generation failure
enum FakeSummarizer {
    Summary(&'static str),
    Fails(&'static str),
}

impl TextSummarizer for FakeSummarizer {
    fn summarize(&self, text: &str) -> Result<String, SummarizeError> {
        if text.trim().is_empty() {
            return Err(SummarizeError::EmptyInput);
        }
        match self {
            FakeSummarizer::Summary(s) => Ok(s.to_string()),
            FakeSummarizer::Fails(m) => Err(SummarizeError::Generation(m.to_string())),
        }
    }

    fn is_loaded(&self) -> bool {
        true
    }
}

fn source(outcome: FakeOutcome) -> Arc<dyn TranscriptSource> {
    Arc::new(FakeSource(outcome))
}

fn unloaded() -> Arc<dyn TextSummarizer> {
    Arc::new(SummarizationService::new(GenerationConfig::default()))
}

fn loaded(summary: &'static str) -> Arc<dyn TextSummarizer> {
    Arc::new(FakeSummarizer::Summary(summary))
}

fn failing(message: &'static str) -> Arc<dyn TextSummarizer> {
    Arc::new(FakeSummarizer::Fails(message))
}

macro_rules! test_app {
    ($source:expr, $summarizer:expr) => {
        test::init_service(
            App::new()
                .wrap(cors_headers())
                .app_data(web::Data::from($source))
                .app_data(web::Data::from($summarizer))
                .app_data(web::Data::new(Metrics::disabled()))
                .configure(configure)
                .default_service(web::route().to(fallback)),
        )
        .await
    };
}

fn post_json(path: &str, body: Value) -> test::TestRequest {
    test::TestRequest::post().uri(path).set_json(body)
}

#[actix_web::test]
async fn transcript_success_returns_text() {
    let app = test_app!(source(FakeOutcome::Transcript("Hello world again")), unloaded());
    let resp = test::call_service(&app, post_json("/get_transcript", json!({"url": "https://youtu.be/x"})).to_request()).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"status": "success", "transcript": "Hello world again"}));
}

#[actix_web::test]
async fn missing_captions_is_a_server_error() {
    let app = test_app!(source(FakeOutcome::NoSubtitles), unloaded());
    let resp = test::call_service(&app, post_json("/get_transcript", json!({"url": "https://youtu.be/x"})).to_request()).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "No subtitles found for this video (language: en)");
}

#[actix_web::test]
async fn download_failure_carries_tool_message() {
    let app = test_app!(source(FakeOutcome::DownloadFails("ERROR: Unsupported URL")), unloaded());
    let resp = test::call_service(&app, post_json("/get_transcript", json!({"url": "nope"})).to_request()).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Download failed: ERROR: Unsupported URL");
}

#[actix_web::test]
async fn transcript_request_is_validated() {
    let app = test_app!(source(FakeOutcome::Transcript("unused")), unloaded());

    let resp = test::call_service(&app, post_json("/get_transcript", json!({"url": "  "})).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"status": "error", "message": "No URL provided"}));

    let resp = test::call_service(&app, post_json("/get_transcript", json!({"link": "x"})).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "error");

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/get_transcript")
            .insert_header(("content-type", "text/plain"))
            .set_payload("url=x")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn empty_text_rejected_regardless_of_model_state() {
    for summarizer in [unloaded(), loaded("unused")] {
        let app = test_app!(source(FakeOutcome::NoSubtitles), summarizer);

        for body in [json!({"text": ""}), json!({})] {
            let resp = test::call_service(&app, post_json("/summarize", body).to_request()).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body, json!({"status": "error", "message": "No text provided"}));
        }
    }
}

#[actix_web::test]
async fn summarize_before_model_load_fails() {
    let app = test_app!(source(FakeOutcome::NoSubtitles), unloaded());
    let resp = test::call_service(&app, post_json("/summarize", json!({"text": "a long transcript"})).to_request()).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Model not loaded");
}

#[actix_web::test]
async fn summarize_returns_summary() {
    let app = test_app!(source(FakeOutcome::NoSubtitles), loaded("A short summary."));
    let resp = test::call_service(&app, post_json("/summarize", json!({"text": "a long transcript"})).to_request()).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"status": "success", "summary": "A short summary."}));
}

#[actix_web::test]
async fn generation_failure_is_a_server_error() {
    let app = test_app!(source(FakeOutcome::NoSubtitles), failing("out of memory"));
    let resp = test::call_service(&app, post_json("/summarize", json!({"text": "a long transcript"})).to_request()).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"status": "error", "message": "Generation failed: out of memory"}));
}

#[actix_web::test]
async fn health_reports_model_state() {
    for (summarizer, expected) in [(unloaded(), false), (loaded("x"), true)] {
        let app = test_app!(source(FakeOutcome::NoSubtitles), summarizer);
        let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"status": "ok", "model_loaded": expected}));
    }
}

#[actix_web::test]
async fn preflight_and_cors_headers() {
    let app = test_app!(source(FakeOutcome::NoSubtitles), unloaded());

    let resp = test::call_service(
        &app,
        test::TestRequest::default()
            .method(actix_web::http::Method::OPTIONS)
            .uri("/summarize")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("access-control-allow-methods"));
    assert_eq!(resp.headers().get("access-control-allow-origin").unwrap(), "*");

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.headers().get("access-control-allow-origin").unwrap(), "*");

    let resp = test::call_service(&app, test::TestRequest::get().uri("/nowhere").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
