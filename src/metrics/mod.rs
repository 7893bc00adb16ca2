//! Metrics for the Caption Summary API
//!
//! A small pluggable layer: handlers and services record through [`Metrics`], which forwards to
//! a Prometheus registry or to a no-op exporter when metrics are disabled.

pub mod null;
pub mod prometheus;

use async_trait::async_trait;
use log::{debug, warn};
use std::sync::Arc;

pub use self::null::NullExporter;
pub use self::prometheus::PrometheusExporter;

/// Metrics exporter trait for pluggable monitoring systems
#[async_trait]
pub trait MetricsExporter: Send + Sync {
    /// Increment a counter metric
    async fn increment(&self, name: &str, labels: &[(&str, &str)]);

    /// Set a gauge metric value
    async fn set_gauge(&self, name: &str, value: f64, labels: &[(&str, &str)]);

    /// Observe a value in a histogram metric
    async fn observe_histogram(&self, name: &str, value: f64, labels: &[(&str, &str)]);

    /// Export metrics in the format expected by the monitoring system
    async fn export(&self) -> Result<Vec<u8>, String>;
}

/// Metrics facade for the application
#[derive(Clone)]
pub struct Metrics {
    exporter: Arc<dyn MetricsExporter>,
}

impl Metrics {
    pub fn new(exporter: Arc<dyn MetricsExporter>) -> Self {
        Self { exporter }
    }

    /// Metrics that record nothing
    pub fn disabled() -> Self {
        Self::new(Arc::new(NullExporter))
    }

    pub async fn export(&self) -> Result<Vec<u8>, String> {
        self.exporter.export().await
    }

    /// Record HTTP request count and duration
    pub async fn record_http_request(&self, method: &str, endpoint: &str, status: u16, duration: f64) {
        let status = status.to_string();
        let labels = [("endpoint", endpoint), ("method", method), ("status", status.as_str())];
        self.exporter
            .observe_histogram("http_request_duration_seconds", duration, &labels)
            .await;
        self.exporter.increment("http_requests_total", &labels).await;
    }

    /// Record one transcript fetch; `outcome` is "success" or an error kind
    pub async fn record_transcript_fetch(&self, outcome: &str, duration: f64, chars: usize) {
        self.exporter
            .observe_histogram(
                "transcript_fetch_duration_seconds",
                duration,
                &[("outcome", outcome)],
            )
            .await;
        self.exporter
            .increment("transcript_fetches_total", &[("outcome", outcome)])
            .await;
        if outcome == "success" {
            self.exporter
                .observe_histogram("transcript_chars", chars as f64, &[])
                .await;
        }
    }

    /// Record one summarization call
    pub async fn record_summary(&self, outcome: &str, duration: f64) {
        self.exporter
            .observe_histogram(
                "summary_duration_seconds",
                duration,
                &[("outcome", outcome)],
            )
            .await;
        self.exporter
            .increment("summaries_total", &[("outcome", outcome)])
            .await;
    }

    /// Publish whether the model is ready
    pub async fn set_model_loaded(&self, loaded: bool) {
        self.exporter
            .set_gauge("model_loaded", if loaded { 1.0 } else { 0.0 }, &[])
            .await;
    }
}

/// Factory function to create metrics exporter based on configuration
pub fn create_metrics_exporter(exporter_type: &str) -> Arc<dyn MetricsExporter> {
    match exporter_type.to_lowercase().as_str() {
        "prometheus" => {
            debug!("Initializing Prometheus metrics exporter");
            Arc::new(PrometheusExporter::new())
        }
        "none" | "disabled" => {
            debug!("Metrics disabled, using null exporter");
            Arc::new(NullExporter)
        }
        _ => {
            warn!(
                "Unknown metrics exporter type '{}', using null exporter",
                exporter_type
            );
            Arc::new(NullExporter)
        }
    }
}
