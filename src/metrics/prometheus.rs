/// Prometheus metrics exporter implementation
///
/// Metric families are created lazily on first use and registered in a private registry,
/// exported in the Prometheus text format by `GET /metrics`.
use crate::metrics::MetricsExporter;
use async_trait::async_trait;
use log::{debug, warn};
use prometheus::{
    CounterVec, Encoder, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Prometheus implementation of MetricsExporter
pub struct PrometheusExporter {
    registry: Registry,
    counters: Mutex<HashMap<String, CounterVec>>,
    gauges: Mutex<HashMap<String, GaugeVec>>,
    histograms: Mutex<HashMap<String, HistogramVec>>,
}

impl Default for PrometheusExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl PrometheusExporter {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            counters: Mutex::new(HashMap::new()),
            gauges: Mutex::new(HashMap::new()),
            histograms: Mutex::new(HashMap::new()),
        }
    }

    async fn counter(&self, name: &str, label_names: &[&str]) -> Option<CounterVec> {
        let mut counters = self.counters.lock().await;
        if let Some(counter) = counters.get(name) {
            return Some(counter.clone());
        }

        let counter = match CounterVec::new(Opts::new(name, "Counter metric"), label_names) {
            Ok(counter) => counter,
            Err(e) => {
                warn!("Invalid counter metric {}: {}", name, e);
                return None;
            }
        };
        if let Err(e) = self.registry.register(Box::new(counter.clone())) {
            warn!("Failed to register counter metric {}: {}", name, e);
        }

        counters.insert(name.to_string(), counter.clone());
        Some(counter)
    }

    async fn gauge(&self, name: &str, label_names: &[&str]) -> Option<GaugeVec> {
        let mut gauges = self.gauges.lock().await;
        if let Some(gauge) = gauges.get(name) {
            return Some(gauge.clone());
        }

        let gauge = match GaugeVec::new(Opts::new(name, "Gauge metric"), label_names) {
            Ok(gauge) => gauge,
            Err(e) => {
                warn!("Invalid gauge metric {}: {}", name, e);
                return None;
            }
        };
        if let Err(e) = self.registry.register(Box::new(gauge.clone())) {
            warn!("Failed to register gauge metric {}: {}", name, e);
        }

        gauges.insert(name.to_string(), gauge.clone());
        Some(gauge)
    }

    async fn histogram(&self, name: &str, label_names: &[&str]) -> Option<HistogramVec> {
        let mut histograms = self.histograms.lock().await;
        if let Some(histogram) = histograms.get(name) {
            return Some(histogram.clone());
        }

        let opts = HistogramOpts::new(name, "Histogram metric");
        let histogram = match HistogramVec::new(opts, label_names) {
            Ok(histogram) => histogram,
            Err(e) => {
                warn!("Invalid histogram metric {}: {}", name, e);
                return None;
            }
        };
        if let Err(e) = self.registry.register(Box::new(histogram.clone())) {
            warn!("Failed to register histogram metric {}: {}", name, e);
        }

        histograms.insert(name.to_string(), histogram.clone());
        Some(histogram)
    }

    fn split_labels<'a>(labels: &'a [(&'a str, &'a str)]) -> (Vec<&'a str>, Vec<&'a str>) {
        labels.iter().map(|(k, v)| (*k, *v)).unzip()
    }
}

#[async_trait]
impl MetricsExporter for PrometheusExporter {
    async fn increment(&self, name: &str, labels: &[(&str, &str)]) {
        let (names, values) = Self::split_labels(labels);
        if let Some(counter) = self.counter(name, &names).await {
            match counter.get_metric_with_label_values(&values) {
                Ok(metric) => metric.inc(),
                Err(e) => warn!("Failed to increment {}: {}", name, e),
            }
        }
        debug!("Incremented counter {} with labels {:?}", name, labels);
    }

    async fn set_gauge(&self, name: &str, value: f64, labels: &[(&str, &str)]) {
        let (names, values) = Self::split_labels(labels);
        if let Some(gauge) = self.gauge(name, &names).await {
            match gauge.get_metric_with_label_values(&values) {
                Ok(metric) => metric.set(value),
                Err(e) => warn!("Failed to set gauge {}: {}", name, e),
            }
        }
    }

    async fn observe_histogram(&self, name: &str, value: f64, labels: &[(&str, &str)]) {
        let (names, values) = Self::split_labels(labels);
        if let Some(histogram) = self.histogram(name, &names).await {
            match histogram.get_metric_with_label_values(&values) {
                Ok(metric) => metric.observe(value),
                Err(e) => warn!("Failed to observe histogram {}: {}", name, e),
            }
        }
    }

    async fn export(&self) -> Result<Vec<u8>, String> {
        let mut buffer = vec![];
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| format!("Failed to encode metrics: {}", e))?;
        Ok(buffer)
    }
}
