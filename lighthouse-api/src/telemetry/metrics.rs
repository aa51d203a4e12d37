//! Prometheus Metrics Definitions
//!
//! Defines the Lighthouse metrics and the `/metrics` scrape handler.

use axum::{http::StatusCode, response::IntoResponse};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge_vec, register_histogram_vec, CounterVec, Encoder,
    GaugeVec, HistogramVec, TextEncoder,
};

use crate::error::{ApiError, ApiResult};

/// HTTP request latency buckets (seconds)
/// Covers: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 2.5s, 5s, 10s
const HTTP_LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0,
];

/// Action handler latency buckets (seconds); handlers may shell out.
const ACTION_LATENCY_BUCKETS: &[f64] = &[0.005, 0.025, 0.100, 0.500, 1.0, 5.0, 15.0, 60.0];

fn registration_error(name: &str, e: prometheus::Error) -> ApiError {
    ApiError::internal_error(format!("Failed to register {}: {}", name, e))
}

/// Global metrics instance - initialized once at startup
pub static METRICS: Lazy<ApiResult<LighthouseMetrics>> = Lazy::new(LighthouseMetrics::new);

/// Run `f` against the global metrics if they registered successfully.
pub fn with_metrics(f: impl FnOnce(&LighthouseMetrics)) {
    if let Ok(metrics) = METRICS.as_ref() {
        f(metrics);
    }
}

/// Container for all Lighthouse metrics.
#[derive(Clone)]
pub struct LighthouseMetrics {
    /// HTTP request counter - labels: method, path, status
    pub http_requests_total: CounterVec,

    /// HTTP request duration histogram - labels: method, path
    pub http_request_duration_seconds: HistogramVec,

    /// Records moved into topic caches - labels: adapter
    pub collector_records_total: CounterVec,

    /// Collector tick failures - labels: adapter, kind (source/feed)
    pub collector_errors_total: CounterVec,

    /// Action invocations - labels: action, status
    pub action_invocations_total: CounterVec,

    /// Action handler duration - labels: action
    pub action_duration_seconds: HistogramVec,

    /// Fresh records per topic at last readiness check - labels: topic
    pub topic_fresh_records: GaugeVec,
}

impl LighthouseMetrics {
    /// Create and register all metrics with Prometheus.
    pub fn new() -> ApiResult<Self> {
        Ok(Self {
            http_requests_total: register_counter_vec!(
                "lighthouse_http_requests_total",
                "Total number of HTTP requests",
                &["method", "path", "status"]
            )
            .map_err(|e| registration_error("http_requests_total", e))?,

            http_request_duration_seconds: register_histogram_vec!(
                "lighthouse_http_request_duration_seconds",
                "HTTP request duration in seconds",
                &["method", "path"],
                HTTP_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| registration_error("http_request_duration_seconds", e))?,

            collector_records_total: register_counter_vec!(
                "lighthouse_collector_records_total",
                "Records delivered from queues into topic caches",
                &["adapter"]
            )
            .map_err(|e| registration_error("collector_records_total", e))?,

            collector_errors_total: register_counter_vec!(
                "lighthouse_collector_errors_total",
                "Collector tick failures",
                &["adapter", "kind"]
            )
            .map_err(|e| registration_error("collector_errors_total", e))?,

            action_invocations_total: register_counter_vec!(
                "lighthouse_action_invocations_total",
                "Action invocations by outcome",
                &["action", "status"]
            )
            .map_err(|e| registration_error("action_invocations_total", e))?,

            action_duration_seconds: register_histogram_vec!(
                "lighthouse_action_duration_seconds",
                "Action dispatch duration in seconds",
                &["action"],
                ACTION_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| registration_error("action_duration_seconds", e))?,

            topic_fresh_records: register_gauge_vec!(
                "lighthouse_topic_fresh_records",
                "Records currently visible per topic",
                &["topic"]
            )
            .map_err(|e| registration_error("topic_fresh_records", e))?,
        })
    }

    /// Record an HTTP request.
    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, path, &status_str])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }

    pub fn record_delivery(&self, adapter: &str) {
        self.collector_records_total.with_label_values(&[adapter]).inc();
    }

    /// `kind` is `source` or `feed`.
    pub fn record_collector_error(&self, adapter: &str, kind: &str) {
        self.collector_errors_total
            .with_label_values(&[adapter, kind])
            .inc();
    }

    pub fn record_action(&self, action: &str, status: &str, duration_secs: f64) {
        self.action_invocations_total
            .with_label_values(&[action, status])
            .inc();
        self.action_duration_seconds
            .with_label_values(&[action])
            .observe(duration_secs);
    }

    pub fn set_topic_fresh_records(&self, topic: &str, count: usize) {
        self.topic_fresh_records
            .with_label_values(&[topic])
            .set(count as f64);
    }
}

/// Handler for GET /metrics endpoint.
///
/// Returns Prometheus text format metrics.
pub async fn metrics_handler() -> impl IntoResponse {
    // Register ours before gathering, even if nothing has been recorded yet.
    Lazy::force(&METRICS);

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                format!("Failed to encode metrics: {}", e).into_bytes(),
            )
        }
    }
}
