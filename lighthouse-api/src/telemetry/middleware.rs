//! Axum Middleware for HTTP Request Tracing and Metrics
//!
//! Wraps every request with a tracing span, a completion log line and
//! Prometheus request metrics.

use axum::{extract::Request, middleware::Next, response::Response};
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Instant;
use tracing::{info_span, Instrument};

use super::metrics::with_metrics;

static NUMERIC_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/-?\d+(\.\d+)?(/|$)").expect("Invalid ID regex"));

/// Normalize path for metrics/spans (replace numeric arguments with a
/// placeholder).
///
/// Action routes carry node numbers in the path; without this each node
/// would get its own label set.
pub fn normalize_path(path: &str) -> String {
    // Two passes, so adjacent numeric segments share no separator.
    let once = NUMERIC_SEGMENT.replace_all(path, "/{n}$2");
    NUMERIC_SEGMENT.replace_all(&once, "/{n}$2").into_owned()
}

/// Observability middleware for Axum.
pub async fn observability_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let normalized_path = normalize_path(&path);

    let span = info_span!(
        "http_request",
        http.method = %method,
        http.target = %path,
        http.route = %normalized_path,
    );

    let response = next.run(request).instrument(span).await;

    let duration = start.elapsed();
    let status = response.status();

    with_metrics(|metrics| {
        metrics.record_http_request(
            method.as_str(),
            &normalized_path,
            status.as_u16(),
            duration.as_secs_f64(),
        )
    });

    tracing::info!(
        method = %method,
        path = %path,
        status = status.as_u16(),
        duration_ms = duration.as_millis(),
        "Request completed"
    );

    response
}
