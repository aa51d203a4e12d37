//! Lighthouse Telemetry - Observability Infrastructure
//!
//! Structured logging through `tracing`, plus Prometheus metrics for the
//! HTTP layer, the collector and action dispatch.

pub mod logging;
pub mod metrics;
pub mod middleware;

pub use logging::{init_logging, LogFormat};
pub use metrics::{metrics_handler, with_metrics, LighthouseMetrics, METRICS};
pub use middleware::observability_middleware;
