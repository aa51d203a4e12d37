//! Health Check Endpoints
//!
//! Provides Kubernetes-compatible health check endpoints:
//! - /health/ping - Simple liveness check
//! - /health/live - Process alive check
//! - /health/ready - Collector running, with per-topic freshness counts

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use chrono::Utc;
use lighthouse_core::Target;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::jobs::{CollectorSnapshot, CollectorState};
use crate::state::ServerContext;
use crate::telemetry::metrics::with_metrics;

// ============================================================================
// TYPES
// ============================================================================

/// Health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HealthDetails>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    Degraded,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthDetails {
    pub collector: CollectorHealth,
    pub topics: Vec<TopicHealth>,
    pub actions: usize,
    pub version: String,
    pub uptime_seconds: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectorHealth {
    pub state: CollectorState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counters: Option<CollectorSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopicHealth {
    pub topic: String,
    pub route: String,
    /// Records a read would return right now
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fresh_records: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// HANDLERS
// ============================================================================

/// GET /health/ping - Simple pong response
pub async fn ping() -> impl IntoResponse {
    (StatusCode::OK, "pong")
}

/// GET /health/live - Process liveness check
pub async fn liveness() -> impl IntoResponse {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        message: Some("Process is alive".to_string()),
        details: None,
    };
    (StatusCode::OK, Json(response))
}

/// GET /health/ready - Readiness check
///
/// Unhealthy while the collector is not running, degraded if a topic cache
/// cannot be read.
pub async fn readiness(State(context): State<Arc<ServerContext>>) -> impl IntoResponse {
    let topics: Vec<TopicHealth> = context
        .topics
        .iter()
        .map(|topic| {
            let name = topic.target.topic().to_string();
            match topic.target.fresh_count() {
                Ok(count) => {
                    with_metrics(|m| m.set_topic_fresh_records(&name, count));
                    TopicHealth {
                        topic: name,
                        route: topic.route.clone(),
                        fresh_records: Some(count),
                        error: None,
                    }
                }
                Err(e) => TopicHealth {
                    topic: name,
                    route: topic.route.clone(),
                    fresh_records: None,
                    error: Some(e.to_string()),
                },
            }
        })
        .collect();

    let collector = CollectorHealth {
        state: context.collector_state(),
        counters: context.collector().map(|metrics| metrics.snapshot()),
    };

    let overall_status = if collector.state != CollectorState::Running {
        HealthStatus::Unhealthy
    } else if topics.iter().any(|t| t.error.is_some()) {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    };

    let uptime_seconds = Utc::now()
        .signed_duration_since(context.started_at)
        .num_seconds()
        .max(0) as u64;

    let response = HealthResponse {
        status: overall_status,
        message: None,
        details: Some(HealthDetails {
            collector,
            topics,
            actions: context.registry.len(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds,
        }),
    };

    let status_code = if overall_status == HealthStatus::Unhealthy {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (status_code, Json(response))
}

// ============================================================================
// ROUTER
// ============================================================================

/// Create health check router
pub fn create_router(context: Arc<ServerContext>) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
        .with_state(context)
}
