//! REST API Routes Module
//!
//! Routes are built from the server context at startup:
//! - one read route per topic (`topic`)
//! - one invocation route per declared action (`action`)
//! - health check endpoints (Kubernetes-compatible)
//! - Prometheus `/metrics`
//!
//! Every response passes through the CORS layer and allows any origin.

pub mod action;
pub mod health;
pub mod topic;

use std::sync::Arc;

use axum::{
    extract::OriginalUri,
    http::{header, Method},
    middleware::from_fn,
    response::IntoResponse,
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::state::ServerContext;
use crate::telemetry::{metrics_handler, observability_middleware};

/// Build the full application router.
pub fn build_router(context: Arc<ServerContext>) -> Router {
    let mut router = Router::new()
        .nest("/health", health::create_router(Arc::clone(&context)))
        .route("/metrics", get(metrics_handler));

    for topic in &context.topics {
        router = router.merge(topic::create_router(topic));
    }
    for action in context.registry.actions() {
        router = router.merge(action::create_router(Arc::clone(&context.registry), action));
    }

    // Execution order: CORS -> Trace -> Observability -> Handler
    router
        .fallback(fallback)
        .layer(from_fn(observability_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
}

/// CORS layer allowing any origin.
fn build_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}

async fn fallback(OriginalUri(uri): OriginalUri) -> impl IntoResponse {
    ApiError::route_not_found(uri.path())
}
