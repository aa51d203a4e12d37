//! Action invocation endpoints.
//!
//! Each registered action is mounted at its route template, e.g.
//! `/power_on/:node_number`. Path segments and query-string parameters are
//! merged into one argument map before dispatch, so a stray `?foo=1` is
//! reported as an unexpected argument rather than ignored.
//!
//! Responses carry the dispatch envelope: `200` when the handler ran,
//! `500` for application errors.

use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use lighthouse_core::{Action, ActionRegistry};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::error::{ApiError, ApiResult};
use crate::telemetry::metrics::with_metrics;

// ============================================================================
// STATE
// ============================================================================

#[derive(Clone)]
pub struct ActionRouteState {
    pub registry: Arc<ActionRegistry>,
    pub action: String,
}

// ============================================================================
// HANDLERS
// ============================================================================

/// GET <rest_route>/<arg>... - Invoke an action with path arguments
pub async fn invoke_with_path(
    State(state): State<ActionRouteState>,
    OriginalUri(uri): OriginalUri,
    Path(path): Path<HashMap<String, String>>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Response> {
    let mut raw = query;
    raw.extend(path);
    invoke(&state, uri.path(), raw).await
}

/// GET <rest_route> - Invoke an action that declares no arguments
pub async fn invoke_without_path(
    State(state): State<ActionRouteState>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Response> {
    invoke(&state, uri.path(), query).await
}

async fn invoke(
    state: &ActionRouteState,
    path: &str,
    raw: HashMap<String, String>,
) -> ApiResult<Response> {
    let action = state
        .registry
        .get(&state.action)
        .ok_or_else(|| ApiError::action_not_found(&state.action))?;

    // A value of the wrong type means this route does not match.
    let args = action.parse_arguments(&raw).map_err(|e| {
        tracing::debug!(
            action = %action.name,
            argument = %e.name,
            expected = %e.expected,
            raw = %e.raw,
            "Argument does not parse as declared type"
        );
        ApiError::route_not_found(path)
    })?;

    let start = Instant::now();
    let envelope = state.registry.invoke(&action.name, args).await?;
    let elapsed = start.elapsed();

    with_metrics(|m| m.record_action(&action.name, &envelope.status, elapsed.as_secs_f64()));
    tracing::info!(
        action = %action.name,
        status = %envelope.status,
        duration_ms = elapsed.as_millis(),
        "Action invoked"
    );

    let status = if envelope.is_success() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    Ok((status, Json(envelope)).into_response())
}

// ============================================================================
// ROUTER
// ============================================================================

/// Create the router for one action.
pub fn create_router(registry: Arc<ActionRegistry>, action: &Action) -> Router {
    let state = ActionRouteState {
        registry,
        action: action.name.clone(),
    };
    let route = action.route_template();

    if action.arguments.is_empty() {
        Router::new()
            .route(&route, get(invoke_without_path))
            .with_state(state)
    } else {
        Router::new()
            .route(&route, get(invoke_with_path))
            .with_state(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use lighthouse_core::HandlerCatalog;
    use lighthouse_test_utils::fixtures::power_on_action;
    use lighthouse_test_utils::StaticHandler;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

    fn router() -> TestResult<(Router, Arc<StaticHandler>)> {
        let handler = Arc::new(StaticHandler::new(1, json!({"result": "success"})));
        let catalog = HandlerCatalog::new().with("power_on", handler.clone());
        let mut registry = ActionRegistry::new(catalog);
        let action = power_on_action();
        registry.register(action.clone())?;
        Ok((create_router(Arc::new(registry), &action), handler))
    }

    async fn get_json(router: Router, uri: &str) -> TestResult<(StatusCode, Value)> {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty())?)
            .await?;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        Ok((status, serde_json::from_slice(&bytes)?))
    }

    #[tokio::test]
    async fn test_int_argument_reaches_handler() -> TestResult {
        let (router, handler) = router()?;
        let (status, body) = get_json(router, "/power_on/3").await?;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "OK", "response": {"result": "success"}}));
        assert_eq!(handler.calls(), vec![vec![lighthouse_core::ArgValue::Int(3)]]);
        Ok(())
    }

    #[tokio::test]
    async fn test_non_integer_argument_is_not_found() -> TestResult {
        let (router, handler) = router()?;
        let (status, body) = get_json(router, "/power_on/three").await?;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], json!("ROUTE_NOT_FOUND"));
        assert!(handler.calls().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_query_parameter_is_unexpected_argument() -> TestResult {
        let (router, handler) = router()?;
        let (status, body) = get_json(router, "/power_on/3?foo=1").await?;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({"status": "application error", "response": "unexpected argument"})
        );
        assert!(handler.calls().is_empty());
        Ok(())
    }
}
