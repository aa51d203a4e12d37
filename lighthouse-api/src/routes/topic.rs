//! Topic read endpoints.
//!
//! One `GET` route per configured adapter, returning the topic's current
//! snapshot: `{<topic>: <record or null>}` for single-record topics and
//! `{<topic>: [<record>, …]}` for grouped ones.

use axum::{extract::State, routing::get, Json, Router};
use lighthouse_core::{AgingCacheTarget, Snapshot, Target};
use std::sync::Arc;

use crate::error::ApiResult;
use crate::state::TopicRoute;

/// GET <rest_route> - Current fresh contents of one topic
pub async fn get_topic(State(target): State<Arc<AgingCacheTarget>>) -> ApiResult<Json<Snapshot>> {
    let snapshot = target.snapshot()?;
    Ok(Json(snapshot))
}

/// Create the router for one topic.
pub fn create_router(topic: &TopicRoute) -> Router {
    Router::new()
        .route(&topic.route, get(get_topic))
        .with_state(Arc::clone(&topic.target))
}
