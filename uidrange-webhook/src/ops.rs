//! Plain HTTP ops surface
//!
//! Probes for the kubelet plus read-only views of the allocator and of the
//! range annotations currently stored on namespaces.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tower_http::trace::TraceLayer;
use uidrange_common::{AllocatorStatus, RangeRecord};

use crate::error::ApiError;
use crate::health::{LivenessResponse, ReadinessResponse};
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/api/v1/ranges", get(list_ranges))
        .route("/api/v1/ranges/:namespace", get(get_range))
        .route("/api/v1/allocator", get(allocator))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz(State(state): State<Arc<AppState>>) -> Json<LivenessResponse> {
    Json(state.health.liveness())
}

async fn readyz(State(state): State<Arc<AppState>>) -> (StatusCode, Json<ReadinessResponse>) {
    let response = state.health.readiness(&state.tracker);
    let status = if response.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}

async fn list_ranges(State(state): State<Arc<AppState>>) -> Result<Json<Vec<RangeRecord>>, ApiError> {
    let namespaces = state.store.list().await?;

    let records = namespaces
        .iter()
        .map(|ns| RangeRecord::from_annotations(&ns.name, &ns.annotations))
        .collect();

    Ok(Json(records))
}

async fn get_range(
    State(state): State<Arc<AppState>>,
    Path(namespace): Path<String>,
) -> Result<Json<RangeRecord>, ApiError> {
    let annotations = state
        .store
        .get(&namespace)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Namespace '{}' not found", namespace)))?;

    Ok(Json(RangeRecord::from_annotations(namespace, &annotations)))
}

async fn allocator(State(state): State<Arc<AppState>>) -> Json<AllocatorStatus> {
    Json(AllocatorStatus::new(state.tracker.next_start()))
}
