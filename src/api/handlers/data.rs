use crate::api::routes::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

/// Latest snapshot, or 503 while the collector has not finished a cycle yet.
pub async fn get_latest(State(state): State<Arc<AppState>>) -> Response {
    match state.store.latest().await {
        Some(snapshot) => (StatusCode::OK, Json(snapshot.as_ref())).into_response(),
        None => {
            debug!("data requested before first collection");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "pending",
                    "error": "No data collected yet",
                })),
            )
                .into_response()
        }
    }
}
