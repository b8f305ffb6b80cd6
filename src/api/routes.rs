use crate::api::handlers::{data, health, status};
use crate::distribute::SnapshotStore;
use axum::{extract::Request, routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::Level;

/// Name of the single data source exposed under `/data/<name>`.
pub const SOURCE_NAME: &str = "evcc";

pub fn data_path() -> String {
    format!("/data/{}", SOURCE_NAME)
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub store: SnapshotStore,
}

impl AppState {
    pub fn new(store: SnapshotStore) -> Self {
        Self { store }
    }
}

pub fn create_router(store: SnapshotStore) -> Router {
    let state = Arc::new(AppState::new(store));

    Router::new()
        .route("/", get(status::status))
        .route("/health", get(health::health))
        .route(&data_path(), get(data::get_latest))
        .route(&format!("{}/", data_path()), get(data::get_latest))
        .with_state(state)
        .layer(tower_http::cors::CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request| {
                    tracing::span!(
                        Level::INFO,
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                    )
                })
                .on_request(|_request: &Request, _span: &tracing::Span| {
                    tracing::event!(Level::DEBUG, "received request");
                })
                .on_response(
                    |response: &axum::response::Response,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        tracing::event!(
                            Level::DEBUG,
                            status = response.status().as_u16(),
                            latency = ?latency,
                            "request completed"
                        );
                    },
                ),
        )
}
