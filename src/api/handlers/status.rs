use crate::api::routes::data_path;
use axum::response::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub endpoint: String,
}

/// Root endpoint: reports that the server is up and where the data lives.
/// Does not depend on a snapshot having been collected.
pub async fn status() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok",
        endpoint: data_path(),
    })
}
