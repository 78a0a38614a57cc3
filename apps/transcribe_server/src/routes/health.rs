use axum::http::StatusCode;
use axum::response::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
	status: &'static str,
}

/// `GET /health` — unauthenticated, per spec.md §4.G.
pub async fn health() -> (StatusCode, Json<HealthResponse>) {
	(StatusCode::OK, Json(HealthResponse { status: "ok" }))
}
