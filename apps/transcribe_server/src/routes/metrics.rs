use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{Encoder, TextEncoder};

use crate::state::AppState;

/// `GET /metrics` — unauthenticated, Prometheus text exposition. Ops-only
/// surface, additive to the three endpoints spec.md §4.G specifies.
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
	let encoder = TextEncoder::new();
	let metric_families = state.registry.gather();
	let mut buffer = Vec::new();
	match encoder.encode(&metric_families, &mut buffer) {
		Ok(()) => (StatusCode::OK, [("content-type", encoder.format_type())], buffer).into_response(),
		Err(error) => {
			tracing::error!(%error, "failed to encode metrics");
			StatusCode::INTERNAL_SERVER_ERROR.into_response()
		}
	}
}
