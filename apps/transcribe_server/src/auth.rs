use axum::body::Body;
use axum::extract::State;
use axum::http::{header::AUTHORIZATION, Request};
use axum::middleware::Next;
use axum::response::IntoResponse;
use transcribe_core::CoreError;

use crate::error::ApiError;
use crate::state::AppState;

/// Rejects any request whose `Authorization: Bearer <token>` header does
/// not match `config.api_key`, per spec.md §4.G ("a single process-wide
/// bearer token").
pub async fn require_bearer_token(State(state): State<AppState>, request: Request<Body>, next: Next) -> impl IntoResponse {
	let provided = request
		.headers()
		.get(AUTHORIZATION)
		.and_then(|value| value.to_str().ok())
		.and_then(|value| value.strip_prefix("Bearer "));

	match provided {
		Some(token) if token == state.config.api_key => next.run(request).await,
		_ => ApiError(CoreError::Unauthenticated).into_response(),
	}
}
