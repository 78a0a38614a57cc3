use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use transcribe_core::CoreError;

/// Wraps `CoreError` so this binary can give it an `IntoResponse` impl —
/// `axum`'s trait and `transcribe_core`'s error type both live outside
/// this crate. Maps per spec.md §4.G / §7: `InvalidArgument -> 400`,
/// `Unauthenticated -> 401`, `NotFound -> 404`, everything else -> 500.
#[derive(Debug)]
pub struct ApiError(pub CoreError);

#[derive(Serialize)]
struct ErrorBody {
	error: String,
}

impl ApiError {
	const fn status_code(&self) -> StatusCode {
		match &self.0 {
			CoreError::InvalidArgument(_) | CoreError::InvalidSource(_) => StatusCode::BAD_REQUEST,
			CoreError::Unauthenticated => StatusCode::UNAUTHORIZED,
			CoreError::NotFound(_) => StatusCode::NOT_FOUND,
			_ => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let status = self.status_code();
		if status == StatusCode::INTERNAL_SERVER_ERROR {
			tracing::error!(error = %self.0, "internal error serving request");
		}
		(status, Json(ErrorBody { error: self.0.to_string() })).into_response()
	}
}

impl<E> From<E> for ApiError
where
	CoreError: From<E>,
{
	fn from(error: E) -> Self {
		Self(CoreError::from(error))
	}
}
