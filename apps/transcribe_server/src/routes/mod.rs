pub mod health;
pub mod metrics;
pub mod transcribe;

use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::Router;

use crate::auth::require_bearer_token;
use crate::state::AppState;

/// Builds the full router: `/health` and `/metrics` are open, `/transcribe*`
/// sits behind the bearer-auth middleware.
pub fn router(state: AppState) -> Router {
	let protected = Router::new()
		.route("/transcribe", axum::routing::post(transcribe::submit))
		.route("/transcribe/:id", get(transcribe::get_status))
		.layer(from_fn_with_state(state.clone(), require_bearer_token));

	let public = Router::new().route("/health", get(health::health)).route("/metrics", get(metrics::metrics));

	Router::new().merge(protected).merge(public).with_state(state)
}
