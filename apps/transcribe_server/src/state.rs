use std::sync::Arc;

use job_store::JobStore;
use prometheus::Registry;
use scheduler::Scheduler;
use transcribe_config::Config;

/// Everything a request handler might need, built once in `main` and
/// cheaply cloned (every field is an `Arc`) into each request.
#[derive(Clone)]
pub struct AppState {
	pub config: Arc<Config>,
	pub store: Arc<dyn JobStore>,
	pub scheduler: Arc<Scheduler>,
	pub registry: Arc<Registry>,
}
