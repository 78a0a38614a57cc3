pub mod auth;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use prometheus::Registry;
use tokio_util::sync::CancellationToken;

use artifacts::FilesystemArtifactWriter;
use job_store::{InMemoryJobStore, JobStore, SqliteJobStore};
use pipeline::PipelineRunner;
use scheduler::{Scheduler, SchedulerMetrics};
use sqlx::sqlite::SqlitePoolOptions;
use tool_driver::{ProcessToolDriver, ToolDriver, ToolPaths};
use transcribe_config::Config;
use webhooks::{WebhookConfig, WebhookNotifier};

pub use state::AppState;

/// Wires every crate into a running `AppState`, per the dependency order
/// spec.md §2 lists leaves-first: tool driver, artifacts, job store,
/// pipeline, webhooks, scheduler. Exposed as a free function so both
/// `main` and integration tests build the same way, differing only in
/// which `JobStore`/`ToolDriver` they pass in.
#[must_use]
pub fn build_state(config: Arc<Config>, store: Arc<dyn JobStore>, driver: Arc<dyn ToolDriver>, shutdown: CancellationToken) -> AppState {
	let artifact_writer = Arc::new(FilesystemArtifactWriter);
	let pipeline_runner = Arc::new(PipelineRunner::new(
		driver,
		artifact_writer,
		config.probe_timeout,
		config.download_timeout,
		config.normalize_timeout,
		config.transcribe_timeout_base,
		config.transcribe_timeout_per_audio_second,
	));

	let webhook_config = WebhookConfig::from_parts(config.webhook_url.clone(), config.webhook_secret.clone(), &config.webhook_events, Duration::from_secs(10), config.webhook_max_retries);
	let webhook_notifier = Arc::new(WebhookNotifier::new(webhook_config));

	let registry = Arc::new(Registry::new());
	let metrics = SchedulerMetrics::register(&registry).expect("metric names are unique and well-formed");

	let scheduler = Arc::new(Scheduler::new(config.clone(), store.clone(), pipeline_runner, webhook_notifier, metrics, shutdown));

	AppState { config, store, scheduler, registry }
}

/// Picks the job store backend from `config.database_url`: a connected,
/// schema-ensured `SqliteJobStore` when set, an `InMemoryJobStore`
/// otherwise. Per spec.md §4.C, both honor the same linearizable-per-id
/// contract, so callers never need to know which one they got.
pub async fn build_job_store(config: &Config) -> anyhow::Result<Arc<dyn JobStore>> {
	match &config.database_url {
		Some(url) => {
			let pool = SqlitePoolOptions::new().connect(url).await?;
			let store = SqliteJobStore::new(pool);
			store.ensure_schema().await?;
			Ok(Arc::new(store))
		}
		None => Ok(Arc::new(InMemoryJobStore::new())),
	}
}

/// Convenience for the common real-subprocess-driver deployment, store
/// backend chosen per `build_job_store`. Used by `main`; tests build
/// `AppState` directly with `build_state` and a `FakeToolDriver`.
pub async fn build_default_state(config: Arc<Config>, shutdown: CancellationToken) -> anyhow::Result<AppState> {
	let store = build_job_store(&config).await?;
	let driver: Arc<dyn ToolDriver> = Arc::new(ProcessToolDriver::new(ToolPaths {
		downloader: config.downloader_path.clone(),
		audio_tool: config.audio_tool_path.clone(),
		transcriber: config.transcriber_path.clone(),
	}));
	Ok(build_state(config, store, driver, shutdown))
}
