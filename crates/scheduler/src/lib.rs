pub mod delivery;
pub mod error;
pub mod metrics;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use transcribe_config::Config;
use url::Url;
use uuid::Uuid;

use job_store::JobStore;
use pipeline::PipelineRunner;
use transcribe_core::job::{Job, JobStatus};
use transcribe_core::Segment;
use webhooks::WebhookNotifier;

pub use error::SchedulerError;
pub use metrics::SchedulerMetrics;

const JOB_TOPIC_CAPACITY: usize = 256;

/// Result of `Scheduler::submit`: either the pipeline already ran inline
/// and produced a result, or the job was queued for a worker to pick up.
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
	Sync { transcript: String, segments: Vec<Segment> },
	Async { job_id: String },
}

/// Validates that `raw` is an absolute http(s) URL, per spec.md §6. The
/// repository's further platform-allowlist gate is explicitly
/// out-of-scope here (deployments that want it layer it in front of
/// `submit`).
fn validate_url(raw: &str) -> Result<Url, SchedulerError> {
	let url = Url::parse(raw).map_err(|e| SchedulerError::InvalidUrl(format!("{raw:?} does not parse as a URL: {e}")))?;
	match url.scheme() {
		"http" | "https" => Ok(url),
		other => Err(SchedulerError::InvalidUrl(format!("unsupported scheme {other:?}"))),
	}
}

/// Owns the dispatch decision (sync vs async) and the worker pool that
/// drains async jobs off an in-process bounded channel — the "job
/// topic" spec.md §4.E leaves to the implementer's choice of transport.
/// One `Scheduler` is constructed at startup and shared (`Arc`) with the
/// API handlers.
pub struct Scheduler {
	config: Arc<Config>,
	store: Arc<dyn JobStore>,
	pipeline_runner: Arc<PipelineRunner>,
	webhook_notifier: Arc<WebhookNotifier>,
	metrics: SchedulerMetrics,
	topic: mpsc::Sender<delivery::JobDispatch>,
}

impl Scheduler {
	/// Builds the scheduler and spawns its `worker_concurrency` worker
	/// tasks, each pulling job ids off the shared receiver end of the job
	/// topic. Workers run until `shutdown` is cancelled.
	#[must_use]
	pub fn new(config: Arc<Config>, store: Arc<dyn JobStore>, pipeline_runner: Arc<PipelineRunner>, webhook_notifier: Arc<WebhookNotifier>, metrics: SchedulerMetrics, shutdown: CancellationToken) -> Self {
		let (tx, rx) = mpsc::channel(JOB_TOPIC_CAPACITY);
		let rx = Arc::new(Mutex::new(rx));

		let webhook_url = config.webhook_url.clone().unwrap_or_default();
		let work_root = std::path::PathBuf::from(config.work_dir.clone());
		let output_root = std::path::PathBuf::from(config.output_dir.clone());

		for worker_id in 0..config.worker_concurrency {
			let rx = Arc::clone(&rx);
			let store = Arc::clone(&store);
			let pipeline_runner = Arc::clone(&pipeline_runner);
			let webhook_notifier = Arc::clone(&webhook_notifier);
			let metrics = metrics.clone();
			let webhook_url = webhook_url.clone();
			let work_root = work_root.clone();
			let output_root = output_root.clone();
			let shutdown = shutdown.clone();

			tokio::spawn(async move {
				metrics.active_workers.inc();
				loop {
					let dispatch = {
						let mut rx = rx.lock().await;
						tokio::select! {
							() = shutdown.cancelled() => None,
							received = rx.recv() => received,
						}
					};
					let Some(dispatch) = dispatch else {
						break;
					};
					let job_id = dispatch.job_id.clone();

					info!(worker_id, job_id = %job_id, "delivering job to worker");
					match delivery::handle(&dispatch, &store, &pipeline_runner, &webhook_notifier, &webhook_url, &work_root, &output_root, shutdown.child_token()).await {
						Ok(()) => metrics.jobs_completed.inc(),
						Err(error) => {
							warn!(worker_id, job_id = %job_id, %error, "job delivery ended in error");
							metrics.jobs_failed.inc();
						}
					}
				}
				metrics.active_workers.dec();
			});
		}

		Self { config, store, pipeline_runner, webhook_notifier, metrics, topic: tx }
	}

	/// Classifies `source_url` by probed duration and either runs the
	/// pipeline inline (sync path) or queues a job for async delivery,
	/// per spec.md §4.E.
	pub async fn submit(&self, source_url: &str) -> Result<SubmitOutcome, SchedulerError> {
		let url = validate_url(source_url)?;
		let cancel = CancellationToken::new();

		let duration = self.pipeline_runner.probe_duration(url.as_str(), cancel.clone()).await?;

		if duration.as_secs() > self.config.max_video_length_secs {
			return Err(SchedulerError::DurationExceeded { actual: duration, max: Duration::from_secs(self.config.max_video_length_secs) });
		}

		if self.config.is_sync_eligible(duration) {
			self.metrics.jobs_submitted.with_label_values(&["sync"]).inc();
			self.run_sync(url.as_str(), duration, cancel).await
		} else {
			self.metrics.jobs_submitted.with_label_values(&["async"]).inc();
			self.enqueue_async(url.as_str(), duration).await
		}
	}

	async fn run_sync(&self, source_url: &str, duration: Duration, cancel: CancellationToken) -> Result<SubmitOutcome, SchedulerError> {
		let job = Job::new(Uuid::new_v4().to_string(), source_url.to_owned(), chrono::Utc::now());
		let work_root = std::path::PathBuf::from(self.config.work_dir.clone());
		let output_root = std::path::PathBuf::from(self.config.output_dir.clone());

		let output = self.pipeline_runner.run(&job, &work_root, &output_root, duration, cancel).await?;
		self.metrics.jobs_completed.inc();
		Ok(SubmitOutcome::Sync { transcript: output.transcript, segments: output.segments })
	}

	async fn enqueue_async(&self, source_url: &str, duration: Duration) -> Result<SubmitOutcome, SchedulerError> {
		let job = Job::new(Uuid::new_v4().to_string(), source_url.to_owned(), chrono::Utc::now());
		let job_id = job.id.clone();

		// Durable before publish: a publish racing ahead of a lost write
		// would let a redelivery find no record and silently drop it.
		self.store.put(job).await?;

		self.topic.send(delivery::JobDispatch { job_id: job_id.clone(), media_duration: duration }).await.map_err(|_| SchedulerError::TopicClosed)?;

		Ok(SubmitOutcome::Async { job_id })
	}
}

#[cfg(test)]
mod tests {
	use std::time::Duration as StdDuration;

	use artifacts::FilesystemArtifactWriter;
	use job_store::InMemoryJobStore;
	use prometheus::Registry;
	use tool_driver::fake::FakeToolDriver;
	use webhooks::WebhookConfig;

	use super::*;

	fn runner(driver: FakeToolDriver) -> Arc<PipelineRunner> {
		Arc::new(PipelineRunner::new(
			Arc::new(driver),
			Arc::new(FilesystemArtifactWriter),
			StdDuration::from_secs(1),
			StdDuration::from_secs(1),
			StdDuration::from_secs(1),
			StdDuration::from_secs(1),
			1,
		))
	}

	fn scheduler(driver: FakeToolDriver, config: Config) -> Scheduler {
		let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
		let notifier = Arc::new(WebhookNotifier::new(WebhookConfig::from_parts(None, None, &[], StdDuration::from_secs(1), 0)));
		let metrics = SchedulerMetrics::register(&Registry::new()).unwrap();
		Scheduler::new(Arc::new(config), store, runner(driver), notifier, metrics, CancellationToken::new())
	}

	#[tokio::test]
	async fn short_media_runs_synchronously() {
		let driver = FakeToolDriver::new()
			.with_probe(Ok(StdDuration::from_secs(45)))
			.with_download(Ok(()))
			.with_normalize(Ok(()))
			.with_transcription(Ok(vec![Segment::new(0, 1_200, "hello".to_owned()), Segment::new(1_200, 2_400, "world".to_owned())]));
		let sched = scheduler(driver, Config::test());

		let outcome = sched.submit("https://x/v/1").await.unwrap();

		match outcome {
			SubmitOutcome::Sync { transcript, segments } => {
				assert_eq!(transcript, "hello world");
				assert_eq!(segments.len(), 2);
			}
			SubmitOutcome::Async { .. } => panic!("expected sync outcome"),
		}
	}

	#[tokio::test]
	async fn media_exactly_at_threshold_is_sync() {
		let mut config = Config::test();
		config.sync_threshold_seconds = 120;
		let driver = FakeToolDriver::new().with_probe(Ok(StdDuration::from_secs(120))).with_download(Ok(())).with_normalize(Ok(())).with_transcription(Ok(Vec::new()));
		let sched = scheduler(driver, config);

		let outcome = sched.submit("https://x/v/1").await.unwrap();

		assert!(matches!(outcome, SubmitOutcome::Sync { .. }));
	}

	#[tokio::test]
	async fn long_media_is_queued_async_and_reaches_complete() {
		let driver = FakeToolDriver::new()
			.with_probe(Ok(StdDuration::from_secs(600)))
			.with_download(Ok(()))
			.with_normalize(Ok(()))
			.with_transcription(Ok(vec![Segment::new(0, 1_000, "hi".to_owned())]));
		let sched = scheduler(driver, Config::test());

		let outcome = sched.submit("https://x/v/2").await.unwrap();
		let job_id = match outcome {
			SubmitOutcome::Async { job_id } => job_id,
			SubmitOutcome::Sync { .. } => panic!("expected async outcome"),
		};

		let store = Arc::clone(&sched.store);
		let mut job = store.get(&job_id).await.unwrap();
		for _ in 0..50 {
			if job.status.is_terminal() {
				break;
			}
			tokio::time::sleep(StdDuration::from_millis(20)).await;
			job = store.get(&job_id).await.unwrap();
		}
		assert_eq!(job.status, JobStatus::Complete);
	}

	#[tokio::test]
	async fn duration_exceeding_max_video_length_is_rejected() {
		let mut config = Config::test();
		config.max_video_length_secs = 100;
		let driver = FakeToolDriver::new().with_probe(Ok(StdDuration::from_secs(101)));
		let sched = scheduler(driver, config);

		let result = sched.submit("https://x/v/3").await;

		assert!(matches!(result, Err(SchedulerError::DurationExceeded { .. })));
	}

	#[tokio::test]
	async fn malformed_url_is_rejected_before_probing() {
		let sched = scheduler(FakeToolDriver::new(), Config::test());
		let result = sched.submit("not-a-url").await;
		assert!(matches!(result, Err(SchedulerError::InvalidUrl(_))));
	}

	#[tokio::test]
	async fn unsupported_scheme_is_rejected() {
		let sched = scheduler(FakeToolDriver::new(), Config::test());
		let result = sched.submit("ftp://x/v/1").await;
		assert!(matches!(result, Err(SchedulerError::InvalidUrl(_))));
	}
}
