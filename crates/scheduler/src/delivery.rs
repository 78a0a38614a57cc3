use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use transcribe_core::job::JobStatus;
use transcribe_core::{WebhookEvent, WebhookEventKind};

use job_store::JobStore;
use pipeline::{PipelineError, PipelineRunner};
use tool_driver::DriverError;
use webhooks::WebhookNotifier;

use crate::error::SchedulerError;

/// A single message on the job topic: the id to deliver plus the media
/// duration probed at submission time, carried through so the worker's
/// transcribe-stage timeout stays proportional per spec.md §4.A without
/// re-probing the source on redelivery.
#[derive(Debug, Clone)]
pub struct JobDispatch {
	pub job_id: String,
	pub media_duration: Duration,
}

/// Processes a single async job delivery: transitions it to `running`,
/// runs the pipeline, and records the terminal outcome. Callable directly
/// by tests, independent of the channel it is normally driven from — see
/// spec.md §8 scenario 6 (duplicate delivery is a safe no-op) and the
/// sync-vs-async boundary tests in `lib.rs`.
#[allow(clippy::too_many_arguments)]
pub async fn handle(
	dispatch: &JobDispatch,
	store: &Arc<dyn JobStore>,
	pipeline_runner: &PipelineRunner,
	webhook_notifier: &WebhookNotifier,
	webhook_url: &str,
	work_root: &Path,
	output_root: &Path,
	cancel: CancellationToken,
) -> Result<(), SchedulerError> {
	let job_id = dispatch.job_id.as_str();
	let job = store.get(job_id).await?;
	if job.status.is_terminal() {
		info!(job_id, status = ?job.status, "job already terminal, dropping redelivered message");
		return Ok(());
	}

	let started_at = Utc::now();
	let job = store.update(job_id, Box::new(|j| j.status = JobStatus::Running)).await?;
	webhook_notifier.notify(&WebhookEvent::new(WebhookEventKind::JobStarted, &job, webhook_url.to_owned(), started_at)).await;

	match pipeline_runner.run(&job, work_root, output_root, dispatch.media_duration, cancel).await {
		Ok(output) => {
			let completed_at = Utc::now();
			let artifact_paths = output.srt_path.zip(output.vtt_path).map(|(srt, vtt)| transcribe_core::job::ArtifactPaths {
				srt: srt.to_string_lossy().into_owned(),
				vtt: vtt.to_string_lossy().into_owned(),
			});
			let job = store
				.update(
					job_id,
					Box::new(move |j| {
						j.status = JobStatus::Complete;
						j.transcript = Some(output.transcript);
						j.segments = output.segments;
						j.artifact_paths = artifact_paths;
						j.completed_at = Some(completed_at);
					}),
				)
				.await?;
			let processing_ms = (completed_at - started_at).num_milliseconds();
			webhook_notifier
				.notify(&WebhookEvent::new(WebhookEventKind::JobCompleted, &job, webhook_url.to_owned(), completed_at).with_processing_ms(processing_ms))
				.await;
			Ok(())
		}
		Err(PipelineError::Driver(DriverError::Cancelled)) => {
			// spec.md §4.E/§5: a cancelled worker surfaces `Cancelled` without
			// further state changes. The job stays `running` for redelivery
			// to pick up; no webhook fires for a transition that didn't happen.
			warn!(job_id, "pipeline cancelled, leaving job running for redelivery");
			Ok(())
		}
		Err(pipeline_error) => {
			error!(job_id, error = %pipeline_error, "pipeline run failed");
			let completed_at = Utc::now();
			let message = pipeline_error.to_string();
			let job = store
				.update(
					job_id,
					Box::new(move |j| {
						j.status = JobStatus::Error;
						j.error_message = Some(message);
						j.completed_at = Some(completed_at);
					}),
				)
				.await?;
			webhook_notifier.notify(&WebhookEvent::new(WebhookEventKind::JobFailed, &job, webhook_url.to_owned(), completed_at)).await;
			Err(pipeline_error.into())
		}
	}
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use artifacts::FilesystemArtifactWriter;
	use chrono::Utc;
	use job_store::InMemoryJobStore;
	use tool_driver::fake::FakeToolDriver;
	use tool_driver::DriverError;
	use transcribe_core::job::Job;
	use transcribe_core::Segment;
	use webhooks::WebhookConfig;

	use super::*;

	fn runner(driver: FakeToolDriver) -> PipelineRunner {
		PipelineRunner::new(Arc::new(driver), Arc::new(FilesystemArtifactWriter), Duration::from_secs(1), Duration::from_secs(1), Duration::from_secs(1), Duration::from_secs(1), 1)
	}

	fn notifier() -> WebhookNotifier {
		WebhookNotifier::new(WebhookConfig::from_parts(None, None, &[], Duration::from_secs(1), 0))
	}

	#[tokio::test]
	async fn happy_path_transitions_to_complete_and_fires_completed_webhook() {
		let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
		let job = Job::new("job-1".to_owned(), "https://x/v/1".to_owned(), Utc::now());
		store.put(job).await.unwrap();

		let driver = FakeToolDriver::new().with_download(Ok(())).with_normalize(Ok(())).with_transcription(Ok(vec![Segment::new(0, 1_000, "hi".to_owned())]));
		let work_root = tempfile::tempdir().unwrap();
		let output_root = tempfile::tempdir().unwrap();

		handle(&JobDispatch { job_id: "job-1".to_owned(), media_duration: Duration::ZERO }, &store, &runner(driver), &notifier(), "", work_root.path(), output_root.path(), CancellationToken::new()).await.unwrap();

		let job = store.get("job-1").await.unwrap();
		assert_eq!(job.status, JobStatus::Complete);
		assert_eq!(job.transcript.as_deref(), Some("hi"));
		assert!(job.completed_at.is_some());
	}

	#[tokio::test]
	async fn download_failure_transitions_to_error() {
		let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
		let job = Job::new("job-2".to_owned(), "https://x/v/2".to_owned(), Utc::now());
		store.put(job).await.unwrap();

		let driver = FakeToolDriver::new().with_download(Err(DriverError::DownloadFailed("boom".to_owned())));
		let work_root = tempfile::tempdir().unwrap();
		let output_root = tempfile::tempdir().unwrap();

		let result = handle(&JobDispatch { job_id: "job-2".to_owned(), media_duration: Duration::ZERO }, &store, &runner(driver), &notifier(), "", work_root.path(), output_root.path(), CancellationToken::new()).await;

		assert!(result.is_err());
		let job = store.get("job-2").await.unwrap();
		assert_eq!(job.status, JobStatus::Error);
		assert!(job.error_message.is_some());
	}

	#[tokio::test]
	async fn redelivery_of_a_terminal_job_is_a_no_op() {
		let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
		let job = Job::new("job-3".to_owned(), "https://x/v/3".to_owned(), Utc::now());
		store.put(job).await.unwrap();
		store.update("job-3", Box::new(|j| j.status = JobStatus::Running)).await.unwrap();
		store
			.update("job-3", Box::new(|j| { j.status = JobStatus::Complete; j.completed_at = Some(Utc::now()); }))
			.await
			.unwrap();

		let driver = FakeToolDriver::new().with_download(Err(DriverError::DownloadFailed("should never run".to_owned())));
		let work_root = tempfile::tempdir().unwrap();
		let output_root = tempfile::tempdir().unwrap();

		let result = handle(&JobDispatch { job_id: "job-3".to_owned(), media_duration: Duration::ZERO }, &store, &runner(driver), &notifier(), "", work_root.path(), output_root.path(), CancellationToken::new()).await;

		assert!(result.is_ok());
		let job = store.get("job-3").await.unwrap();
		assert_eq!(job.status, JobStatus::Complete);
	}

	#[tokio::test]
	async fn cancellation_leaves_the_job_running_with_no_webhook() {
		let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
		let job = Job::new("job-4".to_owned(), "https://x/v/4".to_owned(), Utc::now());
		store.put(job).await.unwrap();
		store.update("job-4", Box::new(|j| j.status = JobStatus::Running)).await.unwrap();

		let driver = FakeToolDriver::new().with_download(Err(DriverError::Cancelled));
		let work_root = tempfile::tempdir().unwrap();
		let output_root = tempfile::tempdir().unwrap();

		let result = handle(&JobDispatch { job_id: "job-4".to_owned(), media_duration: Duration::ZERO }, &store, &runner(driver), &notifier(), "", work_root.path(), output_root.path(), CancellationToken::new()).await;

		assert!(result.is_ok());
		let job = store.get("job-4").await.unwrap();
		assert_eq!(job.status, JobStatus::Running);
		assert!(job.error_message.is_none());
		assert!(job.completed_at.is_none());
	}
}
