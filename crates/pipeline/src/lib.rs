mod event;

pub use event::PipelineEvent;

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};
use transcribe_core::job::Job;
use transcribe_core::{CoreError, Segment};

use artifacts::ArtifactWriter;
use tool_driver::{DriverError, ToolDriver};

#[derive(Error, Debug)]
pub enum PipelineError {
	#[error(transparent)]
	Driver(#[from] DriverError),

	#[error("failed to create job working directory: {0}")]
	WorkDir(#[from] std::io::Error),
}

impl From<PipelineError> for CoreError {
	fn from(error: PipelineError) -> Self {
		match error {
			PipelineError::Driver(e) => e.into(),
			PipelineError::WorkDir(e) => Self::Internal(e.to_string()),
		}
	}
}

/// The transcript, segments, and (best-effort) rendered subtitle paths
/// produced by a single successful pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
	pub transcript: String,
	pub segments: Vec<Segment>,
	pub srt_path: Option<PathBuf>,
	pub vtt_path: Option<PathBuf>,
}

/// The three-stage composition (download -> normalize -> transcribe) plus
/// best-effort artifact emission, exactly per spec.md §4.D. Holds no
/// per-job state: everything needed is in the `Job` and `work_root`/
/// `output_root` passed to `run`.
pub struct PipelineRunner {
	driver: Arc<dyn ToolDriver>,
	artifacts: Arc<dyn ArtifactWriter>,
	events: broadcast::Sender<PipelineEvent>,
	probe_timeout: std::time::Duration,
	download_timeout: std::time::Duration,
	normalize_timeout: std::time::Duration,
	transcribe_timeout_base: std::time::Duration,
	transcribe_timeout_per_audio_second: u64,
}

impl PipelineRunner {
	/// `transcribe_timeout_base`/`transcribe_timeout_per_audio_second`
	/// together give the transcribe-stage timeout spec.md §4.A specifies
	/// as proportional to audio duration: `max(base, per_second *
	/// media_duration)`, computed per-call in `run` from the caller's
	/// probed `media_duration` rather than fixed at construction.
	#[must_use]
	pub fn new(
		driver: Arc<dyn ToolDriver>,
		artifacts: Arc<dyn ArtifactWriter>,
		probe_timeout: std::time::Duration,
		download_timeout: std::time::Duration,
		normalize_timeout: std::time::Duration,
		transcribe_timeout_base: std::time::Duration,
		transcribe_timeout_per_audio_second: u64,
	) -> Self {
		let (events, _rx) = broadcast::channel(32);
		Self { driver, artifacts, events, probe_timeout, download_timeout, normalize_timeout, transcribe_timeout_base, transcribe_timeout_per_audio_second }
	}

	fn transcribe_timeout_for(&self, media_duration: std::time::Duration) -> std::time::Duration {
		let scaled = std::time::Duration::from_secs(self.transcribe_timeout_per_audio_second.saturating_mul(media_duration.as_secs()));
		self.transcribe_timeout_base.max(scaled)
	}

	/// Subscribe to pipeline lifecycle events. Used by `scheduler` to know
	/// when a stage starts/finishes without duplicating timing logic.
	#[must_use]
	pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
		self.events.subscribe()
	}

	/// Runs the full download -> normalize -> transcribe pipeline for
	/// `job` under a fresh working directory scoped to its id. `media_duration`
	/// (typically the caller's already-probed duration; `Duration::ZERO` if
	/// unknown) sizes the transcribe-stage timeout per spec.md §4.A. The
	/// working directory is removed on every exit path, success or failure.
	#[instrument(skip(self, job, cancel), fields(job_id = %job.id))]
	pub async fn run(
		&self,
		job: &Job,
		work_root: &std::path::Path,
		output_root: &std::path::Path,
		media_duration: std::time::Duration,
		cancel: CancellationToken,
	) -> Result<PipelineOutput, PipelineError> {
		let work_dir = work_root.join(&job.id);
		tokio::fs::create_dir_all(&work_dir).await?;

		let result = self.run_inner(job, &work_dir, output_root, media_duration, cancel).await;

		if let Err(error) = tokio::fs::remove_dir_all(&work_dir).await {
			warn!(job_id = %job.id, error = %error, "failed to remove job working directory");
		}

		result
	}

	async fn run_inner(&self, job: &Job, work_dir: &std::path::Path, output_root: &std::path::Path, media_duration: std::time::Duration, cancel: CancellationToken) -> Result<PipelineOutput, PipelineError> {
		let _ = self.events.send(PipelineEvent::Started { job_id: job.id.clone() });

		let audio_path = work_dir.join("source_audio");
		self.driver.download_audio(&job.source_url, &audio_path, self.download_timeout, cancel.clone()).await.map_err(|error| {
			let _ = self.events.send(PipelineEvent::Failed { job_id: job.id.clone(), stage: "download", error: error.to_string() });
			error
		})?;
		let _ = self.events.send(PipelineEvent::StageCompleted { job_id: job.id.clone(), stage: "download" });

		let wav_path = work_dir.join("normalized.wav");
		self.driver.normalize_audio(&audio_path, &wav_path, self.normalize_timeout, cancel.clone()).await.map_err(|error| {
			let _ = self.events.send(PipelineEvent::Failed { job_id: job.id.clone(), stage: "normalize", error: error.to_string() });
			error
		})?;
		let _ = self.events.send(PipelineEvent::StageCompleted { job_id: job.id.clone(), stage: "normalize" });

		let transcribe_timeout = self.transcribe_timeout_for(media_duration);
		let segments = self.driver.transcribe(&wav_path, transcribe_timeout, cancel).await.map_err(|error| {
			let _ = self.events.send(PipelineEvent::Failed { job_id: job.id.clone(), stage: "transcribe", error: error.to_string() });
			error
		})?;
		let _ = self.events.send(PipelineEvent::StageCompleted { job_id: job.id.clone(), stage: "transcribe" });

		let transcript = join_transcript(&segments);

		let (srt_path, vtt_path) = if segments.is_empty() { (None, None) } else { self.write_artifacts(&job.id, &segments, output_root) };

		let _ = self.events.send(PipelineEvent::Completed { job_id: job.id.clone() });
		Ok(PipelineOutput { transcript, segments, srt_path, vtt_path })
	}

	/// Best-effort subtitle emission. Per spec.md §4.D step 5, I/O errors
	/// here are logged and swallowed — they never fail the pipeline.
	fn write_artifacts(&self, job_id: &str, segments: &[Segment], output_root: &std::path::Path) -> (Option<PathBuf>, Option<PathBuf>) {
		let srt_path = output_root.join(format!("{job_id}.srt"));
		let vtt_path = output_root.join(format!("{job_id}.vtt"));

		let srt = match self.artifacts.write_srt(&srt_path, segments, None) {
			Ok(()) => Some(srt_path),
			Err(error) => {
				warn!(job_id, %error, "failed to write SRT artifact, continuing without it");
				None
			}
		};
		let vtt = match self.artifacts.write_vtt(&vtt_path, segments, None) {
			Ok(()) => Some(vtt_path),
			Err(error) => {
				warn!(job_id, %error, "failed to write VTT artifact, continuing without it");
				None
			}
		};
		(srt, vtt)
	}

	/// Probes media duration ahead of the full pipeline. Exposed so
	/// `scheduler` can decide sync-vs-async before committing to a run.
	pub async fn probe_duration(&self, source_url: &str, cancel: CancellationToken) -> Result<std::time::Duration, DriverError> {
		self.driver.probe_duration(source_url, self.probe_timeout, cancel).await
	}
}

/// Concatenates segment texts with a single-space separator, collapsing
/// internal whitespace and trimming, per spec.md §4.A.
#[must_use]
pub fn join_transcript(segments: &[Segment]) -> String {
	let joined = segments.iter().map(|s| s.text.as_str()).collect::<Vec<_>>().join(" ");
	joined.split_whitespace().collect::<Vec<_>>().join(" ")
}
