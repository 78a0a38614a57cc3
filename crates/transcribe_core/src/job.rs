use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::segment::Segment;

/// Lifecycle status of a submitted transcription job, exactly the four
/// states of spec.md §3: `queued -> running -> (complete | error)`.
/// Finer-grained pipeline progress (download/normalize/transcribe) is
/// carried separately as `pipeline::PipelineEvent`, not folded into this
/// enum, so the externally-visible status contract stays literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
	Queued,
	Running,
	Complete,
	Error,
}

impl JobStatus {
	/// Whether moving from `self` to `next` is a legal transition. Both
	/// `job_store` implementations check this before committing a write.
	#[must_use]
	pub const fn can_transition_to(self, next: Self) -> bool {
		use JobStatus::{Complete, Error, Queued, Running};
		matches!((self, next), (Queued, Running) | (Running, Complete) | (Queued | Running, Error))
	}

	#[must_use]
	pub const fn is_terminal(self) -> bool {
		matches!(self, Self::Complete | Self::Error)
	}
}

/// Filesystem paths of a completed job's rendered subtitle artifacts.
/// Present iff the job is `Complete` and its segments were non-empty
/// (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactPaths {
	pub srt: String,
	pub vtt: String,
}

/// A submitted transcription job and its accumulated result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
	pub id: String,
	pub source_url: String,
	pub status: JobStatus,
	pub created_at: DateTime<Utc>,
	pub completed_at: Option<DateTime<Utc>>,
	pub transcript: Option<String>,
	pub segments: Vec<Segment>,
	pub error_message: Option<String>,
	pub artifact_paths: Option<ArtifactPaths>,
}

impl Job {
	#[must_use]
	pub fn new(id: String, source_url: String, created_at: DateTime<Utc>) -> Self {
		Self {
			id,
			source_url,
			status: JobStatus::Queued,
			created_at,
			completed_at: None,
			transcript: None,
			segments: Vec::new(),
			error_message: None,
			artifact_paths: None,
		}
	}
}

/// Minimal projection returned by `JobStore::list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSummary {
	pub id: String,
	pub status: JobStatus,
	pub created_at: DateTime<Utc>,
}

impl From<&Job> for JobSummary {
	fn from(job: &Job) -> Self {
		Self { id: job.id.clone(), status: job.status, created_at: job.created_at }
	}
}
