use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The lifecycle points a webhook subscriber may receive a callback for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookEventKind {
	JobQueued,
	JobStarted,
	JobCompleted,
	JobFailed,
}

impl WebhookEventKind {
	#[must_use]
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::JobQueued => "job.queued",
			Self::JobStarted => "job.started",
			Self::JobCompleted => "job.completed",
			Self::JobFailed => "job.failed",
		}
	}
}

/// The JSON body posted to a configured webhook URL, matching spec.md
/// §3's ephemeral webhook event shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
	pub event: String,
	pub job_id: String,
	pub status: crate::job::JobStatus,
	pub url: String,
	pub created_at: DateTime<Utc>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub completed_at: Option<DateTime<Utc>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub processing_ms: Option<i64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error_message: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub srt_path: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub vtt_path: Option<String>,
}

impl WebhookEvent {
	#[must_use]
	pub fn new(kind: WebhookEventKind, job: &crate::job::Job, url: String, created_at: DateTime<Utc>) -> Self {
		let (srt_path, vtt_path) = job.artifact_paths.as_ref().map_or((None, None), |paths| (Some(paths.srt.clone()), Some(paths.vtt.clone())));
		Self {
			event: kind.as_str().to_owned(),
			job_id: job.id.clone(),
			status: job.status,
			url,
			created_at,
			completed_at: job.completed_at,
			processing_ms: None,
			error_message: job.error_message.clone(),
			srt_path,
			vtt_path,
		}
	}

	/// Attaches processing time, recorded for the completion event per
	/// spec.md §4.E ("Processing time is recorded for the completion
	/// event").
	#[must_use]
	pub const fn with_processing_ms(mut self, ms: i64) -> Self {
		self.processing_ms = Some(ms);
		self
	}

	#[must_use]
	pub fn kind(&self) -> Option<WebhookEventKind> {
		match self.event.as_str() {
			"job.queued" => Some(WebhookEventKind::JobQueued),
			"job.started" => Some(WebhookEventKind::JobStarted),
			"job.completed" => Some(WebhookEventKind::JobCompleted),
			"job.failed" => Some(WebhookEventKind::JobFailed),
			_ => None,
		}
	}
}
