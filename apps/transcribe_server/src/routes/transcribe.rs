use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use transcribe_core::job::{Job, JobStatus};
use transcribe_core::Segment;

use scheduler::SubmitOutcome;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SubmitRequest {
	pub url: String,
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum SubmitResponse {
	Sync { transcript: String, segments: Vec<Segment> },
	Async { job_id: String },
}

impl From<SubmitOutcome> for SubmitResponse {
	fn from(outcome: SubmitOutcome) -> Self {
		match outcome {
			SubmitOutcome::Sync { transcript, segments } => Self::Sync { transcript, segments },
			SubmitOutcome::Async { job_id } => Self::Async { job_id },
		}
	}
}

/// `POST /transcribe` — authenticated, per spec.md §4.G.
pub async fn submit(State(state): State<AppState>, Json(body): Json<SubmitRequest>) -> Result<Json<SubmitResponse>, ApiError> {
	let outcome = state.scheduler.submit(&body.url).await?;
	Ok(Json(outcome.into()))
}

#[derive(Serialize)]
struct SubtitleFiles {
	srt_url: String,
	vtt_url: String,
}

/// Shape returned by `GET /transcribe/{id}`, exactly per spec.md §4.G:
/// always `{id, status, created_at}`, plus the terminal-state fields when
/// the job has reached one.
#[derive(Serialize)]
pub struct JobResponse {
	id: String,
	status: JobStatus,
	created_at: DateTime<Utc>,
	#[serde(skip_serializing_if = "Option::is_none")]
	completed_at: Option<DateTime<Utc>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	transcript: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	segments: Option<Vec<Segment>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	subtitle_files: Option<SubtitleFiles>,
	#[serde(skip_serializing_if = "Option::is_none")]
	error: Option<String>,
}

impl From<Job> for JobResponse {
	fn from(job: Job) -> Self {
		let subtitle_files = job.artifact_paths.map(|paths| SubtitleFiles { srt_url: paths.srt, vtt_url: paths.vtt });
		let (transcript, segments) = if job.status == JobStatus::Complete { (job.transcript, Some(job.segments)) } else { (None, None) };
		Self {
			id: job.id,
			status: job.status,
			created_at: job.created_at,
			completed_at: job.completed_at,
			transcript,
			segments,
			subtitle_files,
			error: job.error_message,
		}
	}
}

/// `GET /transcribe/{id}` — authenticated, per spec.md §4.G.
pub async fn get_status(State(state): State<AppState>, Path(id): Path<String>) -> Result<(StatusCode, Json<JobResponse>), ApiError> {
	let job = state.store.get(&id).await?;
	Ok((StatusCode::OK, Json(job.into())))
}
