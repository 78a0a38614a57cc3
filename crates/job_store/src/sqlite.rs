use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use transcribe_core::job::{ArtifactPaths, Job, JobStatus, JobSummary};
use transcribe_core::Segment;

use crate::error::StoreError;
use crate::{check_transition, JobStore, Mutation};

/// `JobStore` backed by a `sqlx::SqlitePool`. Same contract and
/// monotonicity guarantees as [`crate::memory::InMemoryJobStore`] — a
/// deployment picks this when it wants job records to survive a restart.
#[derive(Clone)]
pub struct SqliteJobStore {
	pool: SqlitePool,
}

impl SqliteJobStore {
	#[must_use]
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Creates the `jobs` table if it does not already exist. Call once at
	/// startup, ahead of any `Config`-driven migration runner.
	pub async fn ensure_schema(&self) -> Result<(), StoreError> {
		sqlx::query(
			r"
			CREATE TABLE IF NOT EXISTS jobs (
				id TEXT PRIMARY KEY,
				source_url TEXT NOT NULL,
				status TEXT NOT NULL,
				created_at TEXT NOT NULL,
				completed_at TEXT,
				transcript TEXT,
				segments TEXT NOT NULL,
				error_message TEXT,
				artifact_srt_path TEXT,
				artifact_vtt_path TEXT
			)
			",
		)
		.execute(&self.pool)
		.await?;
		Ok(())
	}

	async fn load(&self, id: &str) -> Result<Job, StoreError> {
		let row = sqlx::query("SELECT id, source_url, status, created_at, completed_at, transcript, segments, error_message, artifact_srt_path, artifact_vtt_path FROM jobs WHERE id = ?")
			.bind(id)
			.fetch_optional(&self.pool)
			.await?
			.ok_or_else(|| StoreError::NotFound(id.to_owned()))?;
		row_to_job(&row)
	}
}

fn row_to_job(row: &sqlx::sqlite::SqliteRow) -> Result<Job, StoreError> {
	let status_str: String = row.try_get("status")?;
	let status = status_from_str(&status_str)?;
	let segments_json: String = row.try_get("segments")?;
	let segments: Vec<Segment> = serde_json::from_str(&segments_json)?;
	let created_at_str: String = row.try_get("created_at")?;
	let completed_at_str: Option<String> = row.try_get("completed_at")?;
	let srt_path: Option<String> = row.try_get("artifact_srt_path")?;
	let vtt_path: Option<String> = row.try_get("artifact_vtt_path")?;

	Ok(Job {
		id: row.try_get("id")?,
		source_url: row.try_get("source_url")?,
		status,
		created_at: parse_timestamp(&created_at_str)?,
		completed_at: completed_at_str.as_deref().map(parse_timestamp).transpose()?,
		transcript: row.try_get("transcript")?,
		segments,
		error_message: row.try_get("error_message")?,
		artifact_paths: srt_path.zip(vtt_path).map(|(srt, vtt)| ArtifactPaths { srt, vtt }),
	})
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, StoreError> {
	DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc)).map_err(|e| StoreError::Backend(format!("malformed timestamp {s:?}: {e}")))
}

fn status_to_str(status: JobStatus) -> &'static str {
	match status {
		JobStatus::Queued => "queued",
		JobStatus::Running => "running",
		JobStatus::Complete => "complete",
		JobStatus::Error => "error",
	}
}

fn status_from_str(s: &str) -> Result<JobStatus, StoreError> {
	match s {
		"queued" => Ok(JobStatus::Queued),
		"running" => Ok(JobStatus::Running),
		"complete" => Ok(JobStatus::Complete),
		"error" => Ok(JobStatus::Error),
		other => Err(StoreError::Backend(format!("unknown job status {other:?}"))),
	}
}

async fn upsert(pool: &SqlitePool, job: &Job) -> Result<(), StoreError> {
	let segments_json = serde_json::to_string(&job.segments)?;
	sqlx::query(
		r"
		INSERT INTO jobs (id, source_url, status, created_at, completed_at, transcript, segments, error_message, artifact_srt_path, artifact_vtt_path)
		VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
		ON CONFLICT(id) DO UPDATE SET
			status = excluded.status,
			completed_at = excluded.completed_at,
			transcript = excluded.transcript,
			segments = excluded.segments,
			error_message = excluded.error_message,
			artifact_srt_path = excluded.artifact_srt_path,
			artifact_vtt_path = excluded.artifact_vtt_path
		",
	)
	.bind(&job.id)
	.bind(&job.source_url)
	.bind(status_to_str(job.status))
	.bind(job.created_at.to_rfc3339())
	.bind(job.completed_at.map(|t| t.to_rfc3339()))
	.bind(&job.transcript)
	.bind(segments_json)
	.bind(&job.error_message)
	.bind(job.artifact_paths.as_ref().map(|p| p.srt.clone()))
	.bind(job.artifact_paths.as_ref().map(|p| p.vtt.clone()))
	.execute(pool)
	.await?;
	Ok(())
}

#[async_trait]
impl JobStore for SqliteJobStore {
	async fn put(&self, job: Job) -> Result<(), StoreError> {
		if let Ok(existing) = self.load(&job.id).await {
			check_transition(existing.status, job.status)?;
		}
		upsert(&self.pool, &job).await
	}

	async fn get(&self, id: &str) -> Result<Job, StoreError> {
		self.load(id).await
	}

	async fn update(&self, id: &str, mutate: Mutation) -> Result<Job, StoreError> {
		let mut job = self.load(id).await?;
		let before = job.status;
		mutate(&mut job);
		check_transition(before, job.status)?;
		upsert(&self.pool, &job).await?;
		Ok(job)
	}

	async fn list(&self) -> Result<Vec<JobSummary>, StoreError> {
		let rows = sqlx::query(
			"SELECT id, source_url, status, created_at, completed_at, transcript, segments, error_message, artifact_srt_path, artifact_vtt_path FROM jobs",
		)
		.fetch_all(&self.pool)
		.await?;
		rows.iter().map(|row| row_to_job(row).map(|job| JobSummary::from(&job))).collect()
	}
}

#[cfg(test)]
mod tests {
	use chrono::Utc;
	use sqlx::sqlite::SqlitePoolOptions;

	use super::*;

	async fn store() -> SqliteJobStore {
		let pool = SqlitePoolOptions::new().connect("sqlite::memory:").await.unwrap();
		let store = SqliteJobStore::new(pool);
		store.ensure_schema().await.unwrap();
		store
	}

	fn new_job(id: &str) -> Job {
		Job::new(id.to_owned(), "https://x/v/1".to_owned(), Utc::now())
	}

	#[tokio::test]
	async fn put_then_get_round_trips() {
		let store = store().await;
		store.put(new_job("a")).await.unwrap();
		let job = store.get("a").await.unwrap();
		assert_eq!(job.id, "a");
		assert_eq!(job.status, JobStatus::Queued);
	}

	#[tokio::test]
	async fn update_rejects_backward_transition() {
		let store = store().await;
		store.put(new_job("a")).await.unwrap();
		store.update("a", Box::new(|j| j.status = JobStatus::Running)).await.unwrap();
		let result = store.update("a", Box::new(|j| j.status = JobStatus::Queued)).await;
		assert!(matches!(result, Err(StoreError::InvalidTransition { .. })));
	}

	#[tokio::test]
	async fn segments_survive_the_json_column_round_trip() {
		let store = store().await;
		store.put(new_job("a")).await.unwrap();
		store.update("a", Box::new(|j| j.status = JobStatus::Running)).await.unwrap();
		let updated = store
			.update(
				"a",
				Box::new(|j| {
					j.status = JobStatus::Complete;
					j.transcript = Some("hello world".to_owned());
					j.segments = vec![Segment::new(0, 1_200, "hello".to_owned()), Segment::new(1_200, 2_400, "world".to_owned())];
					j.completed_at = Some(Utc::now());
				}),
			)
			.await
			.unwrap();
		assert_eq!(updated.segments.len(), 2);
		let reloaded = store.get("a").await.unwrap();
		assert_eq!(reloaded.segments, updated.segments);
	}
}
