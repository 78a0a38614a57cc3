use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use transcribe_core::job::{Job, JobSummary};

use crate::error::StoreError;
use crate::{check_transition, JobStore, Mutation};

/// `JobStore` backed by a single mutex-guarded map. The spec's own
/// framing ("a straightforward map under a single mutex is acceptable")
/// makes this the default for a single-process deployment.
#[derive(Default, Clone)]
pub struct InMemoryJobStore {
	jobs: Arc<Mutex<HashMap<String, Job>>>,
}

impl InMemoryJobStore {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl JobStore for InMemoryJobStore {
	async fn put(&self, job: Job) -> Result<(), StoreError> {
		let mut jobs = self.jobs.lock().await;
		if let Some(existing) = jobs.get(&job.id) {
			check_transition(existing.status, job.status)?;
		}
		jobs.insert(job.id.clone(), job);
		Ok(())
	}

	async fn get(&self, id: &str) -> Result<Job, StoreError> {
		let jobs = self.jobs.lock().await;
		jobs.get(id).cloned().ok_or_else(|| StoreError::NotFound(id.to_owned()))
	}

	async fn update(&self, id: &str, mutate: Mutation) -> Result<Job, StoreError> {
		let mut jobs = self.jobs.lock().await;
		let job = jobs.get_mut(id).ok_or_else(|| StoreError::NotFound(id.to_owned()))?;
		let before = job.status;
		let mut candidate = job.clone();
		mutate(&mut candidate);
		check_transition(before, candidate.status)?;
		*job = candidate.clone();
		Ok(candidate)
	}

	async fn list(&self) -> Result<Vec<JobSummary>, StoreError> {
		let jobs = self.jobs.lock().await;
		Ok(jobs.values().map(JobSummary::from).collect())
	}
}

#[cfg(test)]
mod tests {
	use chrono::Utc;
	use transcribe_core::job::JobStatus;

	use super::*;

	fn new_job(id: &str) -> Job {
		Job::new(id.to_owned(), "https://x/v/1".to_owned(), Utc::now())
	}

	#[tokio::test]
	async fn put_then_get_round_trips() {
		let store = InMemoryJobStore::new();
		store.put(new_job("a")).await.unwrap();
		let job = store.get("a").await.unwrap();
		assert_eq!(job.id, "a");
		assert_eq!(job.status, JobStatus::Queued);
	}

	#[tokio::test]
	async fn get_missing_is_not_found() {
		let store = InMemoryJobStore::new();
		assert!(matches!(store.get("missing").await, Err(StoreError::NotFound(_))));
	}

	#[tokio::test]
	async fn update_advances_status_forward() {
		let store = InMemoryJobStore::new();
		store.put(new_job("a")).await.unwrap();
		let job = store.update("a", Box::new(|j| j.status = JobStatus::Running)).await.unwrap();
		assert_eq!(job.status, JobStatus::Running);
	}

	#[tokio::test]
	async fn update_rejects_backward_transition() {
		let store = InMemoryJobStore::new();
		store.put(new_job("a")).await.unwrap();
		store.update("a", Box::new(|j| j.status = JobStatus::Running)).await.unwrap();
		let result = store.update("a", Box::new(|j| j.status = JobStatus::Queued)).await;
		assert!(matches!(result, Err(StoreError::InvalidTransition { .. })));
	}

	#[tokio::test]
	async fn update_to_same_status_is_a_no_op_write() {
		let store = InMemoryJobStore::new();
		store.put(new_job("a")).await.unwrap();
		let job = store.update("a", Box::new(|j| j.status = JobStatus::Queued)).await.unwrap();
		assert_eq!(job.status, JobStatus::Queued);
	}

	#[tokio::test]
	async fn concurrent_updates_are_serialized() {
		let store = InMemoryJobStore::new();
		store.put(new_job("a")).await.unwrap();

		let store_a = store.clone();
		let store_b = store.clone();
		let (r1, r2) = tokio::join!(store_a.update("a", Box::new(|j| j.status = JobStatus::Running)), store_b.update("a", Box::new(|j| j.status = JobStatus::Running)));
		assert!(r1.is_ok() && r2.is_ok());
		assert_eq!(store.get("a").await.unwrap().status, JobStatus::Running);
	}

	#[tokio::test]
	async fn list_returns_summaries_for_all_jobs() {
		let store = InMemoryJobStore::new();
		store.put(new_job("a")).await.unwrap();
		store.put(new_job("b")).await.unwrap();
		let summaries = store.list().await.unwrap();
		assert_eq!(summaries.len(), 2);
	}
}
