pub mod error;
pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use transcribe_core::job::{Job, JobSummary, JobStatus};

pub use error::StoreError;
pub use memory::InMemoryJobStore;
pub use sqlite::SqliteJobStore;

/// A mutation applied to a job under the store's lock. Boxed so
/// `JobStore` stays object-safe (`Arc<dyn JobStore>` is how every other
/// crate holds it).
pub type Mutation = Box<dyn FnOnce(&mut Job) + Send>;

/// Persistence contract for jobs. A plain mutex-guarded map and a
/// `sqlx`-backed relational table both satisfy this with identical
/// monotonicity guarantees: `update` rejects a mutation that would move
/// `status` backward or out of a terminal state.
#[async_trait]
pub trait JobStore: Send + Sync {
	async fn put(&self, job: Job) -> Result<(), StoreError>;
	async fn get(&self, id: &str) -> Result<Job, StoreError>;
	async fn update(&self, id: &str, mutate: Mutation) -> Result<Job, StoreError>;
	async fn list(&self) -> Result<Vec<JobSummary>, StoreError>;
}

/// Shared monotonicity check every `JobStore` implementation runs before
/// committing an `update`.
pub(crate) fn check_transition(from: JobStatus, to: JobStatus) -> Result<(), StoreError> {
	if from == to || from.can_transition_to(to) {
		Ok(())
	} else {
		Err(StoreError::InvalidTransition { from, to })
	}
}
