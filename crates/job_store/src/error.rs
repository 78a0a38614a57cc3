use thiserror::Error;
use transcribe_core::job::JobStatus;
use transcribe_core::CoreError;

#[derive(Error, Debug)]
pub enum StoreError {
	#[error("job not found: {0}")]
	NotFound(String),

	#[error("invalid job state transition: {from:?} -> {to:?}")]
	InvalidTransition { from: JobStatus, to: JobStatus },

	#[error("job store backend error: {0}")]
	Backend(String),
}

impl From<StoreError> for CoreError {
	fn from(error: StoreError) -> Self {
		match error {
			StoreError::NotFound(id) => Self::NotFound(id),
			StoreError::InvalidTransition { from, to } => Self::InvalidTransition { from, to },
			StoreError::Backend(message) => Self::Internal(message),
		}
	}
}

impl From<sqlx::Error> for StoreError {
	fn from(error: sqlx::Error) -> Self {
		Self::Backend(error.to_string())
	}
}

impl From<serde_json::Error> for StoreError {
	fn from(error: serde_json::Error) -> Self {
		Self::Backend(format!("segment serialization error: {error}"))
	}
}
