use thiserror::Error;

/// The error taxonomy every crate in this workspace converges on. Narrower
/// per-crate error types (`DriverError`, `StoreError`, ...) convert into this
/// via `From` so the HTTP layer has a single kind-to-status mapping.
#[derive(Error, Debug)]
pub enum CoreError {
	#[error("invalid argument: {0}")]
	InvalidArgument(String),

	#[error("unauthenticated")]
	Unauthenticated,

	#[error("job not found: {0}")]
	NotFound(String),

	#[error("invalid source: {0}")]
	InvalidSource(String),

	#[error("probe timed out after {0:?}")]
	ProbeTimeout(std::time::Duration),

	#[error("download timed out after {0:?}")]
	DownloadTimeout(std::time::Duration),

	#[error("normalize timed out after {0:?}")]
	NormalizeTimeout(std::time::Duration),

	#[error("transcribe timed out after {0:?}")]
	TranscribeTimeout(std::time::Duration),

	#[error("download failed: {0}")]
	DownloadFailed(String),

	#[error("normalize failed: {0}")]
	NormalizeFailed(String),

	#[error("transcribe failed: {0}")]
	TranscribeFailed(String),

	#[error("artifact I/O error: {0}")]
	ArtifactIo(String),

	#[error("invalid job state transition: {from:?} -> {to:?}")]
	InvalidTransition { from: crate::job::JobStatus, to: crate::job::JobStatus },

	#[error("job cancelled")]
	Cancelled,

	#[error("internal error: {0}")]
	Internal(String),
}

impl CoreError {
	/// True for the subset of kinds a caller can plausibly retry without
	/// changing anything (timeouts, transient download/normalize failures).
	#[must_use]
	pub const fn is_retryable(&self) -> bool {
		matches!(
			self,
			Self::ProbeTimeout(_) | Self::DownloadTimeout(_) | Self::NormalizeTimeout(_) | Self::TranscribeTimeout(_) | Self::DownloadFailed(_)
		)
	}
}

impl From<std::io::Error> for CoreError {
	fn from(error: std::io::Error) -> Self {
		Self::ArtifactIo(error.to_string())
	}
}
