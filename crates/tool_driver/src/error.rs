use std::time::Duration;

use thiserror::Error;
use transcribe_core::CoreError;

#[derive(Error, Debug)]
pub enum DriverError {
	#[error("probe timed out after {0:?}")]
	ProbeTimeout(Duration),

	#[error("invalid source: {0}")]
	InvalidSource(String),

	#[error("download timed out after {0:?}")]
	DownloadTimeout(Duration),

	#[error("normalize timed out after {0:?}")]
	NormalizeTimeout(Duration),

	#[error("transcribe timed out after {0:?}")]
	TranscribeTimeout(Duration),

	#[error("download failed: {0}")]
	DownloadFailed(String),

	#[error("normalize failed: {0}")]
	NormalizeFailed(String),

	#[error("transcribe failed: {0}")]
	TranscribeFailed(String),

	#[error("cancelled")]
	Cancelled,

	#[error("tool invocation error: {0}")]
	Spawn(#[from] std::io::Error),

	#[error("malformed transcriber output: {0}")]
	MalformedOutput(#[from] serde_json::Error),
}

impl From<DriverError> for CoreError {
	fn from(error: DriverError) -> Self {
		match error {
			DriverError::ProbeTimeout(d) => Self::ProbeTimeout(d),
			DriverError::InvalidSource(m) => Self::InvalidSource(m),
			DriverError::DownloadTimeout(d) => Self::DownloadTimeout(d),
			DriverError::NormalizeTimeout(d) => Self::NormalizeTimeout(d),
			DriverError::TranscribeTimeout(d) => Self::TranscribeTimeout(d),
			DriverError::DownloadFailed(m) => Self::DownloadFailed(m),
			DriverError::NormalizeFailed(m) => Self::NormalizeFailed(m),
			DriverError::TranscribeFailed(m) => Self::TranscribeFailed(m),
			DriverError::MalformedOutput(e) => Self::TranscribeFailed(e.to_string()),
			DriverError::Cancelled => Self::Cancelled,
			DriverError::Spawn(e) => Self::Internal(e.to_string()),
		}
	}
}
