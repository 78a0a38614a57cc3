use thiserror::Error;
use transcribe_core::CoreError;

#[derive(Error, Debug)]
pub enum SchedulerError {
	#[error(transparent)]
	Driver(#[from] tool_driver::DriverError),

	#[error(transparent)]
	Pipeline(#[from] pipeline::PipelineError),

	#[error(transparent)]
	Store(#[from] job_store::StoreError),

	#[error("source duration {actual:?} exceeds max_video_length {max:?}")]
	DurationExceeded { actual: std::time::Duration, max: std::time::Duration },

	#[error("invalid url: {0}")]
	InvalidUrl(String),

	#[error("job topic closed, worker pool is not accepting new jobs")]
	TopicClosed,
}

impl From<SchedulerError> for CoreError {
	fn from(error: SchedulerError) -> Self {
		match error {
			SchedulerError::Driver(e) => e.into(),
			SchedulerError::Pipeline(e) => e.into(),
			SchedulerError::Store(e) => e.into(),
			SchedulerError::DurationExceeded { actual, max } => Self::InvalidArgument(format!("source duration {actual:?} exceeds configured maximum {max:?}")),
			SchedulerError::InvalidUrl(message) => Self::InvalidArgument(message),
			SchedulerError::TopicClosed => Self::Internal("job topic closed".to_owned()),
		}
	}
}
