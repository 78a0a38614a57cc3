pub mod error;
pub mod parse;
pub mod process;

#[cfg(any(test, feature = "test-util"))]
pub mod fake;

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use transcribe_core::Segment;

pub use error::DriverError;
pub use process::{ProcessToolDriver, ToolPaths};

/// The four external-tool operations a pipeline stage calls through. Kept as
/// a trait so `pipeline`/`scheduler` depend on behavior, not on spawning a
/// real subprocess — tests wire `fake::FakeToolDriver` instead.
#[async_trait]
pub trait ToolDriver: Send + Sync {
	async fn probe_duration(&self, source_url: &str, timeout: Duration, cancel: CancellationToken) -> Result<Duration, DriverError>;

	async fn download_audio(&self, source_url: &str, dest_path: &Path, timeout: Duration, cancel: CancellationToken) -> Result<(), DriverError>;

	async fn normalize_audio(&self, input_path: &Path, output_path: &Path, timeout: Duration, cancel: CancellationToken) -> Result<(), DriverError>;

	async fn transcribe(&self, audio_path: &Path, timeout: Duration, cancel: CancellationToken) -> Result<Vec<Segment>, DriverError>;
}
