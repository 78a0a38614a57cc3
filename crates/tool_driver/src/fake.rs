use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use transcribe_core::Segment;

use crate::error::DriverError;
use crate::ToolDriver;

/// Scripted `ToolDriver` for pipeline/scheduler tests. Each stage's queue of
/// outcomes is consumed in order; an exhausted queue panics, which surfaces
/// a mis-scripted test instead of silently returning a default.
#[derive(Default)]
pub struct FakeToolDriver {
	pub durations: Mutex<VecDeque<Result<Duration, DriverError>>>,
	pub downloads: Mutex<VecDeque<Result<(), DriverError>>>,
	pub normalizes: Mutex<VecDeque<Result<(), DriverError>>>,
	pub transcriptions: Mutex<VecDeque<Result<Vec<Segment>, DriverError>>>,
}

impl FakeToolDriver {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with_probe(self, result: Result<Duration, DriverError>) -> Self {
		self.durations.lock().expect("lock").push_back(result);
		self
	}

	#[must_use]
	pub fn with_download(self, result: Result<(), DriverError>) -> Self {
		self.downloads.lock().expect("lock").push_back(result);
		self
	}

	#[must_use]
	pub fn with_normalize(self, result: Result<(), DriverError>) -> Self {
		self.normalizes.lock().expect("lock").push_back(result);
		self
	}

	#[must_use]
	pub fn with_transcription(self, result: Result<Vec<Segment>, DriverError>) -> Self {
		self.transcriptions.lock().expect("lock").push_back(result);
		self
	}
}

#[async_trait]
impl ToolDriver for FakeToolDriver {
	async fn probe_duration(&self, _source_url: &str, _timeout: Duration, _cancel: CancellationToken) -> Result<Duration, DriverError> {
		self.durations.lock().expect("lock").pop_front().expect("FakeToolDriver: probe_duration called more times than scripted")
	}

	async fn download_audio(&self, _source_url: &str, _dest_path: &Path, _timeout: Duration, _cancel: CancellationToken) -> Result<(), DriverError> {
		self.downloads.lock().expect("lock").pop_front().expect("FakeToolDriver: download_audio called more times than scripted")
	}

	async fn normalize_audio(&self, _input_path: &Path, _output_path: &Path, _timeout: Duration, _cancel: CancellationToken) -> Result<(), DriverError> {
		self.normalizes.lock().expect("lock").pop_front().expect("FakeToolDriver: normalize_audio called more times than scripted")
	}

	async fn transcribe(&self, _audio_path: &Path, _timeout: Duration, _cancel: CancellationToken) -> Result<Vec<Segment>, DriverError> {
		self.transcriptions.lock().expect("lock").pop_front().expect("FakeToolDriver: transcribe called more times than scripted")
	}
}
