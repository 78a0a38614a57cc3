use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{instrument, warn};
use transcribe_core::Segment;

use crate::error::DriverError;
use crate::parse::parse_segments_json;
use crate::ToolDriver;

/// Resolved paths (or bare names looked up on `$PATH`) for the three
/// external binaries this driver shells out to.
#[derive(Debug, Clone)]
pub struct ToolPaths {
	pub downloader: String,
	pub audio_tool: String,
	pub transcriber: String,
}

/// `ToolDriver` backed by real subprocesses. Each call races the child
/// process against the caller's timeout and cancellation token, killing the
/// child on either.
#[derive(Debug, Clone)]
pub struct ProcessToolDriver {
	paths: ToolPaths,
}

impl ProcessToolDriver {
	#[must_use]
	pub fn new(paths: ToolPaths) -> Self {
		Self { paths }
	}
}

enum RaceOutcome<T> {
	Finished(Result<T, DriverError>),
	TimedOut,
	Cancelled,
}

/// Runs `fut` to completion unless `timeout` elapses or `cancel` fires
/// first, in which case the caller is responsible for killing its child
/// process before returning.
async fn race<T>(fut: impl std::future::Future<Output = Result<T, DriverError>>, timeout: Duration, cancel: &CancellationToken) -> RaceOutcome<T> {
	tokio::select! {
		result = fut => RaceOutcome::Finished(result),
		() = tokio::time::sleep(timeout) => RaceOutcome::TimedOut,
		() = cancel.cancelled() => RaceOutcome::Cancelled,
	}
}

/// Grace period between asking a child to terminate and forcing it.
const TERMINATION_GRACE_PERIOD: Duration = Duration::from_secs(2);

/// Sends the child a request to exit, waits `TERMINATION_GRACE_PERIOD` for it
/// to do so on its own, then force-kills it. `kill_on_drop(true)` on the
/// spawning `Command` remains a backstop for paths that never reach here
/// (e.g. this future itself being dropped); cancellation and timeouts are
/// driven through this sequence explicitly rather than left to `Drop`.
async fn terminate_then_kill(child: &mut Child) {
	if let Some(pid) = child.id() {
		request_exit(pid);
	} else {
		// Already reaped; nothing left to signal.
		return;
	}

	tokio::select! {
		_ = child.wait() => {}
		() = tokio::time::sleep(TERMINATION_GRACE_PERIOD) => {
			if let Err(error) = child.start_kill() {
				warn!(%error, "force-kill failed, process may already have exited");
			}
			let _ = child.wait().await;
		}
	}
}

#[cfg(unix)]
fn request_exit(pid: u32) {
	// No direct SIGTERM API on `tokio::process::Child`; shell out the same
	// way a one-off `kill` invocation would.
	let _ = std::process::Command::new("kill").arg("-TERM").arg(pid.to_string()).status();
}

#[cfg(not(unix))]
fn request_exit(_pid: u32) {}

async fn run_capturing_stdout(mut command: Command, timeout: Duration, cancel: CancellationToken, on_timeout: impl Fn(Duration) -> DriverError, on_failure: impl Fn(String) -> DriverError) -> Result<String, DriverError> {
	let mut child = command.kill_on_drop(true).spawn()?;
	let mut stdout_pipe = child.stdout.take().expect("stdout is piped");
	let mut stderr_pipe = child.stderr.take().expect("stderr is piped");

	let wait = async {
		let mut stdout_buf = Vec::new();
		let mut stderr_buf = Vec::new();
		let (status, _, _) = tokio::try_join!(child.wait(), stdout_pipe.read_to_end(&mut stdout_buf), stderr_pipe.read_to_end(&mut stderr_buf))?;
		if status.success() {
			Ok(String::from_utf8_lossy(&stdout_buf).into_owned())
		} else {
			Err(on_failure(String::from_utf8_lossy(&stderr_buf).into_owned()))
		}
	};

	match race(wait, timeout, &cancel).await {
		RaceOutcome::Finished(result) => result,
		RaceOutcome::TimedOut => {
			terminate_then_kill(&mut child).await;
			Err(on_timeout(timeout))
		}
		RaceOutcome::Cancelled => {
			terminate_then_kill(&mut child).await;
			Err(DriverError::Cancelled)
		}
	}
}

#[async_trait]
impl ToolDriver for ProcessToolDriver {
	#[instrument(skip(self, cancel))]
	async fn probe_duration(&self, source_url: &str, timeout: Duration, cancel: CancellationToken) -> Result<Duration, DriverError> {
		let mut command = Command::new(&self.paths.downloader);
		command.args(["--print", "duration", source_url]).stdout(std::process::Stdio::piped()).stderr(std::process::Stdio::piped());

		let stdout = run_capturing_stdout(command, timeout, cancel, DriverError::ProbeTimeout, |stderr| DriverError::InvalidSource(format!("probe failed: {stderr}"))).await?;

		let seconds: f64 = stdout.trim().parse().map_err(|_| DriverError::InvalidSource(format!("unparseable duration output: {stdout:?}")))?;
		if seconds <= 0.0 {
			return Err(DriverError::InvalidSource(format!("non-positive probed duration: {seconds}")));
		}
		Ok(Duration::from_secs_f64(seconds.max(0.0)))
	}

	#[instrument(skip(self, cancel))]
	async fn download_audio(&self, source_url: &str, dest_path: &Path, timeout: Duration, cancel: CancellationToken) -> Result<(), DriverError> {
		let mut command = Command::new(&self.paths.downloader);
		command.args(["-x", "--audio-format", "wav", "-o"]).arg(dest_path).arg(source_url).stdout(std::process::Stdio::piped()).stderr(std::process::Stdio::piped());

		run_capturing_stdout(command, timeout, cancel, DriverError::DownloadTimeout, DriverError::DownloadFailed).await?;
		Ok(())
	}

	#[instrument(skip(self, cancel))]
	async fn normalize_audio(&self, input_path: &Path, output_path: &Path, timeout: Duration, cancel: CancellationToken) -> Result<(), DriverError> {
		let mut command = Command::new(&self.paths.audio_tool);
		command
			.args(["-y", "-i"])
			.arg(input_path)
			.args(["-ar", "16000", "-ac", "1"])
			.arg(output_path)
			.stdout(std::process::Stdio::piped())
			.stderr(std::process::Stdio::piped());

		run_capturing_stdout(command, timeout, cancel, DriverError::NormalizeTimeout, DriverError::NormalizeFailed).await?;
		Ok(())
	}

	#[instrument(skip(self, cancel))]
	async fn transcribe(&self, audio_path: &Path, timeout: Duration, cancel: CancellationToken) -> Result<Vec<Segment>, DriverError> {
		let mut command = Command::new(&self.paths.transcriber);
		command.args(["--output-format", "json", "--input"]).arg(audio_path).stdout(std::process::Stdio::piped()).stderr(std::process::Stdio::piped());

		let stdout = run_capturing_stdout(command, timeout, cancel, DriverError::TranscribeTimeout, |stderr| DriverError::TranscribeFailed(stderr)).await?;

		parse_segments_json(&stdout).map_err(|err| {
			warn!(error = %err, "transcriber produced malformed JSON");
			DriverError::MalformedOutput(err)
		})
	}
}
