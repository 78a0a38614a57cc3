use std::time::Duration;

use clap::Parser;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Full runtime configuration for the transcription core, loaded once in
/// `main` and shared (as `Arc<Config>`) by every crate that needs a slice
/// of it.
#[derive(Parser, Clone, Debug, Serialize, Deserialize)]
#[command(author, version, about, long_about = None)]
pub struct Config {
	/// Shared bearer token required on `/transcribe*` routes.
	#[arg(long, env = "API_KEY")]
	pub api_key: String,

	/// Root directory for per-job scratch files (downloads, normalized audio).
	#[arg(long, env = "WORK_DIR", default_value = "/tmp/transcribe-work")]
	pub work_dir: String,

	/// Directory rendered SRT/VTT artifacts are written under.
	#[arg(long, env = "OUTPUT_DIR", default_value = "/tmp/transcribe-output")]
	pub output_dir: String,

	/// Media longer than this (seconds) is rejected with `InvalidArgument`.
	#[arg(long, env = "MAX_VIDEO_LENGTH_SECS", default_value = "14400")]
	pub max_video_length_secs: u64,

	/// Media at or under this duration (seconds) is transcribed synchronously.
	#[arg(long, env = "SYNC_THRESHOLD_SECONDS", default_value = "120")]
	pub sync_threshold_seconds: u64,

	/// Number of concurrent pipeline workers in the scheduler's pool.
	#[arg(long, env = "WORKER_CONCURRENCY", default_value = "4")]
	pub worker_concurrency: usize,

	/// Webhook callback URL. Unset disables webhook delivery entirely.
	#[arg(long, env = "WEBHOOK_URL")]
	pub webhook_url: Option<String>,

	/// Shared secret sent as `X-Webhook-Secret` on every webhook request.
	#[arg(long, env = "WEBHOOK_SECRET")]
	pub webhook_secret: Option<String>,

	/// Comma-separated event kinds to deliver; empty/unset means all kinds.
	#[arg(long, env = "WEBHOOK_EVENTS", value_delimiter = ',')]
	pub webhook_events: Vec<String>,

	/// Maximum webhook delivery attempts beyond the first.
	#[arg(long, env = "WEBHOOK_MAX_RETRIES", default_value = "5")]
	pub webhook_max_retries: u32,

	/// Advisory ceiling on jobs servable without a paid plan upstream; not
	/// enforced by this core (see DESIGN.md Open Question decisions).
	#[arg(long, env = "FREE_JOB_LIMIT", default_value = "100")]
	pub free_job_limit: u64,

	/// HTTP bind address.
	#[arg(long, env = "HOST", default_value = "0.0.0.0")]
	pub host: String,

	/// HTTP bind port.
	#[arg(long, env = "PORT", default_value = "8080")]
	pub port: u16,

	/// Maximum accepted request body size, in bytes (guards `/transcribe`
	/// against oversized bodies; the pipeline's own work lives well below
	/// this).
	#[arg(long, env = "MAX_REQUEST_BODY_BYTES", default_value = "65536")]
	pub max_request_body_bytes: usize,

	/// Wall-clock bound on handling a single HTTP request. The sync
	/// transcription path can legitimately run long, so this is sized
	/// generously above `sync_threshold_seconds` rather than tightly.
	#[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "600")]
	pub request_timeout_secs: u64,

	/// `tracing_subscriber::EnvFilter` directive string.
	#[arg(long, env = "RUST_LOG", default_value = "info")]
	pub rust_log: String,

	/// Emit logs as JSON instead of the human-readable formatter.
	#[arg(long, env = "LOG_JSON", default_value = "false")]
	pub log_json: bool,

	/// Optional override for the `yt-dlp`-style download tool binary.
	#[arg(long, env = "DOWNLOADER_PATH", default_value = "yt-dlp")]
	pub downloader_path: String,

	/// Optional override for the audio-normalization tool binary.
	#[arg(long, env = "AUDIO_TOOL_PATH", default_value = "ffmpeg")]
	pub audio_tool_path: String,

	/// Optional override for the transcriber tool binary.
	#[arg(long, env = "TRANSCRIBER_PATH", default_value = "whisper")]
	pub transcriber_path: String,

	#[arg(long, env = "PROBE_TIMEOUT_SECS", default_value = "30", value_parser = parse_duration)]
	pub probe_timeout: Duration,

	#[arg(long, env = "DOWNLOAD_TIMEOUT_SECS", default_value = "600", value_parser = parse_duration)]
	pub download_timeout: Duration,

	#[arg(long, env = "NORMALIZE_TIMEOUT_SECS", default_value = "120", value_parser = parse_duration)]
	pub normalize_timeout: Duration,

	/// Floor of the transcribe-stage timeout (`max(base, per_audio_second *
	/// duration)`).
	#[arg(long, env = "TRANSCRIBE_TIMEOUT_BASE_SECS", default_value = "180", value_parser = parse_duration)]
	pub transcribe_timeout_base: Duration,

	/// Per-second-of-audio multiplier used alongside the base floor above.
	#[arg(long, env = "TRANSCRIBE_TIMEOUT_PER_AUDIO_SECOND", default_value = "4")]
	pub transcribe_timeout_per_audio_second: u64,

	/// Only consulted when `job_store` is built with the sqlite backend.
	#[arg(long, env = "DATABASE_URL")]
	pub database_url: Option<String>,
}

impl Config {
	pub fn load() -> Self {
		Self::parse()
	}

	/// Timeout for the transcribe stage of a job of the given duration,
	/// per `max(base, per_audio_second * duration)`.
	#[must_use]
	pub fn transcribe_timeout_for(&self, media_duration: Duration) -> Duration {
		let scaled = Duration::from_secs(self.transcribe_timeout_per_audio_second.saturating_mul(media_duration.as_secs()));
		self.transcribe_timeout_base.max(scaled)
	}

	/// Whether `duration` qualifies for the synchronous response path.
	#[must_use]
	pub fn is_sync_eligible(&self, media_duration: Duration) -> bool {
		media_duration.as_secs() <= self.sync_threshold_seconds
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.api_key.trim().is_empty() {
			return Err(ConfigError::Invalid("api_key must not be empty".to_owned()));
		}
		if self.worker_concurrency == 0 {
			return Err(ConfigError::Invalid("worker_concurrency must be at least 1".to_owned()));
		}
		if self.max_video_length_secs == 0 {
			return Err(ConfigError::Invalid("max_video_length_secs must be positive".to_owned()));
		}
		Ok(())
	}

	#[cfg(any(test, feature = "test-util"))]
	#[must_use]
	pub fn test() -> Self {
		Self {
			api_key: "test-key".to_owned(),
			work_dir: "/tmp/transcribe-work-test".to_owned(),
			output_dir: "/tmp/transcribe-output-test".to_owned(),
			max_video_length_secs: 14_400,
			sync_threshold_seconds: 120,
			worker_concurrency: 2,
			webhook_url: None,
			webhook_secret: None,
			webhook_events: Vec::new(),
			webhook_max_retries: 1,
			free_job_limit: 100,
			host: "127.0.0.1".to_owned(),
			port: 0,
			max_request_body_bytes: 65_536,
			request_timeout_secs: 600,
			rust_log: "info".to_owned(),
			log_json: false,
			downloader_path: "true".to_owned(),
			audio_tool_path: "true".to_owned(),
			transcriber_path: "true".to_owned(),
			probe_timeout: Duration::from_secs(5),
			download_timeout: Duration::from_secs(5),
			normalize_timeout: Duration::from_secs(5),
			transcribe_timeout_base: Duration::from_secs(5),
			transcribe_timeout_per_audio_second: 1,
			database_url: None,
		}
	}
}

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("invalid configuration: {0}")]
	Invalid(String),
}

fn parse_duration(s: &str) -> Result<Duration, std::num::ParseIntError> {
	s.parse::<u64>().map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_config_validates() {
		assert!(Config::test().validate().is_ok());
	}

	#[test]
	fn rejects_empty_api_key() {
		let mut cfg = Config::test();
		cfg.api_key = String::new();
		assert!(cfg.validate().is_err());
	}

	#[test]
	fn transcribe_timeout_uses_the_larger_of_base_and_scaled() {
		let cfg = Config::test();
		assert_eq!(cfg.transcribe_timeout_for(Duration::from_secs(1)), cfg.transcribe_timeout_base);
		let long = Duration::from_secs(1000);
		assert_eq!(cfg.transcribe_timeout_for(long), Duration::from_secs(cfg.transcribe_timeout_per_audio_second * 1000));
	}

	#[test]
	fn sync_eligibility_boundary_is_inclusive() {
		let cfg = Config::test();
		assert!(cfg.is_sync_eligible(Duration::from_secs(cfg.sync_threshold_seconds)));
		assert!(!cfg.is_sync_eligible(Duration::from_secs(cfg.sync_threshold_seconds + 1)));
	}

	#[test]
	fn parses_from_cli_args() {
		let args = vec!["program", "--api-key", "k", "--worker-concurrency", "8"];
		let config = Config::try_parse_from(args).unwrap();
		assert_eq!(config.api_key, "k");
		assert_eq!(config.worker_concurrency, 8);
	}
}
