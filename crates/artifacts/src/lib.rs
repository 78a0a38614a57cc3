mod format;

use std::path::Path;

use thiserror::Error;
use transcribe_core::Segment;

pub use format::format_timestamp;

#[derive(Error, Debug)]
pub enum ArtifactError {
	#[error("artifact I/O error: {0}")]
	Io(#[from] std::io::Error),
}

impl From<ArtifactError> for transcribe_core::CoreError {
	fn from(error: ArtifactError) -> Self {
		match error {
			ArtifactError::Io(e) => Self::ArtifactIo(e.to_string()),
		}
	}
}

/// Render `segments` as an SRT subtitle file at `path`. Writing is
/// idempotent: re-rendering the same segments to the same path overwrites
/// with byte-identical content. If `segments` is empty, `fallback_text`
/// (if given) becomes a single cue spanning `[0, ∞)`; otherwise the file is
/// written with no cues.
pub fn write_srt(path: &Path, segments: &[Segment], fallback_text: Option<&str>) -> Result<(), ArtifactError> {
	let mut body = String::new();
	for (index, segment) in effective_segments(segments, fallback_text).iter().enumerate() {
		body.push_str(&(index + 1).to_string());
		body.push('\n');
		body.push_str(&format_timestamp(segment.start_ms, ','));
		body.push_str(" --> ");
		body.push_str(&format_timestamp(segment.end_ms, ','));
		body.push('\n');
		body.push_str(&segment.text);
		body.push_str("\n\n");
	}
	std::fs::write(path, body)?;
	Ok(())
}

/// Render `segments` as a WebVTT subtitle file at `path`. Same idempotency
/// and degenerate-input handling as [`write_srt`].
pub fn write_vtt(path: &Path, segments: &[Segment], fallback_text: Option<&str>) -> Result<(), ArtifactError> {
	let mut body = String::from("WEBVTT\n\n");
	for segment in effective_segments(segments, fallback_text) {
		body.push_str(&format_timestamp(segment.start_ms, '.'));
		body.push_str(" --> ");
		body.push_str(&format_timestamp(segment.end_ms, '.'));
		body.push('\n');
		body.push_str(&segment.text);
		body.push_str("\n\n");
	}
	std::fs::write(path, body)?;
	Ok(())
}

/// `99:59:59,999`, the conventional subtitle-format stand-in for "no end
/// bound": the largest timestamp `format_timestamp`'s `HH:MM:SS` fields can
/// render without overflowing their two-digit width.
const UNBOUNDED_END_MS: u64 = 359_999_999;

/// A fallback cue spans `[0, ∞)` (per the no-speech-detected case): it
/// should outlast any real media duration rather than collapsing to a
/// zero-length cue no player would display.
fn effective_segments(segments: &[Segment], fallback_text: Option<&str>) -> Vec<Segment> {
	if segments.is_empty() {
		fallback_text.map_or_else(Vec::new, |text| vec![Segment::new(0, UNBOUNDED_END_MS, text.to_owned())])
	} else {
		segments.to_vec()
	}
}

/// Trait wrapper over the free functions above, so `pipeline` can depend on
/// a mockable seam instead of calling `std::fs` directly.
pub trait ArtifactWriter: Send + Sync {
	fn write_srt(&self, path: &Path, segments: &[Segment], fallback_text: Option<&str>) -> Result<(), ArtifactError>;
	fn write_vtt(&self, path: &Path, segments: &[Segment], fallback_text: Option<&str>) -> Result<(), ArtifactError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FilesystemArtifactWriter;

impl ArtifactWriter for FilesystemArtifactWriter {
	fn write_srt(&self, path: &Path, segments: &[Segment], fallback_text: Option<&str>) -> Result<(), ArtifactError> {
		write_srt(path, segments, fallback_text)
	}

	fn write_vtt(&self, path: &Path, segments: &[Segment], fallback_text: Option<&str>) -> Result<(), ArtifactError> {
		write_vtt(path, segments, fallback_text)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn srt_renders_one_indexed_cues_with_comma_millis() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("out.srt");
		let segments = vec![Segment::new(0, 1_500, "hello".to_owned()), Segment::new(1_500, 3_000, "world".to_owned())];
		write_srt(&path, &segments, None).unwrap();
		let content = std::fs::read_to_string(&path).unwrap();
		assert!(content.starts_with("1\n00:00:00,000 --> 00:00:01,500\nhello\n\n2\n"));
	}

	#[test]
	fn vtt_has_webvtt_header_and_dot_millis() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("out.vtt");
		let segments = vec![Segment::new(0, 1_500, "hello".to_owned())];
		write_vtt(&path, &segments, None).unwrap();
		let content = std::fs::read_to_string(&path).unwrap();
		assert!(content.starts_with("WEBVTT\n\n00:00:00.000 --> 00:00:01.500\nhello\n\n"));
	}

	#[test]
	fn empty_segments_with_fallback_yields_single_unbounded_cue() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("out.srt");
		write_srt(&path, &[], Some("no speech detected")).unwrap();
		let content = std::fs::read_to_string(&path).unwrap();
		assert_eq!(content, "1\n00:00:00,000 --> 99:59:59,999\nno speech detected\n\n");
	}

	#[test]
	fn empty_segments_without_fallback_yields_empty_cue_list() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("out.vtt");
		write_vtt(&path, &[], None).unwrap();
		let content = std::fs::read_to_string(&path).unwrap();
		assert_eq!(content, "WEBVTT\n\n");
	}

	#[test]
	fn rerendering_is_idempotent() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("out.srt");
		let segments = vec![Segment::new(0, 1_000, "hi".to_owned())];
		write_srt(&path, &segments, None).unwrap();
		let first = std::fs::read_to_string(&path).unwrap();
		write_srt(&path, &segments, None).unwrap();
		let second = std::fs::read_to_string(&path).unwrap();
		assert_eq!(first, second);
	}
}
