use serde::Deserialize;
use transcribe_core::segment::seconds_to_ms;
use transcribe_core::Segment;

/// Transcriber JSON output, one entry per recognized segment, before policy
/// normalization (clamping, trimming, sorting).
#[derive(Debug, Clone, Deserialize)]
pub struct RawSegment {
	pub start: f64,
	pub end: f64,
	pub text: String,
}

/// Parse raw transcriber JSON (`{"segments": [...]}`) into normalized,
/// policy-applied `Segment`s:
/// - text is trimmed; segments that are empty after trimming are dropped
/// - `end < start` is clamped by swapping the two
/// - segments are stably sorted by `start`, ties broken by original order
#[must_use]
pub fn normalize(raw: Vec<RawSegment>) -> Vec<Segment> {
	let mut segments: Vec<Segment> = raw
		.into_iter()
		.filter_map(|r| {
			let text = r.text.trim().to_owned();
			if text.is_empty() {
				return None;
			}
			let (start_ms, end_ms) = {
				let a = seconds_to_ms(r.start);
				let b = seconds_to_ms(r.end);
				if b < a {
					(b, a)
				} else {
					(a, b)
				}
			};
			Some(Segment::new(start_ms, end_ms, text))
		})
		.collect();
	segments.sort_by_key(|s| s.start_ms);
	segments
}

#[must_use]
pub fn parse_segments_json(body: &str) -> Result<Vec<Segment>, serde_json::Error> {
	#[derive(Deserialize)]
	struct Output {
		segments: Vec<RawSegment>,
	}
	let output: Output = serde_json::from_str(body)?;
	Ok(normalize(output.segments))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn drops_empty_after_trim() {
		let raw = vec![RawSegment { start: 0.0, end: 1.0, text: "  ".to_owned() }, RawSegment { start: 1.0, end: 2.0, text: "hi".to_owned() }];
		let out = normalize(raw);
		assert_eq!(out.len(), 1);
		assert_eq!(out[0].text, "hi");
	}

	#[test]
	fn clamps_end_before_start_by_swapping() {
		let raw = vec![RawSegment { start: 5.0, end: 2.0, text: "oops".to_owned() }];
		let out = normalize(raw);
		assert_eq!(out[0].start_ms, 2_000);
		assert_eq!(out[0].end_ms, 5_000);
	}

	#[test]
	fn sorts_by_start() {
		let raw = vec![RawSegment { start: 3.0, end: 4.0, text: "b".to_owned() }, RawSegment { start: 1.0, end: 2.0, text: "a".to_owned() }];
		let out = normalize(raw);
		assert_eq!(out[0].text, "a");
		assert_eq!(out[1].text, "b");
	}

	#[test]
	fn parses_from_json_envelope() {
		let body = r#"{"segments":[{"start":0.0,"end":1.5,"text":"hello"}]}"#;
		let segments = parse_segments_json(body).unwrap();
		assert_eq!(segments.len(), 1);
		assert_eq!(segments[0].end_ms, 1_500);
	}
}
