use serde::{Deserialize, Serialize};

/// A single transcript segment. `start_ms`/`end_ms` are the canonical
/// representation (exact integer millisecond ordering, no float drift);
/// `start`/`end` (seconds, as `f64`) are what crosses the JSON boundary.
/// Deserialization goes through `SegmentWire` (`#[serde(from = ...)]`) so
/// `start_ms`/`end_ms` are always re-derived from the wire seconds rather
/// than reset to `0` by `#[serde(skip)]`'s `Default` fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SegmentWire")]
pub struct Segment {
	#[serde(rename = "start")]
	pub start_seconds_wire: f64,
	#[serde(rename = "end")]
	pub end_seconds_wire: f64,
	pub text: String,

	#[serde(skip)]
	pub start_ms: u64,
	#[serde(skip)]
	pub end_ms: u64,
}

/// The wire shape alone, used only to deserialize `Segment` through.
#[derive(Deserialize)]
struct SegmentWire {
	start: f64,
	end: f64,
	text: String,
}

impl From<SegmentWire> for Segment {
	fn from(wire: SegmentWire) -> Self {
		Self {
			start_ms: seconds_to_ms(wire.start),
			end_ms: seconds_to_ms(wire.end),
			start_seconds_wire: wire.start,
			end_seconds_wire: wire.end,
			text: wire.text,
		}
	}
}

impl Segment {
	#[must_use]
	pub fn new(start_ms: u64, end_ms: u64, text: String) -> Self {
		Self {
			start_seconds_wire: ms_to_seconds(start_ms),
			end_seconds_wire: ms_to_seconds(end_ms),
			start_ms,
			end_ms,
			text,
		}
	}

	#[must_use]
	pub fn duration_ms(&self) -> u64 {
		self.end_ms.saturating_sub(self.start_ms)
	}
}

#[must_use]
pub fn ms_to_seconds(ms: u64) -> f64 {
	ms as f64 / 1000.0
}

#[must_use]
#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
pub fn seconds_to_ms(seconds: f64) -> u64 {
	(seconds.max(0.0) * 1000.0).round() as u64
}
