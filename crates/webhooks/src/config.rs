use std::time::Duration;

use transcribe_core::WebhookEventKind;

/// Narrow config slice the notifier needs, kept decoupled from
/// `transcribe_config::Config` (teacher pattern: small crates take a
/// narrow config struct, e.g. `file_host`'s `CacheConfig::from(config)`).
#[derive(Debug, Clone)]
pub struct WebhookConfig {
	pub url: Option<String>,
	pub secret: Option<String>,
	pub subscribed_events: Vec<WebhookEventKind>,
	pub timeout: Duration,
	pub max_retries: u32,
}

impl WebhookConfig {
	#[must_use]
	pub fn from_parts(url: Option<String>, secret: Option<String>, events: &[String], timeout: Duration, max_retries: u32) -> Self {
		let subscribed_events = events.iter().filter_map(|name| parse_event_kind(name)).collect();
		Self { url, secret, subscribed_events, timeout, max_retries }
	}

	/// Per spec.md §4.F: an empty subscription set means "all events".
	#[must_use]
	pub fn wants(&self, kind: WebhookEventKind) -> bool {
		self.subscribed_events.is_empty() || self.subscribed_events.contains(&kind)
	}
}

fn parse_event_kind(name: &str) -> Option<WebhookEventKind> {
	match name.trim() {
		"job.queued" => Some(WebhookEventKind::JobQueued),
		"job.started" => Some(WebhookEventKind::JobStarted),
		"job.completed" => Some(WebhookEventKind::JobCompleted),
		"job.failed" => Some(WebhookEventKind::JobFailed),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_subscription_list_means_all_events() {
		let config = WebhookConfig::from_parts(Some("https://x".to_owned()), None, &[], Duration::from_secs(1), 1);
		assert!(config.wants(WebhookEventKind::JobStarted));
		assert!(config.wants(WebhookEventKind::JobFailed));
	}

	#[test]
	fn non_empty_subscription_filters_to_named_kinds() {
		let config = WebhookConfig::from_parts(Some("https://x".to_owned()), None, &["job.completed".to_owned()], Duration::from_secs(1), 1);
		assert!(config.wants(WebhookEventKind::JobCompleted));
		assert!(!config.wants(WebhookEventKind::JobStarted));
	}

	#[test]
	fn unrecognized_event_names_are_ignored_not_fatal() {
		let config = WebhookConfig::from_parts(None, None, &["job.completed".to_owned(), "bogus".to_owned()], Duration::from_secs(1), 1);
		assert_eq!(config.subscribed_events.len(), 1);
	}
}
