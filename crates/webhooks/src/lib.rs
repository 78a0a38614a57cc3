mod config;

pub use config::WebhookConfig;

use std::time::Duration;

use reqwest::Client;
use tracing::warn;
use transcribe_core::WebhookEvent;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);
const SECRET_HEADER: &str = "X-Webhook-Secret";

/// Delivers lifecycle events to a single configured URL with bounded
/// retries and exponential backoff, per spec.md §4.F. Never surfaces an
/// error to the caller — delivery failure is logged and dropped, the job
/// outcome it describes is unaffected.
pub struct WebhookNotifier {
	client: Client,
	config: WebhookConfig,
}

impl WebhookNotifier {
	#[must_use]
	pub fn new(config: WebhookConfig) -> Self {
		Self { client: Client::new(), config }
	}

	/// Fires `event` if its kind is subscribed and a URL is configured.
	/// Synchronous with respect to the caller (the worker awaits this
	/// before moving on), so it is naturally ordered after the store
	/// update that produced the transition.
	pub async fn notify(&self, event: &WebhookEvent) {
		let Some(url) = self.config.url.as_deref() else {
			return;
		};
		let Some(kind) = event.kind() else {
			warn!(event = %event.event, "webhook event with unrecognized kind, not delivering");
			return;
		};
		if !self.config.wants(kind) {
			return;
		}

		let attempts = 1 + self.config.max_retries;
		let mut backoff = INITIAL_BACKOFF;

		for attempt in 1..=attempts {
			match self.attempt(url, event).await {
				Ok(()) => return,
				Err(error) => {
					if attempt == attempts {
						warn!(job_id = %event.job_id, event = %event.event, %error, attempts, "webhook delivery failed, giving up");
						return;
					}
					warn!(job_id = %event.job_id, event = %event.event, %error, attempt, attempts, backoff_secs = backoff.as_secs(), "webhook delivery attempt failed, retrying");
					tokio::time::sleep(backoff).await;
					backoff = (backoff * 2).min(MAX_BACKOFF);
				}
			}
		}
	}

	async fn attempt(&self, url: &str, event: &WebhookEvent) -> Result<(), DeliveryError> {
		let mut request = self.client.post(url).timeout(self.config.timeout).json(event);
		if let Some(secret) = self.config.secret.as_deref() {
			request = request.header(SECRET_HEADER, secret);
		}

		let response = request.send().await.map_err(DeliveryError::Transport)?;
		if response.status().is_success() {
			Ok(())
		} else {
			Err(DeliveryError::Status(response.status().as_u16()))
		}
	}
}

#[derive(Debug, thiserror::Error)]
enum DeliveryError {
	#[error("transport error: {0}")]
	Transport(reqwest::Error),
	#[error("non-2xx response: {0}")]
	Status(u16),
}

#[cfg(test)]
mod tests {
	use chrono::Utc;
	use transcribe_core::job::{Job, JobStatus};
	use transcribe_core::WebhookEventKind;
	use wiremock::matchers::{header, method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	use super::*;

	fn job(status: JobStatus) -> Job {
		let mut job = Job::new("job-1".to_owned(), "https://x/v/1".to_owned(), Utc::now());
		job.status = status;
		job
	}

	#[tokio::test]
	async fn delivers_subscribed_event_with_secret_header() {
		let server = MockServer::start().await;
		Mock::given(method("POST")).and(path("/hook")).and(header(SECRET_HEADER, "s3cr3t")).respond_with(ResponseTemplate::new(200)).expect(1).mount(&server).await;

		let config = WebhookConfig::from_parts(Some(format!("{}/hook", server.uri())), Some("s3cr3t".to_owned()), &[], Duration::from_secs(1), 0);
		let notifier = WebhookNotifier::new(config);
		let event = WebhookEvent::new(WebhookEventKind::JobStarted, &job(JobStatus::Running), server.uri(), Utc::now());

		notifier.notify(&event).await;
	}

	#[tokio::test]
	async fn unsubscribed_event_kind_is_not_delivered() {
		let server = MockServer::start().await;
		Mock::given(method("POST")).and(path("/hook")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;

		let config = WebhookConfig::from_parts(Some(format!("{}/hook", server.uri())), None, &["job.completed".to_owned()], Duration::from_secs(1), 0);
		let notifier = WebhookNotifier::new(config);
		let event = WebhookEvent::new(WebhookEventKind::JobStarted, &job(JobStatus::Running), server.uri(), Utc::now());

		notifier.notify(&event).await;
	}

	#[tokio::test]
	async fn retries_on_failure_then_succeeds() {
		let server = MockServer::start().await;
		Mock::given(method("POST")).and(path("/hook")).respond_with(ResponseTemplate::new(500)).up_to_n_times(1).mount(&server).await;
		Mock::given(method("POST")).and(path("/hook")).respond_with(ResponseTemplate::new(200)).mount(&server).await;

		let config = WebhookConfig::from_parts(Some(format!("{}/hook", server.uri())), None, &[], Duration::from_millis(10), 3);
		let notifier = WebhookNotifier::new(config);
		let event = WebhookEvent::new(WebhookEventKind::JobCompleted, &job(JobStatus::Complete), server.uri(), Utc::now());

		notifier.notify(&event).await;
	}

	#[tokio::test]
	async fn no_url_configured_is_a_no_op() {
		let config = WebhookConfig::from_parts(None, None, &[], Duration::from_secs(1), 0);
		let notifier = WebhookNotifier::new(config);
		let event = WebhookEvent::new(WebhookEventKind::JobFailed, &job(JobStatus::Error), String::new(), Utc::now());
		notifier.notify(&event).await;
	}
}
