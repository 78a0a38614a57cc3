use prometheus::{Counter, CounterVec, Gauge, Opts, Registry};

/// Prometheus counters/gauges for the scheduler's dispatch and worker
/// pool, registered once at startup. Grounded in the teacher's
/// `task_queue::pool::WorkerPool` metrics registration pattern.
#[derive(Clone)]
pub struct SchedulerMetrics {
	pub jobs_submitted: CounterVec,
	pub jobs_completed: Counter,
	pub jobs_failed: Counter,
	pub active_workers: Gauge,
}

impl SchedulerMetrics {
	pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
		let jobs_submitted = CounterVec::new(Opts::new("jobs_submitted_total", "Total jobs submitted, labeled by dispatch path"), &["path"])?;
		let jobs_completed = Counter::new("jobs_completed_total", "Total jobs that reached the complete state")?;
		let jobs_failed = Counter::new("jobs_failed_total", "Total jobs that reached the error state")?;
		let active_workers = Gauge::new("active_workers", "Number of worker tasks currently running a pipeline")?;

		registry.register(Box::new(jobs_submitted.clone()))?;
		registry.register(Box::new(jobs_completed.clone()))?;
		registry.register(Box::new(jobs_failed.clone()))?;
		registry.register(Box::new(active_workers.clone()))?;

		Ok(Self { jobs_submitted, jobs_completed, jobs_failed, active_workers })
	}
}
