/// Lifecycle events emitted over `PipelineRunner`'s broadcast channel as a
/// job moves through its stages. Additive instrumentation only — does not
/// change the five-step algorithm or its failure semantics (spec.md §4.D).
#[derive(Debug, Clone)]
pub enum PipelineEvent {
	Started { job_id: String },
	StageCompleted { job_id: String, stage: &'static str },
	Completed { job_id: String },
	Failed { job_id: String, stage: &'static str, error: String },
}
