pub mod job;
pub mod pool;

pub use job::{Job, JobKind, JobOutput, JobResult, JobStatus, JobWork};
pub use pool::{Pipelines, WorkerPool};

// Re-exported for callers that select over the result channel.
pub use crossbeam_channel;
