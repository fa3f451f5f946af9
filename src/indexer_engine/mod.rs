//! Job execution: queueing, revisit limiting and the worker loop

pub mod errors;
pub mod job_queue;
pub mod job_result;
pub mod page_timeout;
pub mod rate_limiter;
pub mod worker;

pub use errors::{FailureKind, IndexerError};
pub use job_queue::JobQueue;
pub use job_result::JobResult;
pub use rate_limiter::{Clock, RateLimitDecision, RateLimiter, system_clock};
pub use worker::{CompletionSender, JobWorker};
