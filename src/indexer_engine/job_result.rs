//! Outcome of processing one job.

use std::time::Duration;

use super::errors::IndexerError;
use crate::indexer::{IndexResponse, Job};

/// Result of one job attempt
#[derive(Debug, Clone)]
pub enum JobResult {
    /// Values extracted and post-processed
    Success { job: Job, response: IndexResponse },
    /// URL visited too recently; resubmit after `retry_in`
    RetryDeferred { job: Job, retry_in: Duration },
    /// Attempt failed; reported upstream, not retried
    Failure { job: Job, error: IndexerError },
}

impl JobResult {
    #[must_use]
    pub fn job(&self) -> &Job {
        match self {
            Self::Success { job, .. } | Self::RetryDeferred { job, .. } | Self::Failure { job, .. } => {
                job
            }
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.job().url
    }

    /// Success and Failure end the job; deferral does not
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::RetryDeferred { .. })
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}
