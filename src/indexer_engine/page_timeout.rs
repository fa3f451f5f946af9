//! Timeout wrappers for browser operations
//!
//! Every call into the browser is bounded so a stuck page cannot hold the
//! worker forever.

use anyhow::Result;
use std::future::Future;
use std::time::Duration;

use super::errors::IndexerError;

/// Wrap a browser operation with an explicit timeout
///
/// # Arguments
/// * `operation` - The async Future to execute with a timeout
/// * `timeout` - Upper bound for the operation
/// * `operation_name` - Human-readable name for error messages
pub async fn with_page_timeout<F, T>(operation: F, timeout: Duration, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, operation).await {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!(
            "{operation_name} timeout after {} ms",
            timeout.as_millis()
        )),
    }
}

/// Bound a whole job, mapping expiry to `IndexerError::Timeout`
pub async fn with_job_timeout<F, T>(operation: F, timeout: Duration) -> Result<T, IndexerError>
where
    F: Future<Output = Result<T, IndexerError>>,
{
    match tokio::time::timeout(timeout, operation).await {
        Ok(result) => result,
        Err(_) => Err(IndexerError::Timeout {
            operation: "Job".to_string(),
            secs: timeout.as_secs(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn page_timeout_names_the_operation() {
        let result: Result<()> = with_page_timeout(
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            },
            Duration::from_millis(100),
            "Navigation",
        )
        .await;

        let message = result.unwrap_err().to_string();
        assert!(message.contains("Navigation timeout"), "{message}");
    }

    #[tokio::test(start_paused = true)]
    async fn job_timeout_maps_to_indexer_error() {
        let result: Result<(), IndexerError> = with_job_timeout(
            async {
                tokio::time::sleep(Duration::from_secs(120)).await;
                Ok(())
            },
            Duration::from_secs(90),
        )
        .await;

        assert!(matches!(result, Err(IndexerError::Timeout { secs: 90, .. })));
    }
}
