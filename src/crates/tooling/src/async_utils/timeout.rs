//! Timeout wrapper for fallible async operations

use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout as tokio_timeout;

/// Error type for timeout operations
#[derive(Debug, Error)]
pub enum TimeoutError<E> {
    /// Operation completed but failed
    #[error("Operation failed: {0}")]
    OperationFailed(E),

    /// Operation did not complete in time
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
}

impl<E> TimeoutError<E> {
    /// Whether the deadline, rather than the operation, caused the failure
    pub fn is_timeout(&self) -> bool {
        matches!(self, TimeoutError::Timeout(_))
    }
}

/// Execute an async operation with a timeout
///
/// The future is dropped when the deadline passes, so resources tied to it
/// (for example a child process spawned with `kill_on_drop`) are released.
pub async fn with_timeout<F, T, E>(duration: Duration, operation: F) -> Result<T, TimeoutError<E>>
where
    F: Future<Output = Result<T, E>>,
{
    match tokio_timeout(duration, operation).await {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(error)) => Err(TimeoutError::OperationFailed(error)),
        Err(_elapsed) => Err(TimeoutError::Timeout(duration)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_completes_in_time() {
        let result: Result<u32, TimeoutError<String>> =
            with_timeout(Duration::from_secs(1), async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_operation_error_passes_through() {
        let result: Result<u32, TimeoutError<String>> =
            with_timeout(Duration::from_secs(1), async { Err("boom".to_string()) }).await;
        match result {
            Err(TimeoutError::OperationFailed(e)) => assert_eq!(e, "boom"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_exceeded() {
        let result: Result<(), TimeoutError<String>> = with_timeout(Duration::from_secs(2), async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(())
        })
        .await;
        let err = result.unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "Operation timed out after 2s");
    }
}
