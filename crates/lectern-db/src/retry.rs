//! Retry policy for transient database failures.
//!
//! A transient error (pool timeout, dropped connection) is retried exactly
//! once, immediately, with no backoff; the second failure is surfaced.
//! Generation and object-store calls are never routed through this helper.

use std::future::Future;

use tracing::warn;

use lectern_core::Result;

/// Run `op`, retrying once immediately if it fails with a transient
/// infrastructure error.
pub async fn retry_transient<T, F, Fut>(mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match op().await {
        Err(e) if e.is_transient() => {
            warn!(
                subsystem = "db",
                component = "retry",
                error = %e,
                "Transient database error, retrying once"
            );
            op().await
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_core::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn transient() -> Error {
        Error::Database(sqlx::Error::PoolTimedOut)
    }

    #[tokio::test]
    async fn test_success_is_not_retried() {
        let calls = AtomicUsize::new(0);
        let result = retry_transient(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, Error>(7) }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transient_error_retried_exactly_once() {
        let calls = AtomicUsize::new(0);
        let result = retry_transient(|| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(transient())
                } else {
                    Ok(42)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_second_transient_failure_surfaces() {
        let calls = AtomicUsize::new(0);
        let result: Result<i32> = retry_transient(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(transient()) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_non_transient_error_not_retried() {
        let calls = AtomicUsize::new(0);
        let result: Result<i32> = retry_transient(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::NotFound("job".into())) }
        })
        .await;
        assert!(matches!(result, Err(Error::NotFound(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
