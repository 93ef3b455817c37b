//! Timeout helper.

use std::future::Future;
use std::time::Duration;

use crate::error::SiftError;

/// Wrap a future with a timeout.
pub async fn with_timeout<T>(
    duration: Duration,
    future: impl Future<Output = Result<T, SiftError>>,
) -> Result<T, SiftError> {
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(SiftError::Timeout(duration.as_millis() as u64)),
    }
}

/// Apply `duration` when present, otherwise await `future` unbounded.
pub async fn with_optional_timeout<T>(
    duration: Option<Duration>,
    future: impl Future<Output = Result<T, SiftError>>,
) -> Result<T, SiftError> {
    match duration {
        Some(duration) => with_timeout(duration, future).await,
        None => future.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn slow_future_times_out() {
        let result: Result<(), SiftError> = with_timeout(Duration::from_millis(50), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(SiftError::Timeout(50))));
    }

    #[tokio::test]
    async fn no_duration_means_no_bound() {
        let result = with_optional_timeout(None, async { Ok::<_, SiftError>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }
}
