//! Per-call deadlines for backend I/O.

use std::future::Future;
use std::time::Duration;

use crate::domain::Family;
use crate::error::BackendError;

/// Run `call` under `timeout`, mapping expiry to [`BackendError::Timeout`].
///
/// # Errors
///
/// Returns the call's own error or a timeout.
pub async fn with_deadline<T, F>(family: Family, timeout: Duration, call: F) -> Result<T, BackendError>
where
    F: Future<Output = Result<T, BackendError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(BackendError::Timeout {
            family,
            timeout_ms: timeout.as_millis() as u64,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn slow_call_times_out() {
        let result: Result<(), _> = with_deadline(Family::Redis, Duration::from_millis(50), async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(())
        })
        .await;
        assert!(matches!(
            result,
            Err(BackendError::Timeout {
                family: Family::Redis,
                timeout_ms: 50
            })
        ));
    }

    #[tokio::test]
    async fn fast_call_passes_through() {
        let result = with_deadline(Family::Kafka, Duration::from_secs(1), async { Ok(7) }).await;
        assert_eq!(tokio_test::assert_ok!(result), 7);
    }
}
