use std::future::Future;
use std::time::Duration;

use sa_core::ports::GatewayError;

/// Bounds a gateway call. A zero limit means unbounded.
pub(crate) async fn with_timeout<F, T>(limit: Duration, call: F) -> Result<T, GatewayError>
where
    F: Future<Output = Result<T, GatewayError>>,
{
    if limit.is_zero() {
        return call.await;
    }
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_elapsed) => Err(GatewayError::Timeout {
            after_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}
