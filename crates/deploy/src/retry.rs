//! Retry discipline for the runtime service boundary.
//!
//! Idempotent reads (list, describe, fetch) retry with bounded backoff.
//! Mutations retry at most once, and only when the failure classifies as
//! transient (throttling) -- never on validation-type failures.

use std::future::Future;
use std::time::Duration;

use crate::api::ApiError;

/// Backoff parameters for idempotent reads.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub read_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            read_attempts: 3,
            base_delay: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    /// Run an idempotent read, retrying transient failures with linear
    /// backoff up to `read_attempts`.
    pub async fn read<T, F, Fut>(&self, mut op: F) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) if e.is_transient() && attempt < self.read_attempts => {
                    tokio::time::sleep(self.base_delay * attempt).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Run a mutation, retrying exactly once and only on throttling.
    pub async fn mutate<T, F, Fut>(&self, mut op: F) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        match op().await {
            Err(e) if e.is_transient() => {
                tokio::time::sleep(self.base_delay).await;
                op().await
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy() -> RetryPolicy {
        RetryPolicy {
            read_attempts: 3,
            base_delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn reads_retry_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = policy()
            .read(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(ApiError::Throttled("busy".into()))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn reads_do_not_retry_permanent_failures() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = policy()
            .read(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ApiError::NotFound("x".into())) }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn mutations_retry_exactly_once_on_throttle() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = policy()
            .mutate(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ApiError::Throttled("busy".into())) }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn mutations_never_retry_validation_failures() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = policy()
            .mutate(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ApiError::AccessDenied("no".into())) }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
