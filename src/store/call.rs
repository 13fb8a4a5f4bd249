use std::future::Future;
use std::time::Duration;

use super::StoreError;
use crate::config::PipelineConfig;

/// Timeout and retry policy applied around every store round trip.
///
/// Reads are idempotent and retried on transient failures with exponential
/// backoff. Writes get exactly one attempt: a retried insert could land twice,
/// so the caller must re-check state before trying again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallPolicy {
    pub timeout: Duration,
    pub read_attempts: u32,
    pub backoff: Duration,
}

impl CallPolicy {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            timeout: Duration::from_millis(config.call_timeout_ms),
            read_attempts: config.read_retry_attempts.max(1),
            backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            read_attempts: 3,
            backoff: Duration::from_millis(100),
        }
    }
}

pub async fn read<T, F, Fut>(policy: &CallPolicy, operation: &'static str, mut call: F) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let attempts = policy.read_attempts.max(1);
    let mut delay = policy.backoff;
    let mut attempt = 1;

    loop {
        match bounded(policy, operation, call()).await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < attempts => {
                tracing::warn!(operation, attempt, error = %e, "transient store error, retrying read");
                tokio::time::sleep(delay).await;
                delay = delay.saturating_mul(2);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

pub async fn write<T, Fut>(policy: &CallPolicy, operation: &'static str, call: Fut) -> Result<T, StoreError>
where
    Fut: Future<Output = Result<T, StoreError>>,
{
    bounded(policy, operation, call).await
}

async fn bounded<T, Fut>(policy: &CallPolicy, operation: &'static str, call: Fut) -> Result<T, StoreError>
where
    Fut: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(policy.timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout {
            operation,
            after_ms: policy.timeout.as_millis() as u64,
        }),
    }
}
