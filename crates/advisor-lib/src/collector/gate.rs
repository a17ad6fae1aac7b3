//! Bounded, retrying access to the cloud management API
//!
//! Every external call goes through a [`CallGate`]: a semaphore caps the
//! number of concurrent calls and transient failures (throttling, timeouts)
//! are retried with capped exponential backoff plus random jitter. The permit
//! is released while sleeping so other callers can proceed.

use crate::error::CloudApiError;
use crate::observability::AdvisorMetrics;
use rand::Rng;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// Default number of concurrent external calls
pub const DEFAULT_MAX_CONCURRENCY: usize = 3;

/// Backoff configuration for transient failures
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Upper bound for any single delay, including server hints
    pub max_delay: Duration,
    /// Maximum jitter as a fraction of the delay
    pub jitter_ratio: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 4,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            jitter_ratio: 0.3,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-based), without jitter.
    ///
    /// A server retry-after hint acts as the floor; the result never exceeds `max_delay`.
    pub fn backoff(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let exponential = self
            .base_delay
            .checked_mul(2u32.saturating_pow(attempt))
            .unwrap_or(self.max_delay)
            .min(self.max_delay);

        match retry_after {
            Some(hint) => exponential.max(hint.min(self.max_delay)),
            None => exponential,
        }
    }

    /// Add uniform jitter in `[0, jitter_ratio * delay]`
    pub fn with_jitter(&self, delay: Duration) -> Duration {
        let max_jitter = delay.as_secs_f64() * self.jitter_ratio.clamp(0.0, 1.0);
        if max_jitter <= 0.0 {
            return delay;
        }
        let jitter = rand::thread_rng().gen_range(0.0..=max_jitter);
        delay + Duration::from_secs_f64(jitter)
    }
}

/// Semaphore plus retry policy shared by every caller of the cloud API
#[derive(Debug, Clone)]
pub struct CallGate {
    permits: Arc<Semaphore>,
    max_concurrency: usize,
    policy: RetryPolicy,
    metrics: AdvisorMetrics,
}

impl CallGate {
    pub fn new(max_concurrency: usize, policy: RetryPolicy) -> Self {
        let max_concurrency = max_concurrency.max(1);
        Self {
            permits: Arc::new(Semaphore::new(max_concurrency)),
            max_concurrency,
            policy,
            metrics: AdvisorMetrics::new(),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Permits not currently held by a call
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Run `call` under the concurrency cap, retrying transient failures.
    pub async fn call<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T, CloudApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CloudApiError>>,
    {
        let mut attempt = 0u32;
        loop {
            let outcome = {
                let _permit = self
                    .permits
                    .acquire()
                    .await
                    .map_err(|_| CloudApiError::Transport("call gate closed".to_string()))?;
                self.metrics.inc_external_call(operation);
                call().await
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.policy.max_retries => {
                    let delay = self
                        .policy
                        .with_jitter(self.policy.backoff(attempt, err.retry_after()));
                    self.metrics.inc_throttle_retry();
                    debug!(
                        operation = %operation,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient cloud API failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    self.metrics.inc_external_failure(operation);
                    if err.is_transient() {
                        warn!(
                            operation = %operation,
                            attempts = attempt + 1,
                            error = %err,
                            "Cloud API call failed after retries"
                        );
                    }
                    return Err(err);
                }
            }
        }
    }
}

impl Default for CallGate {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENCY, RetryPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 4,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            jitter_ratio: 0.3,
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(0, None), Duration::from_secs(1));
        assert_eq!(policy.backoff(1, None), Duration::from_secs(2));
        assert_eq!(policy.backoff(3, None), Duration::from_secs(8));
        assert_eq!(policy.backoff(10, None), Duration::from_secs(30));
        assert_eq!(policy.backoff(40, None), Duration::from_secs(30));
    }

    #[test]
    fn test_retry_after_is_floor_and_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.backoff(0, Some(Duration::from_secs(12))),
            Duration::from_secs(12)
        );
        assert_eq!(
            policy.backoff(4, Some(Duration::from_secs(2))),
            Duration::from_secs(16)
        );
        assert_eq!(
            policy.backoff(0, Some(Duration::from_secs(300))),
            Duration::from_secs(30)
        );
    }

    #[test]
    fn test_jitter_is_bounded() {
        let policy = RetryPolicy::default();
        let base = Duration::from_secs(10);
        for _ in 0..100 {
            let delay = policy.with_jitter(base);
            assert!(delay >= base);
            assert!(delay <= Duration::from_secs(13));
        }
    }

    #[tokio::test]
    async fn test_throttled_call_retries_then_succeeds() {
        let gate = CallGate::new(3, fast_policy());
        let attempts = AtomicUsize::new(0);

        let result = gate
            .call("get_skus", || {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(CloudApiError::Throttled { retry_after: None })
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let gate = CallGate::new(3, fast_policy());
        let attempts = AtomicUsize::new(0);

        let result: Result<(), _> = gate
            .call("get_spot_placement_scores", || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(CloudApiError::Throttled { retry_after: None }) }
            })
            .await;

        assert!(matches!(result, Err(CloudApiError::Throttled { .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_permanent_errors_are_not_retried() {
        let gate = CallGate::new(3, fast_policy());
        let attempts = AtomicUsize::new(0);

        let result: Result<(), _> = gate
            .call("get_compute_usages", || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(CloudApiError::Forbidden("403".into())) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let gate = Arc::new(CallGate::new(3, fast_policy()));
        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..12 {
            let gate = gate.clone();
            let current = current.clone();
            let peak = peak.clone();
            handles.push(tokio::spawn(async move {
                gate.call("list_regions", || {
                    let current = current.clone();
                    let peak = peak.clone();
                    async move {
                        let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        current.fetch_sub(1, Ordering::SeqCst);
                        Ok::<_, CloudApiError>(())
                    }
                })
                .await
            }));
        }

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(gate.available_permits(), 3);
    }
}
