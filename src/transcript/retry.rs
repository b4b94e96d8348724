//! Exponential backoff retry controller shared by every provider.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;
use tracing::debug;

use super::errors::ProviderError;

/// Outcome of a retried operation
#[derive(Debug)]
pub struct Retried<T> {
    pub result: Result<T, ProviderError>,
    /// Calls made, including the first
    pub attempts: u32,
}

impl<T> Retried<T> {
    /// Retries beyond the first call
    pub fn retry_count(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }
}

/// Exponential backoff retry policy.
///
/// Only [`ProviderError::Transient`] is retried. The delay before attempt
/// `n` (n >= 2) is `base * 2^(n-2)`, stretched by up to `jitter` of itself,
/// then capped at `max_delay`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    jitter: f64,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: Duration::from_secs(30),
            jitter: 0.25,
        }
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Fraction of the exponential delay added at random, clamped to [0, 1]
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = if jitter.is_finite() { jitter.clamp(0.0, 1.0) } else { 0.0 };
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    fn exponential_delay(&self, attempt: u32) -> f64 {
        let exponent = attempt.saturating_sub(2).min(31) as i32;
        self.base_delay.as_secs_f64() * 2_f64.powi(exponent)
    }

    /// Delay before `attempt`, given a random sample `r` in [0, 1)
    fn delay_with_sample(&self, attempt: u32, r: f64) -> Duration {
        if attempt < 2 {
            return Duration::ZERO;
        }
        let delay = self.exponential_delay(attempt) * (1.0 + self.jitter * r);
        Duration::from_secs_f64(delay.min(self.max_delay.as_secs_f64()))
    }

    /// Delay before `attempt` (1-based); zero for the first attempt
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let r: f64 = rand::thread_rng().gen_range(0.0..1.0);
        self.delay_with_sample(attempt, r)
    }

    /// Run `op` until it succeeds, fails permanently, or the budget runs out
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Retried<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut attempt = 1;

        loop {
            match op().await {
                Ok(value) => {
                    return Retried {
                        result: Ok(value),
                        attempts: attempt,
                    }
                }
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    attempt += 1;
                    let delay = self.delay_for(attempt);
                    debug!(attempt, ?delay, error = %e, "Transient failure, backing off");
                    sleep(delay).await;
                }
                Err(e) => {
                    return Retried {
                        result: Err(e),
                        attempts: attempt,
                    }
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(500))
    }
}
