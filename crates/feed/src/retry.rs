//! Bounded retries with randomized exponential backoff.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use log::info;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10_000),
            max_jitter: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// `min(base * 2^attempt + jitter, max)`, where `attempt` counts failures so far.
    pub fn backoff_delay(&self, attempt: u32, jitter: Duration) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        let exponential = self.base_delay.saturating_mul(factor);
        exponential.saturating_add(jitter).min(self.max_delay)
    }

    fn jitter(&self) -> Duration {
        let max_ms = self.max_jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
    }

    /// Runs `operation` until it succeeds or has failed `max_attempts` times,
    /// then returns the last error unchanged. Only the attempt count is
    /// bounded, not wall-clock time.
    pub async fn run<T, E, F, Fut>(&self, max_attempts: u32, mut operation: F) -> Result<T, E>
    where
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let max_attempts = max_attempts.max(1);
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    attempt += 1;
                    if attempt >= max_attempts {
                        return Err(e);
                    }

                    let delay = self.backoff_delay(attempt, self.jitter());
                    info!("Retry {} after {}ms ({})", attempt, delay.as_millis(), e);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
