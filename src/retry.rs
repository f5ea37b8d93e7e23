//! Exponential backoff retry for API providers.
//!
//! [`Retrying`] wraps any [`Provider`] and repeats calls that failed with a
//! transient error (timeouts, connection errors, 429, 5xx). Permanent errors
//! such as a missing credential or a parse failure are returned immediately so
//! the fallback chain can move on.
//!
//! # Backoff Strategy
//!
//! ```text
//! delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
//! ```
//!
//! An optional total budget bounds all attempts and delays together. Built from
//! a [`Config`], the budget is the request timeout, so a retried source takes
//! no longer than a single request could.

use crate::config::Config;
use crate::error::SourceError;
use crate::sources::{Provider, Query, Retrieval};
use async_trait::async_trait;
use rand::{Rng, rng};
use std::fmt;
use std::marker::PhantomData;
use std::time::{Duration, Instant};
use tokio::time::{sleep, timeout};
use tracing::{error, instrument, warn};

pub struct Retrying<P, T> {
    inner: P,
    max_retries: usize,
    base_delay: Duration,
    max_delay: Duration,
    budget: Option<Duration>,
    _records: PhantomData<fn() -> T>,
}

impl<P, T> Retrying<P, T>
where
    P: Provider<T>,
{
    pub fn new(inner: P, max_retries: usize, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(30),
            budget: None,
            _records: PhantomData,
        }
    }

    pub fn from_config(inner: P, config: &Config) -> Self {
        let retry = &config.retry;
        Self::new(inner, retry.max_retries, Duration::from_millis(retry.base_delay_ms))
            .max_delay(Duration::from_millis(retry.max_delay_ms))
            .budget(config.request_timeout())
    }

    /// Give up once attempts and delays together reach `budget`.
    pub fn budget(mut self, budget: Duration) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    fn backoff(&self, attempt: usize) -> Duration {
        let shift = (attempt.saturating_sub(1)).min(16) as u32;
        let delay = self.base_delay.saturating_mul(1 << shift).min(self.max_delay);
        let jitter_ms: u64 = rng().random_range(0..=250);
        delay + Duration::from_millis(jitter_ms)
    }
}

impl<P, T> fmt::Debug for Retrying<P, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retrying")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .field("budget", &self.budget)
            .finish()
    }
}

#[async_trait]
impl<P, T> Provider<T> for Retrying<P, T>
where
    P: Provider<T>,
    T: Send + 'static,
{
    fn name(&self) -> &str {
        self.inner.name()
    }

    #[instrument(level = "info", skip_all)]
    async fn search(&self, query: &Query, limit: usize) -> Result<Retrieval<T>, SourceError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_result = match self.budget {
                Some(budget) => {
                    let remaining = budget.saturating_sub(total_t0.elapsed());
                    match timeout(remaining, self.inner.search(query, limit)).await {
                        Ok(result) => result,
                        Err(_) => {
                            error!(provider = self.inner.name(), attempt, ?budget, "search ran out of time");
                            return Err(SourceError::Deadline(budget));
                        }
                    }
                }
                None => self.inner.search(query, limit).await,
            };
            match attempt_result {
                Ok(retrieval) => return Ok(retrieval),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => {
                    attempt += 1;
                    if attempt > self.max_retries {
                        error!(
                            provider = self.inner.name(),
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
                            error = %e,
                            "search exhausted retries"
                        );
                        return Err(e);
                    }
                    let delay = self.backoff(attempt);
                    if self.budget.is_some_and(|budget| total_t0.elapsed() + delay >= budget) {
                        error!(
                            provider = self.inner.name(),
                            attempt,
                            budget = ?self.budget,
                            error = %e,
                            "no time left to retry"
                        );
                        return Err(e);
                    }
                    warn!(
                        provider = self.inner.name(),
                        attempt,
                        max = self.max_retries,
                        ?delay,
                        error = %e,
                        "search attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}
