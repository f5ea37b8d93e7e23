//! Per-host request pacing.
//!
//! Every outbound request waits on a [`Pacer`] keyed by target host, which
//! guarantees a minimum interval between two requests to the same host no matter
//! which source issues them or whether sources run concurrently. Requests to
//! different hosts do not wait on each other.

use crate::error::ConfigError;
use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

type HostLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Shared per-host limiter: one request per `interval` per host, no bursts.
#[derive(Clone)]
pub struct Pacer {
    limiter: Arc<HostLimiter>,
    interval: Duration,
}

impl Pacer {
    pub fn new(interval: Duration) -> Result<Self, ConfigError> {
        let quota = Quota::with_period(interval).ok_or_else(|| {
            ConfigError::invalid("politeness_interval_ms", "must be greater than 0")
        })?;
        Ok(Self {
            limiter: Arc::new(RateLimiter::keyed(quota)),
            interval,
        })
    }

    /// Wait until a request to `host` is allowed.
    pub async fn wait(&self, host: &str) {
        let key = host.to_ascii_lowercase();
        if self.limiter.check_key(&key).is_err() {
            debug!(host = %key, interval_ms = self.interval.as_millis() as u64, "Pacing request");
            self.limiter.until_key_ready(&key).await;
        }
    }
}

impl std::fmt::Debug for Pacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pacer").field("interval", &self.interval).finish()
    }
}
