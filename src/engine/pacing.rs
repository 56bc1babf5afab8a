// * Scrape Pacing
// * Spaces consecutive page fetches so competitor sites are not hammered.

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use std::time::Duration;
use tracing::debug;

/// Single-permit limiter: at most one fetch per interval
pub struct ScrapePacer {
    limiter: Option<DefaultDirectRateLimiter>,
    interval: Duration,
}

impl ScrapePacer {
    /// A zero interval disables pacing entirely
    pub fn new(interval: Duration) -> Self {
        let limiter = Quota::with_period(interval)
            .map(|quota| RateLimiter::direct(quota.allow_burst(nonzero!(1u32))));

        Self { limiter, interval }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Waits until the next fetch is allowed
    pub async fn wait(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
            debug!(interval_ms = self.interval.as_millis() as u64, "Pacer permit granted");
        }
    }
}
