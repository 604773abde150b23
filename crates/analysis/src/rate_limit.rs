//! Minimum-interval rate limiting for service requests.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tracing::trace;

/// Spaces request starts at least `interval` apart across all callers.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    /// A limiter that never waits.
    pub fn unlimited() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until the next request may start.
    pub async fn wait(&self) {
        if self.interval.is_zero() {
            return;
        }

        // Held across the sleep so waiters are released one interval apart
        let mut last = self.last.lock().await;
        if let Some(previous) = *last {
            let ready_at = previous + self.interval;
            if ready_at > Instant::now() {
                trace!(delay_ms = (ready_at - Instant::now()).as_millis() as u64, "Rate limited");
                sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
    }
}
