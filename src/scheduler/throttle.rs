//! Courtesy throttle between scheduler submissions.
//!
//! Keeps a minimum interval between consecutive submissions so the
//! scheduler front end is not flooded. Waiting never exceeds the interval
//! for any single caller once it holds the slot.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug)]
pub struct SubmitThrottle {
    min_interval: Duration,
    last_submission: Mutex<Option<Instant>>,
}

impl SubmitThrottle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_submission: Mutex::new(None),
        }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// A throttle that never waits.
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until the next submission may go out, then claim the slot.
    pub async fn acquire(&self) {
        if self.min_interval.is_zero() {
            return;
        }
        let mut last = self.last_submission.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

impl Default for SubmitThrottle {
    fn default() -> Self {
        Self::from_millis(1000)
    }
}
