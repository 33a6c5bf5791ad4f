//! Request pacing for provider fetches.
//!
//! A scan fans many concurrent fetches out against one provider, and
//! market data APIs meter clients in requests per minute. This limiter
//! spaces calls evenly at that rate: each acquire claims the next free
//! slot on a shared schedule and sleeps until the slot arrives. It is
//! constructor-injected into the screener (no process-wide counter) so
//! its lifecycle is scoped to one pipeline instance.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

/// Evenly spaced request scheduler.
///
/// `requests_per_minute` becomes a fixed gap between consecutive calls.
/// There is no burst allowance, so a concurrent scan stays under the
/// provider's meter even in its first second.
#[derive(Debug)]
pub struct RateLimiter {
    /// Gap between consecutive request slots
    interval: Duration,
    /// Next free slot on the schedule
    next_slot: Mutex<Instant>,
    /// Name for logging
    name: String,
}

impl RateLimiter {
    /// Create a limiter pacing `requests_per_minute` requests.
    pub fn new(name: impl Into<String>, requests_per_minute: u32) -> Self {
        let interval = Duration::from_millis(60_000 / u64::from(requests_per_minute.max(1)));
        Self {
            interval,
            next_slot: Mutex::new(Instant::now()),
            name: name.into(),
        }
    }

    /// Claim the next request slot, sleeping until it arrives.
    pub async fn acquire(&self) {
        let slot = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = (*next).max(now);
            *next = slot + self.interval;
            slot
        };

        let now = Instant::now();
        if slot > now {
            debug!(
                limiter = %self.name,
                wait_ms = (slot - now).as_millis() as u64,
                "pacing provider request"
            );
            sleep_until(slot).await;
        }
    }

    /// Claim a slot only if one is free right now.
    pub fn try_acquire(&self) -> bool {
        match self.next_slot.try_lock() {
            Ok(mut next) => {
                let now = Instant::now();
                if *next > now {
                    return false;
                }
                *next = now + self.interval;
                true
            }
            Err(_) => false,
        }
    }

    /// Gap enforced between consecutive requests.
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

/// Shared rate limiter that can be cloned across symbol tasks.
pub type SharedRateLimiter = Arc<RateLimiter>;

/// Create a shared rate limiter.
pub fn shared_limiter(name: impl Into<String>, requests_per_minute: u32) -> SharedRateLimiter {
    Arc::new(RateLimiter::new(name, requests_per_minute))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_from_requests_per_minute() {
        let limiter = RateLimiter::new("test", 120);
        assert_eq!(limiter.interval(), Duration::from_millis(500));

        // Zero is treated as one request per minute
        let limiter = RateLimiter::new("test", 0);
        assert_eq!(limiter.interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_try_acquire_back_to_back_is_denied() {
        let limiter = RateLimiter::new("test", 60);
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[tokio::test]
    async fn test_acquire_paces_consecutive_calls() {
        tokio::time::pause();
        let limiter = RateLimiter::new("test", 120);

        let start = Instant::now();
        limiter.acquire().await;
        // First slot is free immediately
        assert_eq!(start.elapsed(), Duration::ZERO);

        limiter.acquire().await;
        limiter.acquire().await;
        assert!(start.elapsed() >= 2 * limiter.interval());
    }
}
