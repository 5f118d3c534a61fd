use std::thread;
use std::time::{Duration, Instant};

/// Minimum-spacing limiter owned by one adapter or downloader instance.
/// The only mutable state in the crate: the monotonic timestamp of the
/// instance's last outbound request.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_request_at: Option<Instant>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request_at: None,
        }
    }

    /// How long a request issued at `now` would have to wait. Pure, so
    /// tests can drive it with synthetic instants.
    pub fn pause_needed(&self, now: Instant) -> Option<Duration> {
        let last = self.last_request_at?;
        let elapsed = now.checked_duration_since(last).unwrap_or_default();
        if elapsed >= self.min_interval {
            None
        } else {
            Some(self.min_interval - elapsed)
        }
    }

    pub fn mark(&mut self, now: Instant) {
        self.last_request_at = Some(now);
    }

    /// Check-then-sleep, then record the request time.
    pub fn wait(&mut self) {
        if let Some(pause) = self.pause_needed(Instant::now()) {
            thread::sleep(pause);
        }
        self.mark(Instant::now());
    }
}
