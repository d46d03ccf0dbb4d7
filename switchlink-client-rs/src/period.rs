//! Elapsed-time gate used for polling intervals and request lifetimes.

use embassy_time::{Duration, Instant};

/// Monotonic elapsed-time gate.
///
/// [`exceeded()`](Self::exceeded) returns `true` once at least `interval`
/// has passed since the last reset, and re-arms itself in the same call.
/// The tracker uses it to throttle cleanup sweeps, requests use it as
/// their lifetime, and protocols use it for beacon/keep-alive timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodCounter {
    interval: Duration,
    last_reset: Instant,
}

impl PeriodCounter {
    /// Create a counter armed at `now`.
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            last_reset: now,
        }
    }

    /// Create a counter that fires on the first check.
    pub fn elapsed_at(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            last_reset: now.checked_sub(interval).unwrap_or(Instant::MIN),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Re-arm the counter at `now`.
    pub fn reset(&mut self, now: Instant) {
        self.last_reset = now;
    }

    /// Time since the last reset. Saturates to zero if `now` lies before it.
    pub fn passed(&self, now: Instant) -> Duration {
        now.checked_duration_since(self.last_reset)
            .unwrap_or(Duration::from_ticks(0))
    }

    /// Returns `true` (and re-arms) if the interval has elapsed at `now`.
    pub fn exceeded(&mut self, now: Instant) -> bool {
        if self.passed(now) < self.interval {
            return false;
        }
        self.reset(now);
        true
    }
}
