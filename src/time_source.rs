//! Clock abstraction for real and simulated time.
//!
//! The controller never reads the system clock or sleeps directly. It goes
//! through a [`Clock`] so tests can drive a full day of motion events in
//! milliseconds with [`SimulatedClock`], which jumps forward by exactly the
//! requested duration on every sleep.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::{Mutex, PoisonError};
use std::time::Duration as StdDuration;

/// Source of the current instant and of blocking waits.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Block for `duration` (or pretend to).
    fn sleep(&self, duration: StdDuration);

    fn is_simulated(&self) -> bool {
        false
    }
}

/// Wall-clock time and real sleeps.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: StdDuration) {
        std::thread::sleep(duration);
    }
}

/// Fast-forward clock: `sleep` advances the simulated instant and returns
/// immediately.
#[derive(Debug)]
pub struct SimulatedClock {
    start: DateTime<Utc>,
    current: Mutex<DateTime<Utc>>,
}

impl SimulatedClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            start,
            current: Mutex::new(start),
        }
    }

    /// Simulated time elapsed since construction.
    pub fn elapsed(&self) -> StdDuration {
        (self.now() - self.start).to_std().unwrap_or(StdDuration::ZERO)
    }

    /// Jump forward without going through `sleep`.
    pub fn advance(&self, duration: StdDuration) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        let delta = ChronoDuration::from_std(duration).unwrap_or_else(|_| ChronoDuration::zero());
        if let Some(next) = current.checked_add_signed(delta) {
            *current = next;
        }
    }
}

impl Clock for SimulatedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sleep(&self, duration: StdDuration) {
        self.advance(duration);
    }

    fn is_simulated(&self) -> bool {
        true
    }
}
