//! Time source for the scheduler.
//!
//! Both the throttle comparisons and the stored trial timestamps read the
//! same clock, so a delay gate can never disagree with the value it was
//! compared against.

use std::sync::Mutex;
use std::time::Instant;

/// Monotonic seconds since some fixed origin.
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;
}

/// Default clock: seconds elapsed since construction.
#[derive(Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Hand-cranked clock for tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Mutex<f64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, secs: f64) {
        *self.now.lock().expect("clock poisoned") += secs;
    }

    pub fn set(&self, secs: f64) {
        *self.now.lock().expect("clock poisoned") = secs;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        *self.now.lock().expect("clock poisoned")
    }
}
