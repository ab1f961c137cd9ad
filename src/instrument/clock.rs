//! Time sources for the motion integrator.
//!
//! The microscope never reads the system clock directly; it asks a [`Clock`]
//! so tests can step time by hand.

use std::cell::Cell;
use std::fmt::Debug;
use std::rc::Rc;
use std::time::Instant;

use chrono::{DateTime, Local};

/// Monotonic time source with a wall-clock label for records
pub trait Clock: Debug {
    /// Seconds since an arbitrary fixed epoch; never decreases
    fn now_secs(&self) -> f64;

    /// Wall-clock time used to label measurements
    fn wall_clock(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// System clock implementation using std::time::Instant
#[derive(Debug)]
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_secs(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }
}

/// Manually advanced clock
///
/// Clones share the same time, so a test can keep one handle and give the
/// other to the microscope.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now_secs: Rc<Cell<f64>>,
    epoch: DateTime<Local>,
}

impl ManualClock {
    /// Start at t = 0
    pub fn new() -> Self {
        Self::starting_at(0.0)
    }

    /// Start at the given time in seconds
    pub fn starting_at(secs: f64) -> Self {
        Self {
            now_secs: Rc::new(Cell::new(secs)),
            epoch: Local::now(),
        }
    }

    /// Advance time by `secs` (negative values are ignored)
    pub fn advance(&self, secs: f64) {
        if secs > 0.0 {
            self.now_secs.set(self.now_secs.get() + secs);
        }
    }

    /// Jump to an absolute time; earlier times are ignored
    pub fn set(&self, secs: f64) {
        if secs > self.now_secs.get() {
            self.now_secs.set(secs);
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now_secs(&self) -> f64 {
        self.now_secs.get()
    }

    fn wall_clock(&self) -> DateTime<Local> {
        let micros = (self.now_secs.get() * 1e6).round() as i64;
        self.epoch + chrono::Duration::microseconds(micros)
    }
}
