//! Time sources for transient evaluation.
//!
//! Every transient reading is a function of elapsed wall-clock time. Elements
//! never call `Instant::now()` directly; they ask a [`Clock`] so tests and dry
//! runs can drive time by hand.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::Instant;

/// A monotonic source of "now", in seconds since an arbitrary origin.
pub trait Clock: fmt::Debug {
    fn now(&self) -> f64;
}

/// Shared handle to a clock. Single-threaded by contract.
pub type ClockRef = Rc<dyn Clock>;

/// Wall clock backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Convenience constructor for a shared handle.
    pub fn shared() -> ClockRef {
        Rc::new(Self::new())
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Clock advanced explicitly by the caller.
///
/// Clones share the same time cell, so a test can keep one handle and give
/// another to the elements under test.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    /// Move time forward by `seconds`. Negative values are ignored.
    pub fn advance(&self, seconds: f64) {
        if seconds > 0.0 {
            self.now.set(self.now.get() + seconds);
        }
    }

    /// Jump to an absolute time. Going backwards is ignored.
    pub fn set(&self, t: f64) {
        if t > self.now.get() {
            self.now.set(t);
        }
    }

    /// A shared handle onto the same time cell.
    pub fn handle(&self) -> ClockRef {
        Rc::new(self.clone())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.now.get()
    }
}
