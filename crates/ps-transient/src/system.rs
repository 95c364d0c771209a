//! The `System` abstraction shared by every transfer block.
//!
//! A system is a black box: each call to [`System::output`] resolves its
//! inputs, computes a value and records it. Systems can feed each other
//! through [`SystemRef`] handles, which is how cascaded models are built.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use ps_core::ClockRef;

use crate::error::SimResult;
use crate::noise::Noise;

/// Shared handle to a system used as another system's input.
pub type SystemRef = Rc<RefCell<dyn System>>;

/// Evaluation interface of every transfer system.
pub trait System: fmt::Debug {
    /// Bookkeeping common to every system.
    fn state(&self) -> &SystemState;

    fn state_mut(&mut self) -> &mut SystemState;

    /// Evaluate the system now. Not pure: transient systems read the clock
    /// and update their history.
    fn output(&mut self) -> SimResult<f64>;

    fn name(&self) -> &str {
        self.state().name()
    }

    /// Value produced by the most recent [`output`](System::output) call.
    fn last_value(&self) -> Option<f64> {
        self.state().last_value()
    }

    fn timing(&self) -> Timing {
        self.state().timing()
    }

    /// Replace the output noise. `None` disables it.
    fn set_noise(&mut self, noise: Option<Noise>) {
        self.state_mut().set_noise(noise);
    }

    /// Timestamp evaluations with `clock`. Transient elements always have one.
    fn set_clock(&mut self, clock: ClockRef) {
        self.state_mut().set_clock(clock);
    }
}

/// Evaluation timestamps, in clock seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Timing {
    pub t0: Option<f64>,
    pub last_execution: Option<f64>,
}

impl Timing {
    pub fn elapsed(&self) -> Option<f64> {
        Some(self.last_execution? - self.t0?)
    }
}

/// Wrap a concrete system so it can be handed out as a [`SystemRef`] while
/// the owner keeps typed access.
pub fn shared<S: System + 'static>(system: S) -> Rc<RefCell<S>> {
    Rc::new(RefCell::new(system))
}

/// Name, timing, noise and last value of a system.
#[derive(Debug, Clone)]
pub struct SystemState {
    name: String,
    clock: Option<ClockRef>,
    noise: Option<Noise>,
    t0: Option<f64>,
    last_execution: Option<f64>,
    last_value: Option<f64>,
}

impl SystemState {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            clock: None,
            noise: None,
            t0: None,
            last_execution: None,
            last_value: None,
        }
    }

    /// Timestamp evaluations with `clock`.
    pub fn with_clock(mut self, clock: ClockRef) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn set_clock(&mut self, clock: ClockRef) {
        self.clock = Some(clock);
    }

    pub fn with_noise(mut self, noise: Noise) -> Self {
        self.noise = Some(noise);
        self
    }

    pub fn set_noise(&mut self, noise: Option<Noise>) {
        self.noise = noise;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn noise(&self) -> Option<&Noise> {
        self.noise.as_ref()
    }

    pub fn now(&self) -> Option<f64> {
        self.clock.as_ref().map(|c| c.now())
    }

    /// Time of the first evaluation.
    pub fn t0(&self) -> Option<f64> {
        self.t0
    }

    pub fn last_execution(&self) -> Option<f64> {
        self.last_execution
    }

    pub fn last_value(&self) -> Option<f64> {
        self.last_value
    }

    pub fn timing(&self) -> Timing {
        Timing {
            t0: self.t0,
            last_execution: self.last_execution,
        }
    }

    /// Time between the first and the latest evaluation.
    pub fn elapsed(&self) -> Option<f64> {
        self.timing().elapsed()
    }

    /// Add the configured noise, if any.
    pub fn perturb(&mut self, value: f64) -> f64 {
        match self.noise.as_mut() {
            Some(noise) => noise.apply(value),
            None => value,
        }
    }

    /// Store an evaluated value taken at `now`.
    pub fn commit(&mut self, now: Option<f64>, value: f64) -> f64 {
        if let Some(now) = now {
            self.t0.get_or_insert(now);
            self.last_execution = Some(now);
        }
        self.last_value = Some(value);
        value
    }

    /// Perturb and commit in one go, for systems without clamping.
    pub fn record(&mut self, value: f64) -> f64 {
        let now = self.now();
        let value = self.perturb(value);
        self.commit(now, value)
    }
}
