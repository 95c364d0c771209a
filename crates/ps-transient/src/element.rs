//! Transient element: first-order response to steps in a command or input.
//!
//! On every [`output`](System::output) read the element compares the live
//! input with the last one it saw. A change beyond the configured tolerance
//! starts a new [`PendingChange`]; otherwise the ledger keeps releasing the
//! changes already in flight. When everything has settled the ledger is
//! compacted back to one entry, re-anchored on the current input.
//!
//! Two modes, picked by the input descriptor:
//!
//! - **value + command**: `output = value ± Σ changes`, each step worth
//!   `Δcommand / 100 × delta_max`.
//! - **value only**: `output = ± Σ changes`, each step worth `Δvalue`, so the
//!   output lags the input.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use ps_core::{ClockRef, Tolerances, nearly_equal};

use crate::error::{SimError, SimResult};
use crate::input::{InputDescriptor, InputSource, Resolved};
use crate::ledger::{ChangeLedger, PendingChange};
use crate::noise::Noise;
use crate::system::{System, SystemState};

/// Transient element parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransientConfig {
    /// Output delta at 100 % command.
    pub delta_max: f64,
    pub min_output: Option<f64>,
    pub max_output: Option<f64>,
    /// Time constant in seconds.
    pub tau: f64,
    /// A positive step lowers the output instead of raising it.
    pub decrease: bool,
    /// Half-width of the uniform output noise. `None` disables it.
    pub random_error: Option<f64>,
    /// Band inside which a command or input is considered unchanged.
    pub change_tolerance: Tolerances,
}

impl Default for TransientConfig {
    fn default() -> Self {
        Self {
            delta_max: 100.0,
            min_output: None,
            max_output: None,
            tau: 10.0,
            decrease: false,
            random_error: None,
            change_tolerance: Tolerances::CHANGE_DETECTION,
        }
    }
}

impl TransientConfig {
    pub fn new(delta_max: f64, tau: f64) -> Self {
        Self {
            delta_max,
            tau,
            ..Self::default()
        }
    }

    pub fn with_min_output(mut self, min: f64) -> Self {
        self.min_output = Some(min);
        self
    }

    pub fn with_max_output(mut self, max: f64) -> Self {
        self.max_output = Some(max);
        self
    }

    pub fn decreasing(mut self) -> Self {
        self.decrease = true;
        self
    }

    pub fn with_random_error(mut self, random_error: f64) -> Self {
        self.random_error = Some(random_error);
        self
    }

    pub fn with_change_tolerance(mut self, tolerance: Tolerances) -> Self {
        self.change_tolerance = tolerance;
        self
    }

    /// Check the parameters before any evaluation.
    ///
    /// # Errors
    ///
    /// Configuration error for a non-positive `tau`, a non-finite
    /// `delta_max`, inverted bounds or a negative tolerance.
    pub fn validate(&self) -> SimResult<()> {
        if !self.tau.is_finite() || self.tau <= 0.0 {
            return Err(SimError::config(format!("tau must be positive, got {}", self.tau)));
        }
        if !self.delta_max.is_finite() {
            return Err(SimError::config("delta_max must be finite"));
        }
        if let (Some(min), Some(max)) = (self.min_output, self.max_output) {
            if min > max {
                return Err(SimError::config(format!(
                    "min_output ({min}) is above max_output ({max})"
                )));
            }
        }
        self.change_tolerance.validate()?;
        Ok(())
    }

    fn direction(&self) -> f64 {
        if self.decrease { -1.0 } else { 1.0 }
    }

    fn clamp(&self, mut output: f64) -> f64 {
        if let Some(max) = self.max_output {
            output = output.min(max);
        }
        if let Some(min) = self.min_output {
            output = output.max(min);
        }
        output
    }
}

/// Which last-seen value a step is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tracked {
    Command,
    Input,
}

/// Physically plausible, time-delayed response to a command or input.
#[derive(Debug, Clone)]
pub struct TransientElement {
    state: SystemState,
    clock: ClockRef,
    input: InputDescriptor,
    config: TransientConfig,
    last_command: f64,
    last_input: f64,
    last_offset: f64,
    changes: ChangeLedger,
}

impl TransientElement {
    /// Build an element reading `input` on `clock`.
    ///
    /// # Errors
    ///
    /// Configuration error if `config` is invalid or `input` is a mix
    /// descriptor (mixes go through [`Mix`](crate::blocks::Mix) first).
    pub fn new(
        name: impl Into<String>,
        input: impl Into<InputDescriptor>,
        config: TransientConfig,
        clock: ClockRef,
    ) -> SimResult<Self> {
        config.validate()?;
        let input = input.into();
        if let InputDescriptor::Mix(_) = input {
            return Err(SimError::config(
                "transient input must be a value or a value-command pair",
            ));
        }

        let mut state = SystemState::new(name).with_clock(clock.clone());
        if let Some(random_error) = config.random_error {
            state = state.with_noise(Noise::new(random_error)?);
        }

        Ok(Self {
            state,
            clock,
            input,
            config,
            last_command: 0.0,
            last_input: 0.0,
            last_offset: 0.0,
            changes: ChangeLedger::new(),
        })
    }

    /// Replace the noise source, e.g. with a seeded one.
    pub fn with_noise(mut self, noise: Option<Noise>) -> Self {
        self.state.set_noise(noise);
        self
    }

    pub fn config(&self) -> &TransientConfig {
        &self.config
    }

    pub fn input(&self) -> &InputDescriptor {
        &self.input
    }

    /// Swap the whole input descriptor. Mix descriptors are still accepted
    /// here and rejected at evaluation, surfacing the wiring mistake there.
    pub fn set_input(&mut self, input: impl Into<InputDescriptor>) {
        self.input = input.into();
    }

    pub fn set_value(&mut self, source: impl Into<InputSource>) {
        self.input.set_value(source);
    }

    pub fn set_command(&mut self, source: impl Into<InputSource>) -> SimResult<()> {
        self.input.set_command(source)
    }

    /// Change the output span at 100 % command.
    ///
    /// With a command already applied, the shift `Δdelta_max × last_command / 100`
    /// is released through the ledger like any other step.
    pub fn set_delta_max(&mut self, delta_max: f64) -> SimResult<()> {
        if !delta_max.is_finite() {
            return Err(SimError::config("delta_max must be finite"));
        }
        let shift = (delta_max - self.config.delta_max) * self.last_command / 100.0;
        self.config.delta_max = delta_max;

        if matches!(self.input, InputDescriptor::ValueCommand(_))
            && shift.abs() > self.config.change_tolerance.abs
        {
            let now = self.clock.now();
            self.changes
                .append(PendingChange::start(shift, self.config.tau, now)?);
            debug!(
                element = self.state.name(),
                delta_max,
                shift,
                pending = self.changes.len(),
                "span changed"
            );
        }
        Ok(())
    }

    pub fn delta_max(&self) -> f64 {
        self.config.delta_max
    }

    pub fn last_command(&self) -> f64 {
        self.last_command
    }

    pub fn last_input(&self) -> f64 {
        self.last_input
    }

    /// Net delta applied by the latest evaluation.
    pub fn last_offset(&self) -> f64 {
        self.last_offset
    }

    pub fn ledger(&self) -> &ChangeLedger {
        &self.changes
    }

    /// Whether any step is still releasing at the current time.
    pub fn is_transitioning(&self) -> bool {
        !self.changes.fold(self.clock.now()).all_settled
    }

    /// Convert a raw difference into an output delta for the tracked quantity.
    fn scale(&self, tracked: Tracked, raw: f64) -> f64 {
        match tracked {
            Tracked::Command => raw / 100.0 * self.config.delta_max,
            Tracked::Input => raw,
        }
    }

    /// Register a step if `current` moved, then return the net delta at `now`.
    fn advance(&mut self, tracked: Tracked, current: f64, now: f64) -> SimResult<f64> {
        let last = match tracked {
            Tracked::Command => self.last_command,
            Tracked::Input => self.last_input,
        };

        if !nearly_equal(current, last, self.config.change_tolerance) {
            let magnitude = self.scale(tracked, current - last);
            self.changes
                .append(PendingChange::start(magnitude, self.config.tau, now)?);
            debug!(
                element = self.state.name(),
                from = last,
                to = current,
                magnitude,
                pending = self.changes.len(),
                "step detected"
            );
            self.remember(tracked, current);
            return Ok(self.changes.fold(now).net_delta);
        }

        let fold = self.changes.fold(now);
        if !fold.all_settled {
            return Ok(fold.net_delta);
        }

        let anchored = self.scale(tracked, current);
        if self.changes.len() > 1 {
            trace!(
                element = self.state.name(),
                entries = self.changes.len(),
                net_delta = anchored,
                "ledger compacted"
            );
        }
        self.changes.compact(anchored);
        self.remember(tracked, current);
        Ok(anchored)
    }

    fn remember(&mut self, tracked: Tracked, current: f64) {
        match tracked {
            Tracked::Command => self.last_command = current,
            Tracked::Input => self.last_input = current,
        }
    }
}

impl System for TransientElement {
    fn state(&self) -> &SystemState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SystemState {
        &mut self.state
    }

    fn set_clock(&mut self, clock: ClockRef) {
        self.state.set_clock(clock.clone());
        self.clock = clock;
    }

    fn output(&mut self) -> SimResult<f64> {
        let resolved = self.input.resolve()?;
        let now = self.clock.now();
        let direction = self.config.direction();

        let (raw, offset) = match resolved {
            Resolved::ValueCommand { value, command } => {
                let delta = self.advance(Tracked::Command, command, now)?;
                (value + direction * delta, delta)
            }
            Resolved::Value(value) => {
                let delta = self.advance(Tracked::Input, value, now)?;
                (direction * delta, delta)
            }
            Resolved::Mix { .. } => {
                return Err(SimError::TypeMismatch {
                    expected: "value or value-command input",
                    found: "mix input",
                });
            }
        };

        let noisy = self.state.perturb(raw);
        let output = self.config.clamp(noisy);
        self.last_offset = offset;
        Ok(self.state.commit(Some(now), output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{MixInputElement, ValueCommandElement};
    use ps_core::ManualClock;

    fn element(config: TransientConfig, clock: &ManualClock) -> TransientElement {
        TransientElement::new(
            "supply_temp",
            ValueCommandElement::new(20.0, 100.0),
            config,
            clock.handle(),
        )
        .unwrap()
    }

    #[test]
    fn first_read_starts_at_base() {
        let clock = ManualClock::new(0.0);
        let mut e = element(TransientConfig::new(20.0, 2.0), &clock);
        assert_eq!(e.output().unwrap(), 20.0);
        assert_eq!(e.last_command(), 100.0);
        assert_eq!(e.ledger().len(), 1);
        assert!(e.is_transitioning());
    }

    #[test]
    fn settles_then_compacts() {
        let clock = ManualClock::new(0.0);
        let mut e = element(TransientConfig::new(20.0, 2.0), &clock);
        e.output().unwrap();
        clock.advance(10.0);
        assert_eq!(e.output().unwrap(), 40.0);
        assert_eq!(e.ledger().len(), 1);
        assert!(!e.is_transitioning());
        assert_eq!(e.last_offset(), 20.0);
    }

    #[test]
    fn decrease_flips_direction() {
        let clock = ManualClock::new(0.0);
        let mut e = element(TransientConfig::new(20.0, 2.0).decreasing(), &clock);
        e.output().unwrap();
        clock.advance(10.0);
        assert_eq!(e.output().unwrap(), 0.0);
    }

    #[test]
    fn clamps_after_noise() {
        let clock = ManualClock::new(0.0);
        let config = TransientConfig::new(20.0, 2.0)
            .with_max_output(30.0)
            .with_random_error(5.0);
        let mut e = element(config, &clock);
        for _ in 0..50 {
            clock.advance(0.5);
            assert!(e.output().unwrap() <= 30.0);
        }
    }

    #[test]
    fn value_only_mode_lags_input() {
        let clock = ManualClock::new(0.0);
        let mut e = TransientElement::new(
            "lag",
            InputSource::from(16.9),
            TransientConfig::new(0.0, 10.0),
            clock.handle(),
        )
        .unwrap();
        assert_eq!(e.output().unwrap(), 0.0);
        clock.advance(10.0);
        let mid = e.output().unwrap();
        assert!(mid > 10.0 && mid < 16.9);
        clock.advance(60.0);
        assert_eq!(e.output().unwrap(), 16.9);
    }

    #[test]
    fn rejects_mix_inputs() {
        let clock = ManualClock::new(0.0);
        let err = TransientElement::new(
            "mix",
            MixInputElement::new(1.0, 2.0),
            TransientConfig::default(),
            clock.handle(),
        )
        .unwrap_err();
        assert!(matches!(err, SimError::Configuration { .. }));

        let mut e = element(TransientConfig::default(), &clock);
        e.set_input(MixInputElement::new(1.0, 2.0));
        assert!(matches!(e.output(), Err(SimError::TypeMismatch { .. })));
    }

    #[test]
    fn span_change_is_lagged() {
        let clock = ManualClock::new(0.0);
        let mut e = element(TransientConfig::new(20.0, 2.0), &clock);
        e.output().unwrap();
        clock.advance(20.0);
        assert_eq!(e.output().unwrap(), 40.0);

        e.set_delta_max(10.0).unwrap();
        assert_eq!(e.ledger().len(), 2);
        assert_eq!(e.output().unwrap(), 40.0);
        clock.advance(2.0);
        let mid = e.output().unwrap();
        assert!((mid - (40.0 - 10.0 * (1.0 - (-1.0_f64).exp()))).abs() < 1e-9);
        clock.advance(20.0);
        assert_eq!(e.output().unwrap(), 30.0);
        assert_eq!(e.ledger().len(), 1);
    }

    #[test]
    fn span_change_before_first_command_is_silent() {
        let clock = ManualClock::new(0.0);
        let mut e = element(TransientConfig::new(20.0, 2.0), &clock);
        e.set_delta_max(5.0).unwrap();
        assert!(e.ledger().is_empty());
        e.set_delta_max(5.0).unwrap();
        assert!(e.ledger().is_empty());
    }

    #[test]
    fn invalid_config() {
        assert!(TransientConfig::new(10.0, 0.0).validate().is_err());
        assert!(
            TransientConfig::new(10.0, 1.0)
                .with_min_output(5.0)
                .with_max_output(1.0)
                .validate()
                .is_err()
        );
        assert!(TransientConfig::new(f64::INFINITY, 1.0).validate().is_err());
        let err = TransientConfig::new(10.0, 1.0)
            .with_change_tolerance(Tolerances { abs: -1.0, rel: 0.0 })
            .validate()
            .unwrap_err();
        assert!(matches!(err, SimError::Configuration { .. }));
    }
}
