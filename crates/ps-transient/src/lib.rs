//! Transient simulation engine for plantsim.
//!
//! Equipment outputs do not jump when a command changes: a fan spins up, a
//! coil cools down, a tank fills. This crate models that lag with a ledger of
//! first-order step responses that are superposed on every read.
//!
//! # Architecture
//!
//! - A [`System`] is evaluated on demand through [`System::output`]
//! - Inputs are [`InputSource`]s grouped into an [`InputDescriptor`]
//! - [`TransientElement`] tracks steps in its command (or input) and releases
//!   them along a [`DecayCurve`]
//! - [`blocks`] holds stateless helpers (ADD, SUB, MIX, ...) that can feed or
//!   be fed by transient elements
//!
//! Time comes from a [`ps_core::Clock`], so tests drive it by hand.

pub mod blocks;
pub mod decay;
pub mod element;
pub mod error;
pub mod input;
pub mod ledger;
pub mod noise;
pub mod system;

pub use blocks::{Add, Airflow, Cool, Heat, HeaterPower, Linear, Mix, Passthru, Select, Sub};
pub use decay::{DecayCurve, Direction, SETTLE_FRACTION};
pub use element::{TransientConfig, TransientElement};
pub use error::{SimError, SimResult};
pub use input::{InputDescriptor, InputSource, MixInputElement, Resolved, ValueCommandElement};
pub use ledger::{ChangeLedger, Fold, PendingChange, Release};
pub use noise::Noise;
pub use system::{System, SystemRef, SystemState, Timing, shared};
