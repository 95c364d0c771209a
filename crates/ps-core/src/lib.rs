//! ps-core: shared foundation for plantsim.
//!
//! Contains:
//! - numeric (Real + tolerances + float helpers)
//! - clock (wall-clock and manual time sources)
//! - point (field-point values, sources and sinks)
//! - units (uom SI types + HVAC conversions)
//! - error (shared error types)

pub mod clock;
pub mod error;
pub mod numeric;
pub mod point;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use clock::{Clock, ClockRef, ManualClock, SystemClock};
pub use error::{CoreError, CoreResult};
pub use numeric::*;
pub use point::{PointRef, PointSink, PointSource, PointValue, SimPoint};
