//! ps-equipment: simulated HVAC equipment built on the transient engine.
//!
//! Each façade owns its transient elements and exposes named readings:
//! - Fans and pumps (on/off, speed-driven flow, pressure and amperage)
//! - Parallel groups of fans or pumps
//! - Chillers, coil valves, DX cooling stages
//! - Mixed-air dampers
//! - Tanks with proximity level switches
//!
//! All façades implement [`Equipment`] and live in a [`Registry`] owned by
//! the simulation session.

pub mod chiller;
pub mod damper;
pub mod device;
pub mod dx_cooling;
pub mod error;
pub mod fan;
pub mod group;
pub mod registry;
pub mod tank;
pub mod traits;
pub mod valve;

pub use chiller::{Chiller, ChillerConfig};
pub use damper::{DamperConfig, MixedAirDampers};
pub use device::{OnOffDevice, Transition};
pub use dx_cooling::{DxCoolingConfig, DxCoolingStage};
pub use error::{EquipmentError, EquipmentResult};
pub use fan::{Fan, FanConfig, Pump};
pub use group::ParallelGroup;
pub use registry::{EquipmentKind, Registry};
pub use tank::{Tank, TankConfig};
pub use traits::Equipment;
pub use valve::{Valve, ValveConfig, ValveMode};
