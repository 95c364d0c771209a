// ps-core/src/units.rs

use uom::si::f64::{
    Power as UomPower, TemperatureInterval as UomTemperatureInterval, Time as UomTime,
    VolumeRate as UomVolumeRate,
};

// Public canonical unit types (SI, f64)
pub type Power = UomPower;
pub type TempInterval = UomTemperatureInterval;
pub type Time = UomTime;
pub type VolumeRate = UomVolumeRate;

#[inline]
pub fn kw(v: f64) -> Power {
    use uom::si::power::kilowatt;
    Power::new::<kilowatt>(v)
}

#[inline]
pub fn lps(v: f64) -> VolumeRate {
    use uom::si::volume_rate::liter_per_second;
    VolumeRate::new::<liter_per_second>(v)
}

#[inline]
pub fn cfm(v: f64) -> VolumeRate {
    use uom::si::volume_rate::cubic_foot_per_minute;
    VolumeRate::new::<cubic_foot_per_minute>(v)
}

#[inline]
pub fn s(v: f64) -> Time {
    use uom::si::time::second;
    Time::new::<second>(v)
}

/// Convert an airflow in CFM to L/s.
pub fn cfm_to_lps(v: f64) -> f64 {
    use uom::si::volume_rate::liter_per_second;
    cfm(v).get::<liter_per_second>()
}

/// Convert an airflow in L/s to CFM.
pub fn lps_to_cfm(v: f64) -> f64 {
    use uom::si::volume_rate::cubic_foot_per_minute;
    lps(v).get::<cubic_foot_per_minute>()
}

/// Convert a BTU/h rating to kW.
pub fn btuh_to_kw(v: f64) -> f64 {
    v / constants::BTUH_PER_KW
}

/// Air temperature rise produced by `power` heating an airstream of `flow`.
///
/// `ΔT = P / (ρ · cp · V̇)` with standard air properties. Zero flow gives an
/// infinite rise; callers reject non-positive flow up front.
pub fn air_heating_delta_t(power: Power, flow: VolumeRate) -> TempInterval {
    use uom::si::power::watt;
    use uom::si::temperature_interval::kelvin;
    use uom::si::volume_rate::cubic_meter_per_second;

    let w = power.get::<watt>();
    let m3s = flow.get::<cubic_meter_per_second>();
    TempInterval::new::<kelvin>(w / (constants::AIR_DENSITY_KG_M3 * constants::AIR_CP_J_KGK * m3s))
}

pub mod constants {
    /// Standard air density.
    pub const AIR_DENSITY_KG_M3: f64 = 1.2;
    /// Specific heat of dry air.
    pub const AIR_CP_J_KGK: f64 = 1006.0;
    pub const BTUH_PER_KW: f64 = 3412.0;
}
