//! Engine model constants
//!
//! Calibrated for a 2.0 L naturally aspirated inline-4. Temperatures are °C × 10,
//! pulse widths 0.1 ms, voltages 0.1 V and AFR 0.1 AFR units.

#![allow(missing_docs)]

// RPM bands
pub const RPM_MIN: u16 = 0;
pub const RPM_IDLE_MIN: u16 = 700;
pub const RPM_IDLE_MAX: u16 = 900;
pub const RPM_CRUISE: u16 = 2500;
pub const RPM_HIGH_START: u16 = 5000;
pub const RPM_REDLINE: u16 = 6800;
pub const RPM_MAX: u16 = 7000;

// Temperatures (°C × 10)
pub const TEMP_AMBIENT: i16 = 200;
pub const TEMP_ENGINE_COLD: i16 = 400;
pub const TEMP_ENGINE_WARM: i16 = 800;
pub const TEMP_ENGINE_HOT: i16 = 950;
pub const TEMP_ENGINE_MAX: i16 = 1100;
/// Coolant temperature that ends the warm-up idle
pub const TEMP_WARMUP_DONE: i16 = 600;
/// Coolant temperature above which closed-loop fuelling is allowed
pub const TEMP_CLOSED_LOOP: i16 = 500;
/// Exhaust gas temperature at idle
pub const TEMP_EXHAUST_IDLE: i16 = 3500;

// Pressures (kPa)
pub const MAP_MIN: u16 = 20;
pub const MAP_IDLE: u16 = 35;
pub const MAP_CRUISE: u16 = 60;
pub const MAP_WOT: u16 = 95;
pub const MAP_ATMOSPHERIC: u16 = 100;
pub const BARO_SEALEVEL: u8 = 100;

// Supply voltage (0.1 V)
pub const VOLTAGE_CRANKING: u8 = 100;
pub const VOLTAGE_LOW: u8 = 120;
pub const VOLTAGE_NORMAL: u8 = 140;
pub const VOLTAGE_CHARGING: u8 = 145;

// Air-fuel ratio (0.1 AFR)
pub const AFR_STOICH: u8 = 147;
pub const AFR_RICH: u8 = 130;
pub const AFR_LEAN: u8 = 160;
pub const AFR_WOT: u8 = 125;

// Throttle (%)
pub const TPS_IDLE: u8 = 2;
pub const TPS_CRUISE: u8 = 20;
pub const TPS_HALF: u8 = 50;
pub const TPS_WOT: u8 = 100;

// Ignition advance (degrees BTDC)
pub const TIMING_MIN: u8 = 5;
pub const TIMING_IDLE: u8 = 15;
pub const TIMING_MAX: u8 = 35;

// Dwell (0.1 ms)
pub const DWELL_NORMAL: u8 = 35;
pub const DWELL_LOW_VOLTAGE: u8 = 45;

// Pulse width (0.1 ms)
pub const PW_MIN: u16 = 10;
pub const PW_MAX: u16 = 255;

// Volumetric efficiency (%)
pub const VE_MIN: u8 = 30;
pub const VE_MAX: u8 = 100;

// Closed-loop EGO trim window (%)
pub const EGO_MIN: u8 = 90;
pub const EGO_MAX: u8 = 110;

// Timing
pub const UPDATE_INTERVAL_MS: u32 = 50;
pub const TICKS_PER_SECOND: u32 = 1000 / UPDATE_INTERVAL_MS;
pub const STATE_TRANSITION_MS: u32 = 5000;
pub const WARMUP_TIME_MS: u32 = 30_000;

/// Free memory reported in the record
pub const FREE_RAM_BYTES: u16 = 8192;
