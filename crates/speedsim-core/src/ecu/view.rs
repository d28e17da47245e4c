//! JSON projections for monitoring front-ends
//!
//! Built only from the record's read accessors; nothing here reaches into the
//! simulation state.

use serde::Serialize;

use super::{EngineMode, EngineStatus};

/// Decoded real-time values in physical units
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RealtimeView {
    /// Engine speed (RPM)
    pub rpm: u16,
    /// Coolant temperature (°C)
    pub clt: i16,
    /// Intake air temperature (°C)
    pub iat: i16,
    /// Manifold pressure (kPa)
    pub map: u16,
    /// Throttle position (%)
    pub tps: u8,
    /// Target air-fuel ratio
    pub afr: f64,
    /// Ignition advance (degrees BTDC)
    pub advance: u8,
    /// Injector pulse width (ms)
    pub pw: f64,
    /// Battery voltage (V)
    pub battery: f64,
    /// Volumetric efficiency (%)
    pub ve: u8,
}

impl From<&EngineStatus> for RealtimeView {
    fn from(status: &EngineStatus) -> Self {
        Self {
            rpm: status.rpm(),
            clt: status.coolant_temp(),
            iat: status.intake_temp(),
            map: status.map(),
            tps: status.tps,
            afr: f64::from(status.afr_target) / 10.0,
            advance: status.advance,
            pw: f64::from(status.pulse_width()) / 10.0,
            battery: f64::from(status.battery_v) / 10.0,
            ve: status.ve,
        }
    }
}

/// Current mode and runtime
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusView {
    /// Active mode key
    pub mode: EngineMode,
    /// Seconds since initialization
    pub runtime: u32,
}

/// Mode label, runtime and protocol counters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsView {
    /// Active mode, human readable
    pub mode: &'static str,
    /// Seconds since initialization
    pub runtime: u32,
    /// Commands processed
    pub commands: u32,
    /// Unknown commands rejected
    pub errors: u32,
}

impl StatisticsView {
    /// Assemble from engine and protocol accessors
    pub fn new(mode: EngineMode, runtime: u32, commands: u32, errors: u32) -> Self {
        Self {
            mode: mode.label(),
            runtime,
            commands,
            errors,
        }
    }
}
