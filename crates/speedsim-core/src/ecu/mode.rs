//! Engine operating modes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::protocol::ProtocolError;

/// Operating mode of the simulated engine. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineMode {
    /// Cold start, cranking
    Startup,
    /// Fast idle while the coolant warms up
    WarmupIdle,
    /// Normal idle with a warm engine
    Idle,
    /// Part throttle cruising
    LightLoad,
    /// Moderate to heavy acceleration
    Acceleration,
    /// Sustained operation above the high-RPM threshold
    HighRpm,
    /// Throttle closed, engine braking
    Deceleration,
    /// Full load
    #[serde(rename = "wot")]
    WideOpenThrottle,
}

impl EngineMode {
    /// Every mode, in state machine order
    pub const ALL: [EngineMode; 8] = [
        EngineMode::Startup,
        EngineMode::WarmupIdle,
        EngineMode::Idle,
        EngineMode::LightLoad,
        EngineMode::Acceleration,
        EngineMode::HighRpm,
        EngineMode::Deceleration,
        EngineMode::WideOpenThrottle,
    ];

    /// Modes an operator may force from a monitoring front-end
    pub const OVERRIDES: [EngineMode; 5] = [
        EngineMode::Idle,
        EngineMode::LightLoad,
        EngineMode::Acceleration,
        EngineMode::HighRpm,
        EngineMode::WideOpenThrottle,
    ];

    /// Machine-readable key (`"warmup_idle"`, `"wot"`, ...)
    pub fn key(&self) -> &'static str {
        match self {
            EngineMode::Startup => "startup",
            EngineMode::WarmupIdle => "warmup_idle",
            EngineMode::Idle => "idle",
            EngineMode::LightLoad => "light_load",
            EngineMode::Acceleration => "acceleration",
            EngineMode::HighRpm => "high_rpm",
            EngineMode::Deceleration => "deceleration",
            EngineMode::WideOpenThrottle => "wot",
        }
    }

    /// Human-readable label for dashboards
    pub fn label(&self) -> &'static str {
        match self {
            EngineMode::Startup => "Startup",
            EngineMode::WarmupIdle => "Warming Up",
            EngineMode::Idle => "Idle",
            EngineMode::LightLoad => "Light Load",
            EngineMode::Acceleration => "Accelerating",
            EngineMode::HighRpm => "High RPM",
            EngineMode::Deceleration => "Decelerating",
            EngineMode::WideOpenThrottle => "Wide Open Throttle",
        }
    }

    /// Whether the engine is idling (cold or warm)
    pub fn is_idle(&self) -> bool {
        matches!(self, EngineMode::Idle | EngineMode::WarmupIdle)
    }

    /// Whether this mode may be forced through the override entry point
    pub fn is_override_target(&self) -> bool {
        Self::OVERRIDES.contains(self)
    }
}

impl fmt::Display for EngineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for EngineMode {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        EngineMode::ALL
            .iter()
            .copied()
            .find(|mode| mode.key() == wanted)
            .ok_or_else(|| ProtocolError::UnknownMode(s.to_string()))
    }
}
