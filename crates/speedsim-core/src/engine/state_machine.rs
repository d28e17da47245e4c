//! Operating-mode state machine

use super::constants::*;
use super::EngineSimulator;
use crate::ecu::EngineMode;
use crate::platform::{RandomProvider, TimeProvider};

impl<C: TimeProvider, R: RandomProvider> EngineSimulator<C, R> {
    /// Evaluate the exit conditions of the active mode
    pub(super) fn update_state_machine(&mut self, now: u32) {
        let time_in_state = now.wrapping_sub(self.state_start_ms);

        match self.mode {
            EngineMode::Startup => {
                if time_in_state >= 1000 && self.current_rpm > RPM_IDLE_MIN / 2 {
                    self.transition_to(EngineMode::WarmupIdle, now);
                }
            }

            EngineMode::WarmupIdle => {
                if self.coolant_temp > TEMP_WARMUP_DONE {
                    self.transition_to(EngineMode::Idle, now);
                }
            }

            EngineMode::Idle => {
                if time_in_state >= STATE_TRANSITION_MS {
                    let roll = self.rng.random_below(100);
                    if roll < 30 {
                        self.transition_to(EngineMode::LightLoad, now);
                    } else if roll < 35 {
                        self.transition_to(EngineMode::Acceleration, now);
                    }
                }
            }

            EngineMode::LightLoad => {
                if time_in_state >= STATE_TRANSITION_MS {
                    let roll = self.rng.random_below(100);
                    if roll < 40 {
                        self.transition_to(EngineMode::Acceleration, now);
                    } else if roll < 70 {
                        self.transition_to(EngineMode::Deceleration, now);
                    } else {
                        self.transition_to(EngineMode::Idle, now);
                    }
                }
            }

            EngineMode::Acceleration => {
                if self.current_rpm > RPM_HIGH_START {
                    self.transition_to(EngineMode::HighRpm, now);
                } else if time_in_state >= 3000 && self.rng.random_below(100) < 30 {
                    self.transition_to(EngineMode::LightLoad, now);
                }
            }

            EngineMode::HighRpm => {
                if time_in_state >= 2000 {
                    self.transition_to(EngineMode::Deceleration, now);
                }
            }

            EngineMode::Deceleration => {
                if self.current_rpm < RPM_IDLE_MAX + 200 {
                    self.transition_to(EngineMode::Idle, now);
                }
            }

            EngineMode::WideOpenThrottle => {
                if time_in_state >= 3000 || self.current_rpm > RPM_REDLINE {
                    self.transition_to(EngineMode::HighRpm, now);
                }
            }
        }
    }

    /// Enter `mode` and derive its targets, jittered from the random source
    pub(super) fn transition_to(&mut self, mode: EngineMode, now: u32) {
        let previous = self.mode;
        self.mode = mode;
        self.state_start_ms = now;

        let (target_rpm, target_throttle, ramp) = match mode {
            EngineMode::Startup => (i32::from(RPM_IDLE_MIN) + 200, i32::from(TPS_IDLE) + 5, 500),
            EngineMode::WarmupIdle => (i32::from(RPM_IDLE_MIN) + 150, i32::from(TPS_IDLE) + 3, 100),
            EngineMode::Idle => (
                i32::from(RPM_IDLE_MIN) + self.rng.random_range(-50, 50),
                i32::from(TPS_IDLE),
                50,
            ),
            EngineMode::LightLoad => {
                let rpm = i32::from(RPM_CRUISE) + self.rng.random_range(-300, 300);
                let throttle = i32::from(TPS_CRUISE) + self.rng.random_range(-5, 10);
                (rpm, throttle, 200)
            }
            EngineMode::Acceleration => {
                let rpm = i32::from(RPM_HIGH_START) + self.rng.random_range(-500, 500);
                let throttle = i32::from(TPS_HALF) + self.rng.random_range(10, 40);
                (rpm, throttle, 1000)
            }
            EngineMode::HighRpm => {
                let rpm = i32::from(RPM_REDLINE) - self.rng.random_range(100, 500);
                let throttle = i32::from(TPS_WOT) - self.rng.random_range(0, 20);
                (rpm, throttle, 500)
            }
            EngineMode::Deceleration => (
                i32::from(RPM_IDLE_MAX) + self.rng.random_range(0, 500),
                i32::from(TPS_IDLE),
                -800,
            ),
            EngineMode::WideOpenThrottle => (i32::from(RPM_REDLINE), i32::from(TPS_WOT), 1500),
        };

        self.target_rpm = target_rpm.clamp(i32::from(RPM_MIN), i32::from(RPM_MAX)) as u16;
        self.target_throttle = target_throttle.clamp(0, i32::from(TPS_WOT)) as u8;
        self.rpm_ramp = ramp;

        tracing::debug!(
            from = %previous,
            to = %mode,
            target_rpm = self.target_rpm,
            target_throttle = self.target_throttle,
            "mode transition"
        );
    }
}
