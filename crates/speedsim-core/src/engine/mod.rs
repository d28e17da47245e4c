//! Engine Simulation
//!
//! Timed model of a 2.0 L inline-4 that evolves RPM, temperatures, pressures,
//! fuelling, ignition and supply voltage through plausible transients, and
//! publishes the result as an [`EngineStatus`] record once per tick.
//!
//! Each tick runs a single pass over the stages below, in this order. Later
//! stages read what earlier stages produced during the same tick:
//!
//! state machine → RPM → thermal → throttle → MAP → fuel → ignition → AFR →
//! corrections → status flags → voltage → auxiliary block → counters
//!
//! Random draws happen in that same order, so a seeded random source yields an
//! identical trace on every run.

pub mod constants;
pub mod curves;
mod physics;
mod state_machine;

use crate::ecu::{EngineMode, EngineStatus};
use crate::platform::{RandomProvider, TimeProvider};

use constants::*;

/// Engine simulator driven by an injected clock and random source
pub struct EngineSimulator<C, R> {
    /// Monotonic millisecond clock
    clock: C,
    /// Source for jitter and sensor noise
    rng: R,
    /// Published record, rewritten every tick
    status: EngineStatus,

    /// Active operating mode
    mode: EngineMode,
    /// Time of the last accepted tick (ms)
    last_update_ms: u32,
    /// Time the current mode was entered (ms)
    state_start_ms: u32,
    /// Time of `initialize()` (ms)
    engine_start_ms: u32,
    /// Ticks since initialization
    loop_counter: u32,
    /// Whole seconds since initialization, reported modulo 256
    second_counter: u16,

    /// Engine speed (RPM)
    current_rpm: u16,
    /// Speed the current mode is heading for (RPM)
    target_rpm: u16,
    /// Ramp rate toward the target (RPM/s)
    rpm_ramp: i16,
    /// Throttle opening before sensor noise (%)
    current_throttle: u8,
    /// Throttle opening the current mode is heading for (%)
    target_throttle: u8,
    /// Last reported throttle reading (%)
    last_tps: u8,
    /// Throttle rate of change (%/s)
    tps_rate: i16,

    /// Coolant temperature (°C × 10)
    coolant_temp: i16,
    /// Intake air temperature (°C × 10)
    intake_temp: i16,
    /// Exhaust gas temperature (°C × 10)
    exhaust_temp: i16,

    /// Enriched pulse width before closed-loop corrections (0.1 ms)
    pulse_width: u16,
    /// Injector duty cycle (%)
    injector_duty: u8,
    /// Direction of the closed-loop EGO trim sweep
    ego_trend: i8,
}

impl<C: TimeProvider, R: RandomProvider> EngineSimulator<C, R> {
    /// Create a simulator. Call [`initialize`](Self::initialize) before the first tick.
    pub fn new(clock: C, rng: R) -> Self {
        Self {
            clock,
            rng,
            status: EngineStatus::zeroed(),
            mode: EngineMode::Startup,
            last_update_ms: 0,
            state_start_ms: 0,
            engine_start_ms: 0,
            loop_counter: 0,
            second_counter: 0,
            current_rpm: 0,
            target_rpm: 0,
            rpm_ramp: 0,
            current_throttle: 0,
            target_throttle: 0,
            last_tps: 0,
            tps_rate: 0,
            coolant_temp: TEMP_AMBIENT,
            intake_temp: TEMP_AMBIENT,
            exhaust_temp: TEMP_AMBIENT,
            pulse_width: 0,
            injector_duty: 0,
            ego_trend: 1,
        }
    }

    /// Reset to a cold start: engine stopped, ambient temperatures, Startup mode
    pub fn initialize(&mut self) {
        let now = self.clock.millis();

        self.status = EngineStatus::zeroed();
        self.status.response = b'A';

        self.mode = EngineMode::Startup;
        self.engine_start_ms = now;
        self.last_update_ms = now;
        self.state_start_ms = now;
        self.loop_counter = 0;
        self.second_counter = 0;

        // Cranking toward a high cold idle
        self.current_rpm = 0;
        self.target_rpm = RPM_IDLE_MIN + 200;
        self.rpm_ramp = 500;
        self.current_throttle = TPS_IDLE;
        self.target_throttle = TPS_IDLE;
        self.last_tps = TPS_IDLE;
        self.tps_rate = 0;

        self.coolant_temp = TEMP_AMBIENT;
        self.intake_temp = TEMP_AMBIENT;
        self.exhaust_temp = TEMP_AMBIENT;

        self.pulse_width = 0;
        self.injector_duty = 0;
        self.ego_trend = 1;

        self.status.set_rpm(self.current_rpm);
        self.status.set_coolant_temp(self.coolant_temp / 10);
        self.status.set_intake_temp(self.intake_temp / 10);
        self.status.set_map(MAP_ATMOSPHERIC);
        self.status.battery_v = VOLTAGE_NORMAL;
        self.status.baro = BARO_SEALEVEL;
        self.status.tps = self.current_throttle;

        tracing::debug!(start_ms = now, "engine initialized");
    }

    /// Advance the simulation by one step if the update interval has elapsed.
    ///
    /// Returns `false` without touching any state when called again within the
    /// same interval.
    pub fn tick(&mut self) -> bool {
        let now = self.clock.millis();
        if now.wrapping_sub(self.last_update_ms) < UPDATE_INTERVAL_MS {
            return false;
        }

        self.last_update_ms = now;
        self.loop_counter = self.loop_counter.wrapping_add(1);

        if self.loop_counter % TICKS_PER_SECOND == 0 {
            self.second_counter = self.second_counter.wrapping_add(1);
            self.status.secl = (self.second_counter & 0xFF) as u8;
        }

        self.update_state_machine(now);

        self.simulate_rpm();
        self.simulate_thermal();
        self.simulate_throttle();
        self.simulate_map();
        self.simulate_fuel();
        self.simulate_ignition();
        self.simulate_afr();
        self.simulate_corrections();
        self.simulate_sensors();
        self.simulate_voltage();
        self.simulate_aux_data();

        self.status.set_loops((self.loop_counter & 0xFFFF) as u16);
        self.status.set_free_ram(FREE_RAM_BYTES);

        // Occasional synthetic fault code
        self.status.errors = if self.rng.random_below(100) < 2 {
            self.rng.random_range(1, 4) as u8
        } else {
            0
        };

        true
    }

    /// Force an immediate transition to `mode`, as if the state machine had chosen it
    pub fn set_mode(&mut self, mode: EngineMode) {
        let now = self.clock.millis();
        self.transition_to(mode, now);
    }

    /// Current real-time record
    pub fn status(&self) -> &EngineStatus {
        &self.status
    }

    /// Active operating mode
    pub fn mode(&self) -> EngineMode {
        self.mode
    }

    /// Whole seconds since `initialize()`
    pub fn runtime_seconds(&self) -> u32 {
        self.clock.millis().wrapping_sub(self.engine_start_ms) / 1000
    }

    /// Accepted ticks since `initialize()`
    pub fn tick_count(&self) -> u32 {
        self.loop_counter
    }

    /// Exhaust gas temperature (°C × 10)
    pub fn exhaust_temp(&self) -> i16 {
        self.exhaust_temp
    }

    /// Injector duty cycle (%)
    pub fn injector_duty(&self) -> u8 {
        self.injector_duty
    }

    /// Sensor noise, uniform over `[-range, range]`
    fn noise(&mut self, range: i32) -> i32 {
        self.rng.random_range(-range, range + 1)
    }
}
