//! Per-tick physics stages
//!
//! Each stage reads the simulation state (including whatever earlier stages
//! wrote this tick) and writes its part of the record.

use super::constants::*;
use super::curves::{
    afr_to_o2, iat_correction, ignition_advance, injector_duty, interpolate, map_value,
    required_pulse_width, target_afr, volumetric_efficiency, warmup_enrichment,
};
use super::EngineSimulator;
use crate::ecu::EngineMode;
use crate::platform::{RandomProvider, TimeProvider};

impl<C: TimeProvider, R: RandomProvider> EngineSimulator<C, R> {
    pub(super) fn simulate_rpm(&mut self) {
        let current = i32::from(self.current_rpm);
        let target = i32::from(self.target_rpm);
        let step = i32::from(self.rpm_ramp).abs() * UPDATE_INTERVAL_MS as i32 / 1000;

        let mut next = if current < target {
            (current + step).min(target)
        } else {
            (current - step).max(target)
        };

        // Idle speed hunts a little
        if self.mode.is_idle() {
            next += self.rng.random_range(-10, 10);
        }

        self.current_rpm = next.clamp(i32::from(RPM_MIN), i32::from(RPM_MAX)) as u16;
        self.status.set_rpm(self.current_rpm);
        // Reports the mode's ramp rate, not the measured change
        self.status.set_rpm_dot(self.rpm_ramp);
    }

    pub(super) fn simulate_thermal(&mut self) {
        let mut target_coolant = match self.mode {
            EngineMode::WideOpenThrottle | EngineMode::HighRpm => TEMP_ENGINE_HOT,
            EngineMode::Idle | EngineMode::WarmupIdle => TEMP_ENGINE_WARM - 50,
            _ => TEMP_ENGINE_WARM,
        };
        // No cooling until the warm-up window has passed
        if self.last_update_ms.wrapping_sub(self.engine_start_ms) < WARMUP_TIME_MS {
            target_coolant = target_coolant.max(self.coolant_temp);
        }
        self.coolant_temp = interpolate(self.coolant_temp, target_coolant, 5);
        self.status.set_coolant_temp(self.coolant_temp / 10);

        // Under-hood heat soaks the intake; airflow at speed cools it again
        let rpm = i32::from(self.current_rpm);
        let mut target_intake = i32::from(TEMP_AMBIENT)
            + (i32::from(self.coolant_temp) - i32::from(TEMP_AMBIENT)) / 4;
        if rpm > i32::from(RPM_CRUISE) {
            target_intake -= (rpm - i32::from(RPM_CRUISE)) / 50;
        }
        self.intake_temp = interpolate(self.intake_temp, target_intake as i16, 10);
        self.status.set_intake_temp(self.intake_temp / 10);

        let target_exhaust = if self.current_rpm == 0 {
            TEMP_AMBIENT
        } else {
            TEMP_EXHAUST_IDLE + (rpm / 2) as i16
        };
        self.exhaust_temp = interpolate(self.exhaust_temp, target_exhaust, 5);
    }

    pub(super) fn simulate_throttle(&mut self) {
        let throttle = interpolate(
            i16::from(self.current_throttle),
            i16::from(self.target_throttle),
            20,
        );
        self.current_throttle = throttle.clamp(0, i16::from(TPS_WOT)) as u8;

        let reading =
            (i32::from(self.current_throttle) + self.noise(1)).clamp(0, i32::from(TPS_WOT));
        self.status.tps = reading as u8;
        self.status.tps_adc = (reading * 255 / 100) as u8;

        self.tps_rate = (i32::from(self.status.tps) - i32::from(self.last_tps)) as i16
            * TICKS_PER_SECOND as i16;
        self.status.tps_dot = self.tps_rate.clamp(0, 255) as u8;
        self.last_tps = self.status.tps;
    }

    pub(super) fn simulate_map(&mut self) {
        let throttle = i32::from(self.current_throttle);
        let rpm = i32::from(self.current_rpm);

        let mut base = if throttle < 10 {
            // Closed throttle: deep vacuum
            i32::from(MAP_IDLE) + (rpm - i32::from(RPM_IDLE_MIN)) / 20
        } else if throttle > 80 {
            i32::from(MAP_WOT) - (i32::from(RPM_MAX) - rpm) / 100
        } else {
            map_value(
                throttle,
                10,
                80,
                i32::from(MAP_IDLE) + 10,
                i32::from(MAP_WOT) - 5,
            )
        };

        if rpm > i32::from(RPM_HIGH_START) {
            base += (rpm - i32::from(RPM_HIGH_START)) / 100;
        }

        let map = (base + self.noise(2)).clamp(i32::from(MAP_MIN), i32::from(MAP_ATMOSPHERIC));
        self.status.set_map(map as u16);
    }

    pub(super) fn simulate_fuel(&mut self) {
        self.status.ve = volumetric_efficiency(self.current_rpm, self.current_throttle);

        let base = required_pulse_width(self.current_rpm, self.status.map(), self.status.ve);

        let wue = warmup_enrichment(self.coolant_temp);
        self.pulse_width = (u32::from(base) * u32::from(wue) / 100) as u16;
        self.status.wue = wue;

        // Corrections carry over from the previous tick's correction stage
        let mut corrected =
            u32::from(self.pulse_width) * u32::from(self.status.ego_correction) / 100;
        corrected = corrected * u32::from(self.status.iat_correction) / 100;
        let corrected = corrected.clamp(u32::from(PW_MIN), u32::from(PW_MAX)) as u16;

        self.status.set_pulse_width(corrected);
        self.injector_duty = injector_duty(corrected, self.current_rpm);

        self.status.tae_amount = if self.tps_rate > 10 {
            (100 + i32::from(self.tps_rate) / 2).min(255) as u8
        } else {
            100
        };

        let gamma = u32::from(self.status.ego_correction)
            * u32::from(self.status.iat_correction)
            * u32::from(self.status.wue)
            / 10_000;
        self.status.gamma_e = gamma.min(255) as u8;
    }

    pub(super) fn simulate_ignition(&mut self) {
        let load = u32::from(self.status.map()) * 100 / u32::from(MAP_ATMOSPHERIC);
        self.status.advance = ignition_advance(self.current_rpm, load.min(255) as u8);

        self.status.dwell = if self.status.battery_v < VOLTAGE_LOW {
            DWELL_LOW_VOLTAGE
        } else {
            DWELL_NORMAL
        };

        self.status.spark = 0x01;
    }

    pub(super) fn simulate_afr(&mut self) {
        let afr = target_afr(self.mode);
        self.status.afr_target = afr;

        let o2 = i32::from(afr_to_o2(afr));
        self.status.o2_2 = (o2 + self.noise(3)).clamp(0, 255) as u8;
        self.status.o2 = (o2 + self.noise(5)).clamp(0, 255) as u8;
    }

    pub(super) fn simulate_corrections(&mut self) {
        if self.coolant_temp > TEMP_CLOSED_LOOP && self.mode != EngineMode::WideOpenThrottle {
            // Closed loop: sweep the trim back and forth across the window
            let ego = (i32::from(self.status.ego_correction) + i32::from(self.ego_trend))
                .clamp(i32::from(EGO_MIN), i32::from(EGO_MAX));
            if ego >= i32::from(EGO_MAX) {
                self.ego_trend = -1;
            } else if ego <= i32::from(EGO_MIN) {
                self.ego_trend = 1;
            }
            self.status.ego_correction = ego as u8;
        } else {
            self.status.ego_correction = 100;
        }

        self.status.iat_correction = iat_correction(self.intake_temp);

        self.status.bat_correction = if self.status.battery_v < VOLTAGE_LOW {
            105
        } else {
            100
        };

        // Pump gas only
        self.status.ethanol_pct = 0;
        self.status.flex_correction = 100;
        self.status.flex_ign_correction = 0;

        self.status.idle_load = if self.mode == EngineMode::Idle {
            (30 + self.rng.random_range(-5, 5)) as u8
        } else {
            0
        };

        // Naturally aspirated
        self.status.boost_target = 0;
        self.status.boost_duty = 0;
    }

    pub(super) fn simulate_sensors(&mut self) {
        let running = self.current_rpm > 0;

        self.status.status1 = 0;
        if running {
            self.status.status1 |= 0x01;
        }
        if self.coolant_temp > TEMP_CLOSED_LOOP {
            self.status.status1 |= 0x02;
        }

        self.status.engine = 0;
        if self.mode == EngineMode::Startup {
            self.status.engine |= 0x01;
        }
        if running {
            self.status.engine |= 0x02;
        }

        self.status.test_outputs = 0;
    }

    pub(super) fn simulate_voltage(&mut self) {
        let base = if self.mode == EngineMode::Startup {
            VOLTAGE_CRANKING
        } else if self.current_rpm > RPM_CRUISE {
            VOLTAGE_CHARGING
        } else {
            VOLTAGE_NORMAL
        };

        self.status.battery_v = (i32::from(base) + self.noise(1)).clamp(0, 255) as u8;
    }

    pub(super) fn simulate_aux_data(&mut self) {
        let aux = &mut self.status.aux;

        // Bus frames are big-endian
        aux[..2].copy_from_slice(&self.current_rpm.to_be_bytes());

        // Rough road speed, ~100 RPM per km/h
        aux[2] = (self.current_rpm / 100).min(255) as u8;
        aux[3] = 0;
        aux[4] = self.status.clt;
        aux[5] = 0;
        aux[6] = self.status.tps;
        aux[7] = 0;

        for (i, byte) in aux.iter_mut().enumerate().skip(8) {
            *byte = (i as u32 * 7).wrapping_add(self.loop_counter) as u8;
        }
    }
}
