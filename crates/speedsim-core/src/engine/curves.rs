//! Calibration curves and interpolation helpers
//!
//! Pure integer functions of their inputs. All results are clamped to their
//! documented ranges; intermediate math is done in `i32`/`u32` so nothing can
//! overflow for any input.

use super::constants::*;
use crate::ecu::EngineMode;

/// Step `current` toward `target` by `rate_pct` percent of the gap.
///
/// Moves at least one unit when the gap is non-zero, so the target is always
/// reached eventually.
pub fn interpolate(current: i16, target: i16, rate_pct: u8) -> i16 {
    let delta = i32::from(target) - i32::from(current);
    let mut step = delta * i32::from(rate_pct) / 100;
    if step == 0 && delta != 0 {
        step = delta.signum();
    }
    (i32::from(current) + step).clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}

/// Linear re-mapping of `x` from one range onto another (truncating)
pub fn map_value(x: i32, in_min: i32, in_max: i32, out_min: i32, out_max: i32) -> i32 {
    if in_max == in_min {
        return out_min;
    }
    (x - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}

/// Volumetric efficiency (%) for the given speed and throttle
pub fn volumetric_efficiency(rpm: u16, tps: u8) -> u8 {
    let rpm = i32::from(rpm);
    let base = if rpm < 1000 {
        45
    } else if rpm < 2000 {
        55 + (rpm - 1000) / 50
    } else if rpm < 4000 {
        75 + (rpm - 2000) / 200
    } else if rpm < 5500 {
        85 + (rpm - 4000) / 200
    } else {
        90 - (rpm - 5500) / 100
    };

    // Part throttle restricts the air charge
    let scaled = base * (50 + i32::from(tps) / 2) / 100;
    scaled.clamp(i32::from(VE_MIN), i32::from(VE_MAX)) as u8
}

/// Ignition advance (degrees BTDC) for the given speed and load (% of atmospheric)
pub fn ignition_advance(rpm: u16, load: u8) -> u8 {
    let rpm = i32::from(rpm);
    let load = i32::from(load);
    let mut advance = i32::from(TIMING_IDLE);

    if rpm > 1000 {
        advance += (rpm - 1000) / 200;
    }

    if load > 80 {
        // Pull timing under heavy load to stay out of knock
        advance -= (load - 80) / 4;
    } else if load < 40 {
        advance += (40 - load) / 8;
    }

    advance.clamp(i32::from(TIMING_MIN), i32::from(TIMING_MAX)) as u8
}

/// Base injector pulse width (0.1 ms) before enrichment and corrections
pub fn required_pulse_width(rpm: u16, map: u16, ve: u8) -> u16 {
    let mut pw = u32::from(map) * u32::from(ve) * 1000;
    pw /= u32::from(rpm) + 1;
    pw /= 10;
    pw.clamp(u32::from(PW_MIN), u32::from(PW_MAX)) as u16
}

/// Warm-up enrichment (%) by coolant temperature (°C × 10)
pub fn warmup_enrichment(coolant_temp: i16) -> u8 {
    match coolant_temp / 10 {
        t if t < 0 => 140,
        t if t < 20 => 130,
        t if t < 40 => 120,
        t if t < 60 => 110,
        _ => 100,
    }
}

/// Intake air temperature correction (%) by intake temperature (°C × 10)
pub fn iat_correction(intake_temp: i16) -> u8 {
    match intake_temp / 10 {
        t if t < 0 => 110,
        t if t < 10 => 105,
        _ => 100,
    }
}

/// Target AFR (0.1 AFR) for the operating mode
pub fn target_afr(mode: EngineMode) -> u8 {
    match mode {
        EngineMode::Startup | EngineMode::WarmupIdle => AFR_RICH,
        EngineMode::WideOpenThrottle | EngineMode::Acceleration => AFR_WOT,
        EngineMode::Deceleration => AFR_LEAN,
        _ => AFR_STOICH,
    }
}

/// Narrowband-style O2 reading: lambda 0.5-1.5 mapped onto 0-255
pub fn afr_to_o2(afr: u8) -> u8 {
    let lambda = i32::from(afr) * 100 / i32::from(AFR_STOICH);
    map_value(lambda, 50, 150, 0, 255).clamp(0, 255) as u8
}

/// Injector duty cycle (%) for a four-stroke engine, one injection per cycle
pub fn injector_duty(pulse_width: u16, rpm: u16) -> u8 {
    let duty = u32::from(pulse_width) * u32::from(rpm) / 12_000;
    duty.min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolate_moves_fraction_of_gap() {
        assert_eq!(interpolate(200, 800, 5), 230);
        assert_eq!(interpolate(800, 200, 10), 740);
    }

    #[test]
    fn test_interpolate_minimum_step() {
        assert_eq!(interpolate(795, 800, 5), 796);
        assert_eq!(interpolate(801, 800, 5), 800);
        assert_eq!(interpolate(800, 800, 5), 800);
    }

    #[test]
    fn test_map_value() {
        assert_eq!(map_value(10, 10, 80, 45, 90), 45);
        assert_eq!(map_value(80, 10, 80, 45, 90), 90);
        assert_eq!(map_value(45, 10, 80, 45, 90), 67);
        assert_eq!(map_value(5, 5, 5, 1, 2), 1);
    }

    #[test]
    fn test_ve_bounds() {
        for rpm in (0..=RPM_MAX).step_by(50) {
            for tps in [0u8, 2, 20, 50, 80, 100] {
                let ve = volumetric_efficiency(rpm, tps);
                assert!((VE_MIN..=VE_MAX).contains(&ve), "VE {} at {} rpm {}%", ve, rpm, tps);
            }
        }
    }

    #[test]
    fn test_ve_peaks_in_mid_range() {
        let peak = volumetric_efficiency(5000, 100);
        assert!(peak > volumetric_efficiency(1500, 100));
        assert!(peak > volumetric_efficiency(3000, 100));
        assert!(peak > volumetric_efficiency(6800, 100));
    }

    #[test]
    fn test_ve_scales_with_throttle() {
        assert!(volumetric_efficiency(3000, 100) > volumetric_efficiency(3000, 10));
    }

    #[test]
    fn test_ignition_advance() {
        assert_eq!(ignition_advance(800, 35), 15);
        assert_eq!(ignition_advance(3000, 60), 25);
        // light load adds advance
        assert_eq!(ignition_advance(3000, 0), 30);
        // heavy load pulls advance
        assert_eq!(ignition_advance(3000, 100), 20);
        assert_eq!(ignition_advance(7000, 0), TIMING_MAX);
    }

    #[test]
    fn test_pulse_width_clamped() {
        assert_eq!(required_pulse_width(0, 100, 100), PW_MAX);
        assert_eq!(required_pulse_width(7000, 20, 30), PW_MIN);
        // 35 kPa, VE 40 at 700 rpm
        assert_eq!(required_pulse_width(700, 35, 40), 199);
    }

    #[test]
    fn test_warmup_enrichment_bands() {
        assert_eq!(warmup_enrichment(-100), 140);
        assert_eq!(warmup_enrichment(TEMP_AMBIENT - 10), 130);
        assert_eq!(warmup_enrichment(TEMP_AMBIENT), 120);
        assert_eq!(warmup_enrichment(TEMP_ENGINE_COLD), 110);
        assert_eq!(warmup_enrichment(TEMP_ENGINE_WARM), 100);
    }

    #[test]
    fn test_iat_correction_bands() {
        assert_eq!(iat_correction(-100), 110);
        assert_eq!(iat_correction(50), 105);
        assert_eq!(iat_correction(TEMP_AMBIENT), 100);
    }

    #[test]
    fn test_afr_targets() {
        assert_eq!(target_afr(EngineMode::WarmupIdle), AFR_RICH);
        assert_eq!(target_afr(EngineMode::Acceleration), AFR_WOT);
        assert_eq!(target_afr(EngineMode::Deceleration), AFR_LEAN);
        assert_eq!(target_afr(EngineMode::LightLoad), AFR_STOICH);
    }

    #[test]
    fn test_o2_mapping() {
        assert_eq!(afr_to_o2(AFR_STOICH), 127);
        assert!(afr_to_o2(AFR_LEAN) > afr_to_o2(AFR_STOICH));
        assert!(afr_to_o2(AFR_WOT) < afr_to_o2(AFR_STOICH));
    }

    #[test]
    fn test_injector_duty() {
        assert_eq!(injector_duty(30, 6000), 15);
        assert_eq!(injector_duty(255, 7000), 100);
        assert_eq!(injector_duty(100, 0), 0);
    }
}
