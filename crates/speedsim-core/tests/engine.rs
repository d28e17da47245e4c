//! Tests for the engine simulation

#[cfg(test)]
mod tests {
    use speedsim_core::ecu::EngineMode;
    use speedsim_core::engine::constants::*;
    use speedsim_core::engine::EngineSimulator;
    use speedsim_core::platform::{ManualClock, RandomProvider, SeededRandom};

    fn seeded(seed: u32) -> (ManualClock, EngineSimulator<ManualClock, SeededRandom>) {
        let clock = ManualClock::new(0);
        let mut sim = EngineSimulator::new(clock.clone(), SeededRandom::new(seed));
        sim.initialize();
        (clock, sim)
    }

    fn step<R: RandomProvider>(clock: &ManualClock, sim: &mut EngineSimulator<ManualClock, R>) {
        clock.advance(UPDATE_INTERVAL_MS);
        assert!(sim.tick());
    }

    #[test]
    fn test_outputs_stay_in_range() {
        for seed in [1, 42, 1234, 98765] {
            let (clock, mut sim) = seeded(seed);

            // Ten simulated minutes
            for _ in 0..12_000 {
                step(&clock, &mut sim);
                let s = sim.status();

                assert!(s.rpm() <= RPM_MAX, "rpm {}", s.rpm());
                assert!((MAP_MIN..=MAP_ATMOSPHERIC).contains(&s.map()), "map {}", s.map());
                assert!(s.tps <= TPS_WOT);
                assert!((VE_MIN..=VE_MAX).contains(&s.ve), "ve {}", s.ve);
                assert!((PW_MIN..=PW_MAX).contains(&s.pulse_width()));
                assert!((TIMING_MIN..=TIMING_MAX).contains(&s.advance));
                assert!((EGO_MIN..=EGO_MAX).contains(&s.ego_correction));
                assert!((-40..=110).contains(&s.coolant_temp()), "clt {}", s.coolant_temp());
                assert!((VOLTAGE_CRANKING - 1..=VOLTAGE_CHARGING + 1).contains(&s.battery_v));
                assert!([DWELL_NORMAL, DWELL_LOW_VOLTAGE].contains(&s.dwell));
                assert!([AFR_STOICH, AFR_RICH, AFR_LEAN, AFR_WOT].contains(&s.afr_target));
                assert!(s.errors <= 3);
                assert!(sim.injector_duty() <= 100);
            }
        }
    }

    #[test]
    fn test_rapid_tick_changes_nothing() {
        let (clock, mut sim) = seeded(7);
        for _ in 0..50 {
            step(&clock, &mut sim);
        }

        let before = sim.status().encode();
        let mode = sim.mode();
        let ticks = sim.tick_count();

        clock.advance(UPDATE_INTERVAL_MS - 1);
        assert!(!sim.tick());
        assert!(!sim.tick());

        assert_eq!(sim.status().encode(), before);
        assert_eq!(sim.mode(), mode);
        assert_eq!(sim.tick_count(), ticks);
    }

    #[test]
    fn test_cold_start_sequence() {
        for seed in [3, 17, 2024] {
            let (clock, mut sim) = seeded(seed);
            let mut modes = vec![sim.mode()];

            for _ in 0..400 {
                step(&clock, &mut sim);
                if modes.last() != Some(&sim.mode()) {
                    modes.push(sim.mode());
                }
            }

            assert!(modes.len() >= 3, "modes {:?}", modes);
            assert_eq!(
                &modes[..3],
                &[EngineMode::Startup, EngineMode::WarmupIdle, EngineMode::Idle]
            );
        }
    }

    #[test]
    fn test_reaches_idle_quickly() {
        let (clock, mut sim) = seeded(5);
        let mut ticks = 0;
        while sim.mode() != EngineMode::Idle {
            step(&clock, &mut sim);
            ticks += 1;
            assert!(ticks < 200, "still in {} after {} ticks", sim.mode(), ticks);
        }
    }

    #[test]
    fn test_coolant_rises_monotonically_through_warm_up() {
        for seed in 1..=40 {
            let (clock, mut sim) = seeded(seed);
            let mut last = sim.status().clt;

            // Every tick that lands inside the warm-up window
            for _ in 1..WARMUP_TIME_MS / UPDATE_INTERVAL_MS {
                step(&clock, &mut sim);
                let clt = sim.status().clt;
                assert!(
                    clt >= last,
                    "seed {}: coolant fell from {} to {} in {} at tick {}",
                    seed,
                    last,
                    clt,
                    sim.mode(),
                    sim.tick_count()
                );
                last = clt;
            }

            assert!(sim.status().coolant_temp() > TEMP_WARMUP_DONE / 10);
        }
    }

    #[test]
    fn test_wot_map_exceeds_idle_map() {
        let (clock, mut sim) = seeded(11);

        while sim.mode() != EngineMode::Idle {
            step(&clock, &mut sim);
        }
        for _ in 0..40 {
            step(&clock, &mut sim);
        }
        assert_eq!(sim.mode(), EngineMode::Idle);
        let idle_map = sim.status().map();

        sim.set_mode(EngineMode::WideOpenThrottle);
        for _ in 0..40 {
            step(&clock, &mut sim);
        }
        assert_eq!(sim.mode(), EngineMode::WideOpenThrottle);
        let wot_map = sim.status().map();

        assert!(wot_map > idle_map, "WOT {} kPa vs idle {} kPa", wot_map, idle_map);
    }

    #[test]
    fn test_same_seed_same_trace() {
        let (clock_a, mut a) = seeded(314);
        let (clock_b, mut b) = seeded(314);

        for _ in 0..1000 {
            step(&clock_a, &mut a);
            step(&clock_b, &mut b);
            assert_eq!(a.status(), b.status());
            assert_eq!(a.mode(), b.mode());
        }
    }

    #[test]
    fn test_high_rpm_override_winds_down_to_idle() {
        let (clock, mut sim) = seeded(8);
        sim.set_mode(EngineMode::HighRpm);

        let mut seen = vec![EngineMode::HighRpm];
        for _ in 0..2000 {
            step(&clock, &mut sim);
            if seen.last() != Some(&sim.mode()) {
                seen.push(sim.mode());
            }
            if sim.mode() == EngineMode::Idle {
                break;
            }
        }

        assert_eq!(
            &seen[..3],
            &[EngineMode::HighRpm, EngineMode::Deceleration, EngineMode::Idle]
        );
    }

    #[test]
    fn test_status_flags_track_running_engine() {
        let (clock, mut sim) = seeded(2);
        step(&clock, &mut sim);
        // Cranking and already turning
        assert_eq!(sim.status().engine, 0x03);

        while sim.mode() != EngineMode::Idle {
            step(&clock, &mut sim);
        }
        step(&clock, &mut sim);
        assert_eq!(sim.status().engine & 0x01, 0);
        assert_eq!(sim.status().status1, 0x03);
    }

    #[test]
    fn test_exhaust_heats_with_engine() {
        let (clock, mut sim) = seeded(9);
        let cold = sim.exhaust_temp();
        for _ in 0..400 {
            step(&clock, &mut sim);
        }
        assert!(sim.exhaust_temp() > cold + 1000);
    }

    #[test]
    fn test_runtime_and_seconds_counter() {
        let (clock, mut sim) = seeded(1);
        for _ in 0..TICKS_PER_SECOND * 12 {
            step(&clock, &mut sim);
        }
        assert_eq!(sim.runtime_seconds(), 12);
        assert_eq!(sim.status().secl, 12);
    }
}
