//! Properties that must hold for any seed and any valid configuration.

use nccu_sim::io::reporting::write_rows;
use nccu_sim::strategy::implementations::{ExponentialStay, ScriptedArrivals};
use nccu_sim::{CareTier, CareUnitSimulation, PerTier, RunOrchestrator, SimulationConfig};
use proptest::prelude::*;

fn busy_config(seed: u64) -> SimulationConfig {
    SimulationConfig {
        runs: 1,
        warm_up_days: 20,
        duration_days: 120,
        seed,
        daily_births: 6.0,
        cots: PerTier::new(2, 2, 4),
        ..SimulationConfig::default()
    }
}

#[test]
fn test_same_seed_gives_identical_output() {
    let first = CareUnitSimulation::new(busy_config(99), 1).run().unwrap();
    let second = CareUnitSimulation::new(busy_config(99), 1).run().unwrap();

    assert_eq!(first.samples, second.samples);
    assert_eq!(first.stays, second.stays);

    let mut a: Vec<u8> = Vec::new();
    let mut b: Vec<u8> = Vec::new();
    write_rows(&mut a, &first.samples).unwrap();
    write_rows(&mut b, &second.samples).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_orchestrated_batches_are_reproducible() {
    let mut params = busy_config(5);
    params.runs = 6;
    let one = RunOrchestrator::new(params.clone()).unwrap().run();
    let two = RunOrchestrator::new(params).unwrap().run();
    assert_eq!(one.samples, two.samples);
    assert_eq!(one.completed, vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn test_every_cot_is_eventually_released() {
    let mut params = busy_config(17);
    params.warm_up_days = 0;
    params.duration_days = 400;
    params.mean_stay = PerTier::new(3.0, 3.0, 2.0);

    let mut arrivals = ScriptedArrivals::new();
    for day in 0..10 {
        arrivals = arrivals
            .on_day(day, &[CareTier::Nicu])
            .on_day(day, &[CareTier::Hdcu])
            .on_day(day, &[CareTier::Scbu, CareTier::Hdcu]);
    }
    let result =
        CareUnitSimulation::with_models(params, 1, Box::new(arrivals), Box::new(ExponentialStay))
            .run()
            .unwrap();

    assert_eq!(result.births, 30);
    assert_eq!(result.discharged, 30);
    assert_eq!(result.in_care_at_end, 0);
    for stay in &result.stays {
        assert!(stay.admitted_day >= stay.requested_day);
        assert!(stay.left_day >= stay.admitted_day);
    }
    let last_day: Vec<_> = result.samples.iter().filter(|s| s.day == 400).collect();
    assert_eq!(last_day.len(), 3);
    assert!(last_day.iter().all(|s| s.daily_use == 0 && s.queue_length == 0));
}

#[test]
fn test_overloaded_unit_places_babies_in_higher_tiers() {
    let mut params = busy_config(3);
    params.daily_births = 30.0;
    params.cots = PerTier::new(4, 2, 2);
    let result = CareUnitSimulation::new(params, 1).run().unwrap();

    assert!(result.stays.iter().any(|s| s.is_substitution()));
    for stay in result.stays.iter().filter(|s| s.is_substitution()) {
        // Fallback only ever goes up in severity.
        assert!(stay.occupied < stay.needed);
    }
    assert!(result.samples.iter().any(|s| s.queue_length > 0));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn samples_stay_within_capacity(
        seed in any::<u64>(),
        nicu in 1u32..4,
        hdcu in 1u32..4,
        scbu in 1u32..6,
        births in 1.0f64..20.0,
        warm_up in 0u64..30,
    ) {
        let params = SimulationConfig {
            runs: 1,
            warm_up_days: warm_up,
            duration_days: 60,
            seed,
            daily_births: births,
            cots: PerTier::new(nicu, hdcu, scbu),
            ..SimulationConfig::default()
        };
        let result = CareUnitSimulation::new(params, 1).run().unwrap();

        prop_assert_eq!(result.samples.len() as u64, (60 - warm_up) * 3);
        for sample in &result.samples {
            prop_assert!(sample.day > warm_up);
            prop_assert!(sample.daily_use <= sample.total_capacity);
            prop_assert_eq!(sample.available_capacity, sample.total_capacity - sample.daily_use);
            if sample.queue_length > 0 {
                prop_assert_eq!(sample.available_capacity, 0);
            }
        }
    }
}
