// src/strategy/implementations.rs

use crate::model::patient::{determine_need, Need, Patient};
use crate::model::tier::{CareTier, PerTier};
use crate::simulation::config::NeedChances;
use crate::strategy::traits::{ArrivalModel, SimRng, StayModel};
use rand_distr::{Distribution, Exp1};
use std::collections::BTreeMap;

/// Rounds an exponential sample with the given mean to whole days.
///
/// Negative or non-finite means yield zero.
pub fn rounded_exponential(mean: f64, rng: &mut SimRng) -> u64 {
    let unit: f64 = Exp1.sample(rng);
    let value = (unit * mean).round();
    if value.is_finite() && value > 0.0 {
        value as u64
    } else {
        0
    }
}

// =========================================================================
// 1. Exponential Births
// =========================================================================

/// Daily birth count drawn as a rounded exponential with the configured
/// mean. Each birth rolls its three needs independently.
#[derive(Debug, Clone)]
pub struct ExponentialBirths {
    daily_mean: f64,
}

impl ExponentialBirths {
    pub fn new(daily_mean: f64) -> Self {
        Self { daily_mean }
    }
}

impl ArrivalModel for ExponentialBirths {
    fn births(&mut self, _day: u64, chances: &NeedChances, rng: &mut SimRng) -> Vec<PerTier<Need>> {
        let count = rounded_exponential(self.daily_mean, rng);
        let initial = chances.initial();

        (0..count)
            .map(|_| {
                let mut needs = PerTier::<Need>::default();
                for (tier, probability) in initial.iter() {
                    determine_need(&mut needs, tier, *probability, rng);
                }
                needs
            })
            .collect()
    }
}

// =========================================================================
// 2. Scripted Arrivals
// =========================================================================

/// A fixed timetable of births. Used for what-if cases and for checking
/// the engine against hand-worked scenarios.
#[derive(Debug, Clone, Default)]
pub struct ScriptedArrivals {
    by_day: BTreeMap<u64, Vec<Vec<CareTier>>>,
}

impl ScriptedArrivals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one birth on `day` needing every tier in `needs`.
    pub fn on_day(mut self, day: u64, needs: &[CareTier]) -> Self {
        self.by_day.entry(day).or_default().push(needs.to_vec());
        self
    }
}

impl ArrivalModel for ScriptedArrivals {
    fn births(&mut self, day: u64, _chances: &NeedChances, _rng: &mut SimRng) -> Vec<PerTier<Need>> {
        self.by_day
            .remove(&day)
            .unwrap_or_default()
            .into_iter()
            .map(|needs| Patient::with_needs(0, day, &needs).needs)
            .collect()
    }
}

// =========================================================================
// 3. Exponential Stay
// =========================================================================

/// Rounded exponential length of stay with the tier's configured mean.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExponentialStay;

impl StayModel for ExponentialStay {
    fn stay_days(&mut self, _tier: CareTier, mean_days: f64, rng: &mut SimRng) -> u64 {
        rounded_exponential(mean_days, rng)
    }
}

// =========================================================================
// 4. Fixed Stay
// =========================================================================

/// Every stay in a tier lasts exactly the given number of days.
#[derive(Debug, Clone, Copy)]
pub struct FixedStay {
    days: PerTier<u64>,
}

impl FixedStay {
    pub fn new(days: PerTier<u64>) -> Self {
        Self { days }
    }

    pub fn uniform(days: u64) -> Self {
        Self::new(PerTier::new(days, days, days))
    }
}

impl StayModel for FixedStay {
    fn stay_days(&mut self, tier: CareTier, _mean_days: f64, _rng: &mut SimRng) -> u64 {
        self.days[tier]
    }
}
