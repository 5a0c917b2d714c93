// src/strategy/traits.rs

use crate::model::patient::Need;
use crate::model::tier::{CareTier, PerTier};
use crate::simulation::config::NeedChances;
use rand_chacha::ChaCha8Rng;
use std::fmt::Debug;

/// Random stream owned by one replication.
pub type SimRng = ChaCha8Rng;

/// Decides how many births happen on a day and what each of them needs.
///
/// We require `Debug` so a replication can be printed when it fails.
pub trait ArrivalModel: Debug {
    /// Returns the need flags of every patient born on `day`.
    ///
    /// # Arguments
    /// * `day` - Simulated day of the batch, starting at 0.
    /// * `chances` - Initial need probabilities, drawn NICU first.
    /// * `rng` - The replication's random stream.
    fn births(&mut self, day: u64, chances: &NeedChances, rng: &mut SimRng) -> Vec<PerTier<Need>>;
}

/// Decides how long a patient occupies a cot.
pub trait StayModel: Debug {
    /// Whole days spent in `tier`. Zero-length stays are allowed.
    ///
    /// # Arguments
    /// * `tier` - The tier actually occupied.
    /// * `mean_days` - Configured mean stay of that tier.
    /// * `rng` - The replication's random stream.
    fn stay_days(&mut self, tier: CareTier, mean_days: f64, rng: &mut SimRng) -> u64;
}
