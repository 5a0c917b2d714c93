// src/model/patient.rs

use crate::model::queues::PatientId;
use crate::model::tier::{CareTier, PerTier};
use rand::Rng;
use serde::Serialize;

/// One need flag and the uniform draw that raised it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Need {
    pub active: bool,
    /// Draw that set the flag most recently. Zero until the flag is first raised.
    pub draw: f64,
}

/// Rolls one need flag: a uniform draw below `probability` raises it.
/// Returns whether the tier is needed afterwards.
pub fn determine_need<R: Rng + ?Sized>(
    needs: &mut PerTier<Need>,
    tier: CareTier,
    probability: f64,
    rng: &mut R,
) -> bool {
    let draw: f64 = rng.gen();
    if draw < probability {
        needs[tier] = Need { active: true, draw };
    }
    needs[tier].active
}

/// A birth that may require neonatal care.
#[derive(Debug, Clone, PartialEq)]
pub struct Patient {
    pub id: PatientId,
    pub arrival_day: u64,
    pub needs: PerTier<Need>,
    /// Total days spent waiting for a cot across all stays.
    pub queue_wait: u64,
}

impl Patient {
    pub fn new(id: PatientId, arrival_day: u64) -> Self {
        Self {
            id,
            arrival_day,
            needs: PerTier::default(),
            queue_wait: 0,
        }
    }

    /// Creates a patient whose flags are already decided.
    pub fn with_needs(id: PatientId, arrival_day: u64, needs: &[CareTier]) -> Self {
        let mut patient = Self::new(id, arrival_day);
        for tier in needs {
            patient.needs[*tier].active = true;
        }
        patient
    }

    pub fn needs(&self, tier: CareTier) -> bool {
        self.needs[tier].active
    }

    pub fn needs_any(&self) -> bool {
        CareTier::ALL.iter().any(|tier| self.needs(*tier))
    }

    /// The most severe tier still needed.
    pub fn most_severe_need(&self) -> Option<CareTier> {
        CareTier::ALL.into_iter().find(|tier| self.needs(*tier))
    }

    pub fn clear_need(&mut self, tier: CareTier) {
        self.needs[tier].active = false;
    }

    /// Draws uniformly from [0, 1) and raises the flag when the draw falls
    /// below `probability`. A flag that is already raised stays raised.
    ///
    /// Returns whether the tier is needed afterwards.
    pub fn determine_need<R: Rng + ?Sized>(
        &mut self,
        tier: CareTier,
        probability: f64,
        rng: &mut R,
    ) -> bool {
        determine_need(&mut self.needs, tier, probability, rng)
    }

    /// Walks an ordered list of follow-on chances, stopping at the first
    /// tier that ends up not needed.
    pub fn reassess<R: Rng + ?Sized>(&mut self, follow_on: &[(CareTier, f64)], rng: &mut R) {
        for (tier, probability) in follow_on {
            if !self.determine_need(*tier, *probability, rng) {
                break;
            }
        }
    }
}
