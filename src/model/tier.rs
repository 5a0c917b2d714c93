// src/model/tier.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// The three levels of neonatal care, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CareTier {
    /// Neonatal intensive care.
    #[serde(rename = "NICU")]
    Nicu,
    /// High dependency care.
    #[serde(rename = "HDCU")]
    Hdcu,
    /// Special care baby unit.
    #[serde(rename = "SCBU")]
    Scbu,
}

impl CareTier {
    /// Every tier in severity order. Monitors and reports iterate in this order.
    pub const ALL: [CareTier; 3] = [CareTier::Nicu, CareTier::Hdcu, CareTier::Scbu];

    pub fn name(self) -> &'static str {
        match self {
            CareTier::Nicu => "NICU",
            CareTier::Hdcu => "HDCU",
            CareTier::Scbu => "SCBU",
        }
    }

    /// The tiers a patient needing `self` competes for, with the priority
    /// each request is filed under. The needed tier always comes first.
    ///
    /// NICU has nothing above it, so it is never raced.
    pub fn admission_candidates(self) -> &'static [(CareTier, u8)] {
        match self {
            CareTier::Nicu => &[(CareTier::Nicu, 0)],
            CareTier::Hdcu => &[(CareTier::Hdcu, 0), (CareTier::Nicu, 1)],
            CareTier::Scbu => &[(CareTier::Scbu, 0), (CareTier::Hdcu, 1), (CareTier::Nicu, 2)],
        }
    }
}

impl fmt::Display for CareTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One value per care tier.
///
/// Used for capacities, mean stays, initial need probabilities and the
/// pools themselves, so lookups by tier never go through a map.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PerTier<T> {
    pub nicu: T,
    pub hdcu: T,
    pub scbu: T,
}

impl<T> PerTier<T> {
    pub fn new(nicu: T, hdcu: T, scbu: T) -> Self {
        Self { nicu, hdcu, scbu }
    }

    /// Builds a value for every tier from a constructor.
    pub fn from_fn(mut f: impl FnMut(CareTier) -> T) -> Self {
        Self {
            nicu: f(CareTier::Nicu),
            hdcu: f(CareTier::Hdcu),
            scbu: f(CareTier::Scbu),
        }
    }

    pub fn get(&self, tier: CareTier) -> &T {
        match tier {
            CareTier::Nicu => &self.nicu,
            CareTier::Hdcu => &self.hdcu,
            CareTier::Scbu => &self.scbu,
        }
    }

    pub fn get_mut(&mut self, tier: CareTier) -> &mut T {
        match tier {
            CareTier::Nicu => &mut self.nicu,
            CareTier::Hdcu => &mut self.hdcu,
            CareTier::Scbu => &mut self.scbu,
        }
    }

    /// Iterates `(tier, value)` in severity order.
    pub fn iter(&self) -> impl Iterator<Item = (CareTier, &T)> {
        CareTier::ALL.into_iter().map(move |tier| (tier, self.get(tier)))
    }
}

impl<T> std::ops::Index<CareTier> for PerTier<T> {
    type Output = T;

    fn index(&self, tier: CareTier) -> &T {
        self.get(tier)
    }
}

impl<T> std::ops::IndexMut<CareTier> for PerTier<T> {
    fn index_mut(&mut self, tier: CareTier) -> &mut T {
        self.get_mut(tier)
    }
}
