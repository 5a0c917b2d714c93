// src/simulation/config.rs

use crate::error::ConfigError;
use crate::model::tier::{CareTier, PerTier};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Chances of needing each tier, at birth and after leaving another tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeedChances {
    pub nicu: f64,
    pub hdcu: f64,
    pub scbu: f64,
    pub hdcu_after_nicu: f64,
    pub scbu_after_nicu: f64,
    pub nicu_after_hdcu: f64,
    pub scbu_after_hdcu: f64,
    pub nicu_after_scbu: f64,
    pub hdcu_after_scbu: f64,
}

impl NeedChances {
    pub fn initial(&self) -> PerTier<f64> {
        PerTier::new(self.nicu, self.hdcu, self.scbu)
    }

    /// Follow-on chances evaluated after leaving `tier`, in evaluation order.
    pub fn after(&self, tier: CareTier) -> [(CareTier, f64); 2] {
        match tier {
            CareTier::Nicu => [
                (CareTier::Hdcu, self.hdcu_after_nicu),
                (CareTier::Scbu, self.scbu_after_nicu),
            ],
            CareTier::Hdcu => [
                (CareTier::Nicu, self.nicu_after_hdcu),
                (CareTier::Scbu, self.scbu_after_hdcu),
            ],
            CareTier::Scbu => [
                (CareTier::Nicu, self.nicu_after_scbu),
                (CareTier::Hdcu, self.hdcu_after_scbu),
            ],
        }
    }

    fn named(&self) -> [(&'static str, f64); 9] {
        [
            ("nicu", self.nicu),
            ("hdcu", self.hdcu),
            ("scbu", self.scbu),
            ("hdcu_after_nicu", self.hdcu_after_nicu),
            ("scbu_after_nicu", self.scbu_after_nicu),
            ("nicu_after_hdcu", self.nicu_after_hdcu),
            ("scbu_after_hdcu", self.scbu_after_hdcu),
            ("nicu_after_scbu", self.nicu_after_scbu),
            ("hdcu_after_scbu", self.hdcu_after_scbu),
        ]
    }
}

impl Default for NeedChances {
    // Illustrative planning figures; override per unit.
    fn default() -> Self {
        Self {
            nicu: 0.02,
            hdcu: 0.03,
            scbu: 0.08,
            hdcu_after_nicu: 0.5,
            scbu_after_nicu: 0.4,
            nicu_after_hdcu: 0.05,
            scbu_after_hdcu: 0.5,
            nicu_after_scbu: 0.01,
            hdcu_after_scbu: 0.05,
        }
    }
}

/// Which follow-on chances apply after a stay.
///
/// Only differs from one variant to the next when a patient was admitted to
/// a fallback tier instead of the tier it needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReassessmentBasis {
    /// Chances of the tier the patient needed, whatever tier it occupied.
    #[default]
    NeededTier,
    /// Chances of the tier the patient actually occupied.
    OccupiedTier,
    /// No follow-on needs after a fallback stay.
    SkipOnSubstitution,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Replications to run.
    pub runs: u32,
    /// Days excluded from sampling at the start of each run.
    pub warm_up_days: u64,
    pub duration_days: u64,
    /// Base seed; run `n` uses `seed + n`.
    pub seed: u64,
    /// Mean births per day.
    pub daily_births: f64,
    /// When set, takes precedence over `daily_births` as `annual / 365`
    /// (two decimals). Read the effective rate through `daily_birth_rate`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual_births: Option<f64>,
    pub reassessment: ReassessmentBasis,
    pub cots: PerTier<u32>,
    /// Mean length of stay in days.
    pub mean_stay: PerTier<f64>,
    pub chances: NeedChances,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            runs: 50,
            warm_up_days: 100,
            duration_days: 300,
            seed: 42,
            daily_births: daily_rate_from_annual(3000.0),
            annual_births: None,
            reassessment: ReassessmentBasis::default(),
            cots: PerTier::new(3, 3, 12),
            mean_stay: PerTier::new(12.67, 12.69, 8.75),
            chances: NeedChances::default(),
        }
    }
}

/// Converts a yearly birth count to a mean daily rate, rounded to cents.
pub fn daily_rate_from_annual(annual: f64) -> f64 {
    (annual / 365.0 * 100.0).round() / 100.0
}

impl SimulationConfig {
    /// Parses a TOML parameter file. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Mean births per day actually used by a run.
    pub fn daily_birth_rate(&self) -> f64 {
        match self.annual_births {
            Some(annual) => daily_rate_from_annual(annual),
            None => self.daily_births,
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Checks every parameter range. Run before any replication starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.runs == 0 {
            return Err(ConfigError::NoReplications);
        }
        let births = self.daily_birth_rate();
        if !(births.is_finite() && births > 0.0) {
            return Err(ConfigError::NonPositiveBirthRate(births));
        }
        for (tier, cots) in self.cots.iter() {
            if *cots < 1 {
                return Err(ConfigError::CapacityTooSmall { tier });
            }
        }
        for (tier, stay) in self.mean_stay.iter() {
            if !(stay.is_finite() && *stay > 0.0) {
                return Err(ConfigError::NonPositiveStay { tier, value: *stay });
            }
        }
        for (name, value) in self.chances.named() {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ProbabilityOutOfRange {
                    name: name.to_string(),
                    value,
                });
            }
        }
        Ok(())
    }
}
