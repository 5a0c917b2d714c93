//! Discrete-event simulation of neonatal cot occupancy across three tiers
//! of care (NICU, HDCU, SCBU), for sizing unit capacity.

pub mod error;
pub mod io;
pub mod model;
pub mod simulation;
pub mod strategy;

pub use error::{ConfigError, PoolError, ReplicationError, SimulationError};
pub use model::tier::{CareTier, PerTier};
pub use simulation::config::{ReassessmentBasis, SimulationConfig};
pub use simulation::engine::{CareUnitSimulation, RunResult, StayRecord};
pub use simulation::monitor::Sample;
pub use simulation::orchestrator::{BatchResult, RunOrchestrator, RunOutcome};
