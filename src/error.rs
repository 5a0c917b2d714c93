// src/error.rs

use crate::model::queues::RequestId;
use crate::model::tier::CareTier;
use thiserror::Error;

/// Rejected configuration. Raised before any replication starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("probability `{name}` must be within [0, 1], got {value}")]
    ProbabilityOutOfRange { name: String, value: f64 },

    #[error("{tier} capacity must be at least 1 cot")]
    CapacityTooSmall { tier: CareTier },

    #[error("{tier} mean stay must be a positive number of days, got {value}")]
    NonPositiveStay { tier: CareTier, value: f64 },

    #[error("daily birth rate must be positive, got {0}")]
    NonPositiveBirthRate(f64),

    #[error("at least one replication is required")]
    NoReplications,

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid parameter file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Misuse of a single resource pool.
#[derive(Debug, Error, PartialEq)]
pub enum PoolError {
    #[error("request {0} is not known to the {1} pool")]
    UnknownRequest(RequestId, CareTier),

    #[error("request {0} was already granted and cannot be cancelled")]
    CancelGranted(RequestId),

    #[error("request {0} is still waiting and cannot be released")]
    ReleasePending(RequestId),
}

/// Internal failure inside one replication. Always fatal for that replication.
#[derive(Debug, Error, PartialEq)]
pub enum SimulationError {
    #[error("race inconsistency: request {request} granted to patient {patient} after its race was settled")]
    RaceInconsistency { patient: u64, request: RequestId },

    #[error("event refers to unknown patient {0}")]
    UnknownPatient(u64),

    #[error("patient {patient} received {event} while {state}")]
    UnexpectedEvent {
        patient: u64,
        event: &'static str,
        state: &'static str,
    },

    #[error(transparent)]
    Pool(#[from] PoolError),
}

/// A replication that did not complete, as recorded by the orchestrator.
#[derive(Debug, Error)]
pub enum ReplicationError {
    #[error("run {run} failed: {source}")]
    Failed {
        run: u32,
        #[source]
        source: SimulationError,
    },

    #[error("run {run} panicked: {message}")]
    Panicked { run: u32, message: String },
}

impl ReplicationError {
    pub fn run(&self) -> u32 {
        match self {
            ReplicationError::Failed { run, .. } | ReplicationError::Panicked { run, .. } => *run,
        }
    }
}
