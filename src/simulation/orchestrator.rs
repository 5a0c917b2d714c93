// src/simulation/orchestrator.rs

use crate::error::{ConfigError, ReplicationError, SimulationError};
use crate::simulation::config::SimulationConfig;
use crate::simulation::engine::{CareUnitSimulation, RunResult, StayRecord};
use crate::simulation::monitor::Sample;
use rayon::prelude::*;
use std::panic::{self, AssertUnwindSafe};
use tracing::{error, info};

/// How one replication ended.
#[derive(Debug)]
pub enum RunOutcome {
    Completed(RunResult),
    Failed(ReplicationError),
}

/// Concatenated output of every replication that completed.
#[derive(Debug, Default)]
pub struct BatchResult {
    pub samples: Vec<Sample>,
    pub stays: Vec<StayRecord>,
    pub completed: Vec<u32>,
    pub failures: Vec<ReplicationError>,
}

impl BatchResult {
    fn collect(outcomes: Vec<RunOutcome>) -> Self {
        let mut batch = BatchResult::default();
        for outcome in outcomes {
            match outcome {
                RunOutcome::Completed(result) => {
                    batch.completed.push(result.run_number);
                    batch.samples.extend(result.samples);
                    batch.stays.extend(result.stays);
                }
                RunOutcome::Failed(failure) => batch.failures.push(failure),
            }
        }
        batch
    }
}

/// Runs independent replications of the same configuration.
#[derive(Debug, Clone)]
pub struct RunOrchestrator {
    config: SimulationConfig,
    parallel: bool,
}

impl RunOrchestrator {
    /// Validates `config` up front; nothing runs if it is rejected.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            parallel: true,
        })
    }

    /// Runs replications one after another on the calling thread.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Runs every replication with the stochastic birth and stay models.
    pub fn run(&self) -> BatchResult {
        self.run_with(|config, run| CareUnitSimulation::new(config.clone(), run).run())
    }

    /// Runs every replication through `replicate`. Run numbers start at 1
    /// and the output is ordered by run number in both modes.
    pub fn run_with<F>(&self, replicate: F) -> BatchResult
    where
        F: Fn(&SimulationConfig, u32) -> Result<RunResult, SimulationError> + Sync,
    {
        let runs = 1..=self.config.runs;
        info!(runs = self.config.runs, parallel = self.parallel, "starting replications");

        let outcomes: Vec<RunOutcome> = if self.parallel {
            runs.into_par_iter()
                .map(|run| supervise(run, || replicate(&self.config, run)))
                .collect()
        } else {
            runs.map(|run| supervise(run, || replicate(&self.config, run)))
                .collect()
        };

        let batch = BatchResult::collect(outcomes);
        info!(
            completed = batch.completed.len(),
            failed = batch.failures.len(),
            samples = batch.samples.len(),
            "replications finished"
        );
        batch
    }
}

/// Runs one replication in isolation. Errors and panics become a failed
/// outcome instead of escaping.
pub fn supervise<F>(run: u32, replicate: F) -> RunOutcome
where
    F: FnOnce() -> Result<RunResult, SimulationError>,
{
    let outcome = match panic::catch_unwind(AssertUnwindSafe(replicate)) {
        Ok(Ok(result)) => return RunOutcome::Completed(result),
        Ok(Err(source)) => ReplicationError::Failed { run, source },
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            ReplicationError::Panicked { run, message }
        }
    };
    error!(run, error = %outcome, "replication excluded from results");
    RunOutcome::Failed(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::queues::RequestId;
    use crate::model::tier::CareTier;

    fn config(runs: u32) -> SimulationConfig {
        SimulationConfig {
            runs,
            warm_up_days: 5,
            duration_days: 30,
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn rejects_invalid_config_before_running() {
        let mut bad = config(3);
        bad.cots.nicu = 0;
        assert!(RunOrchestrator::new(bad).is_err());
    }

    #[test]
    fn every_run_contributes_its_samples() {
        let batch = RunOrchestrator::new(config(4)).unwrap().run();
        assert_eq!(batch.completed, vec![1, 2, 3, 4]);
        assert!(batch.failures.is_empty());
        // 25 sampled days x 3 tiers per run.
        assert_eq!(batch.samples.len(), 4 * 25 * 3);
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let parallel = RunOrchestrator::new(config(3)).unwrap().run();
        let sequential = RunOrchestrator::new(config(3)).unwrap().sequential().run();
        assert_eq!(parallel.samples, sequential.samples);
        assert_eq!(parallel.stays, sequential.stays);
    }

    #[test]
    fn failed_runs_are_excluded_and_the_batch_continues() {
        let orchestrator = RunOrchestrator::new(config(4)).unwrap();
        let batch = orchestrator.run_with(|config, run| match run {
            2 => Err(SimulationError::RaceInconsistency {
                patient: 9,
                request: RequestId {
                    tier: CareTier::Hdcu,
                    serial: 0,
                },
            }),
            3 => panic!("invariant broken in run {}", run),
            _ => CareUnitSimulation::new(config.clone(), run).run(),
        });

        assert_eq!(batch.completed, vec![1, 4]);
        assert!(batch.samples.iter().all(|s| s.run_number == 1 || s.run_number == 4));
        let failed: Vec<u32> = batch.failures.iter().map(|f| f.run()).collect();
        assert_eq!(failed, vec![2, 3]);
        assert!(matches!(batch.failures[0], ReplicationError::Failed { .. }));
        match &batch.failures[1] {
            ReplicationError::Panicked { message, .. } => {
                assert_eq!(message, "invariant broken in run 3")
            }
            other => panic!("unexpected failure: {}", other),
        }
    }
}
