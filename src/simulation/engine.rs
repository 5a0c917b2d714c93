// src/simulation/engine.rs

use crate::error::SimulationError;
use crate::model::patient::Patient;
use crate::model::queues::{Grant, PatientId, RequestId, RequestStatus, ResourcePool};
use crate::model::tier::{CareTier, PerTier};
use crate::simulation::config::{ReassessmentBasis, SimulationConfig};
use crate::simulation::monitor::{ResourceMonitor, Sample};
use crate::simulation::scheduler::EventQueue;
use crate::strategy::implementations::{ExponentialBirths, ExponentialStay};
use crate::strategy::traits::{ArrivalModel, SimRng, StayModel};
use rand::SeedableRng;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// One completed stay in a cot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StayRecord {
    pub run_number: u32,
    pub patient_id: PatientId,
    pub needed: CareTier,
    pub occupied: CareTier,
    pub requested_day: u64,
    pub admitted_day: u64,
    pub left_day: u64,
    pub wait_days: u64,
}

impl StayRecord {
    /// The patient was placed in a higher tier than the one it needed.
    pub fn is_substitution(&self) -> bool {
        self.needed != self.occupied
    }
}

/// Everything one replication produced.
#[derive(Debug, Clone, Default)]
pub struct RunResult {
    pub run_number: u32,
    pub samples: Vec<Sample>,
    pub stays: Vec<StayRecord>,
    pub births: u64,
    pub discharged: u64,
    /// Patients still waiting or in a cot when the horizon was reached.
    pub in_care_at_end: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    ArrivalBatch { day: u64 },
    MonitorTick,
    Start(PatientId),
    Admitted(PatientId),
    StayOver(PatientId),
}

#[derive(Debug, Clone, PartialEq)]
enum ProcessState {
    Created,
    Awaiting {
        needed: CareTier,
        race: Vec<RequestId>,
        since: u64,
    },
    /// Holds a cot, continues at its next turn.
    Admitted {
        needed: CareTier,
        held: RequestId,
        since: u64,
    },
    InResource {
        needed: CareTier,
        held: RequestId,
        since: u64,
        admitted_at: u64,
    },
    Reassessing,
}

impl ProcessState {
    fn label(&self) -> &'static str {
        match self {
            ProcessState::Created => "created",
            ProcessState::Awaiting { .. } => "awaiting a cot",
            ProcessState::Admitted { .. } => "admitted",
            ProcessState::InResource { .. } => "in a cot",
            ProcessState::Reassessing => "reassessing",
        }
    }
}

fn unexpected(patient: PatientId, event: &'static str, state: &ProcessState) -> SimulationError {
    SimulationError::UnexpectedEvent {
        patient,
        event,
        state: state.label(),
    }
}

#[derive(Debug)]
struct PatientProcess {
    patient: Patient,
    state: ProcessState,
}

/// One replication of the neonatal unit.
///
/// Births, patients and the monitor are logically concurrent processes
/// sharing one virtual clock. A process only gives up control when it
/// waits for time to pass or for a cot.
pub struct CareUnitSimulation {
    run_number: u32,
    config: SimulationConfig,
    rng: SimRng,
    clock: EventQueue<Event>,
    pools: PerTier<ResourcePool>,
    patients: BTreeMap<PatientId, PatientProcess>,
    next_patient: PatientId,
    arrivals: Box<dyn ArrivalModel>,
    stay_model: Box<dyn StayModel>,
    monitor: ResourceMonitor,
    stays: Vec<StayRecord>,
    births: u64,
    discharged: u64,
}

impl CareUnitSimulation {
    /// Builds run `run_number` with exponential births and stays, seeded
    /// from `config.seed + run_number`. An `annual_births` figure takes
    /// precedence over `daily_births`.
    pub fn new(config: SimulationConfig, run_number: u32) -> Self {
        let arrivals = Box::new(ExponentialBirths::new(config.daily_birth_rate()));
        Self::with_models(config, run_number, arrivals, Box::new(ExponentialStay))
    }

    pub fn with_models(
        config: SimulationConfig,
        run_number: u32,
        arrivals: Box<dyn ArrivalModel>,
        stay_model: Box<dyn StayModel>,
    ) -> Self {
        let rng = SimRng::seed_from_u64(config.seed.wrapping_add(run_number as u64));
        let pools = PerTier::from_fn(|tier| ResourcePool::new(tier, config.cots[tier]));
        let monitor = ResourceMonitor::new(run_number, config.warm_up_days);
        let horizon = config.duration_days;

        let mut sim = Self {
            run_number,
            config,
            rng,
            clock: EventQueue::new(),
            pools,
            patients: BTreeMap::new(),
            next_patient: 1,
            arrivals,
            stay_model,
            monitor,
            stays: Vec::new(),
            births: 0,
            discharged: 0,
        };

        // The sample of day `d` sees the pools before anything else due on
        // day `d` runs.
        if horizon > 0 {
            sim.clock.schedule_first_at(1, Event::MonitorTick);
            sim.clock.schedule_at(0, Event::ArrivalBatch { day: 0 });
        }
        sim
    }

    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    pub fn pools(&self) -> &PerTier<ResourcePool> {
        &self.pools
    }

    pub fn samples(&self) -> &[Sample] {
        self.monitor.samples()
    }

    /// Patients born so far that have not been discharged.
    pub fn in_care(&self) -> usize {
        self.patients.len()
    }

    /// Processes every event due up to and including `day`.
    pub fn advance_to(&mut self, day: u64) -> Result<(), SimulationError> {
        let until = day.min(self.config.duration_days);
        while let Some(event) = self.clock.pop_until(until) {
            self.dispatch(event)?;
        }
        Ok(())
    }

    /// Runs to the end of the last day. Whatever is still pending then is
    /// abandoned.
    pub fn run(mut self) -> Result<RunResult, SimulationError> {
        self.advance_to(self.config.duration_days)?;
        Ok(self.finish())
    }

    fn finish(self) -> RunResult {
        debug!(
            run = self.run_number,
            births = self.births,
            discharged = self.discharged,
            in_care = self.patients.len(),
            "replication finished"
        );
        RunResult {
            run_number: self.run_number,
            samples: self.monitor.into_samples(),
            stays: self.stays,
            births: self.births,
            discharged: self.discharged,
            in_care_at_end: self.patients.len() as u64,
        }
    }

    fn dispatch(&mut self, event: Event) -> Result<(), SimulationError> {
        match event {
            Event::ArrivalBatch { day } => {
                self.on_arrival_batch(day);
                Ok(())
            }
            Event::MonitorTick => {
                let day = self.clock.now();
                self.monitor.observe(day, &self.pools);
                if day < self.config.duration_days {
                    self.clock.schedule_first_at(day + 1, Event::MonitorTick);
                }
                Ok(())
            }
            Event::Start(id) => self.on_start(id),
            Event::Admitted(id) => self.on_admitted(id),
            Event::StayOver(id) => self.on_stay_over(id),
        }
    }

    // =================================================================
    // Arrival generator
    // =================================================================

    fn on_arrival_batch(&mut self, day: u64) {
        let births = self.arrivals.births(day, &self.config.chances, &mut self.rng);
        trace!(run = self.run_number, day, count = births.len(), "births");

        for needs in births {
            let id = self.next_patient;
            self.next_patient += 1;
            let mut patient = Patient::new(id, day);
            patient.needs = needs;

            self.patients.insert(
                id,
                PatientProcess {
                    patient,
                    state: ProcessState::Created,
                },
            );
            self.births += 1;
            self.clock.schedule_in(0, Event::Start(id));
        }

        if day + 1 < self.config.duration_days {
            self.clock.schedule_in(1, Event::ArrivalBatch { day: day + 1 });
        }
    }

    // =================================================================
    // Patient process
    // =================================================================

    fn process(&self, id: PatientId) -> Result<&PatientProcess, SimulationError> {
        self.patients
            .get(&id)
            .ok_or(SimulationError::UnknownPatient(id))
    }

    fn set_state(&mut self, id: PatientId, state: ProcessState) -> Result<(), SimulationError> {
        let process = self
            .patients
            .get_mut(&id)
            .ok_or(SimulationError::UnknownPatient(id))?;
        process.state = state;
        Ok(())
    }

    fn on_start(&mut self, id: PatientId) -> Result<(), SimulationError> {
        let state = &self.process(id)?.state;
        if *state != ProcessState::Created {
            return Err(unexpected(id, "start", state));
        }
        self.seek_care(id)
    }

    /// Top of the care loop: file for the most severe need, or go home.
    fn seek_care(&mut self, id: PatientId) -> Result<(), SimulationError> {
        let now = self.clock.now();
        let Some(needed) = self.process(id)?.patient.most_severe_need() else {
            self.discharge(id);
            return Ok(());
        };

        // Every candidate is filed before the race is judged, the needed
        // tier first, so it wins whenever it has a free cot.
        let race: Vec<RequestId> = needed
            .admission_candidates()
            .iter()
            .map(|(tier, priority)| self.pools[*tier].request(id, *priority, now))
            .collect();
        let winner = race
            .iter()
            .copied()
            .find(|request| self.pools[request.tier].status(*request) == Some(RequestStatus::Granted));

        match winner {
            Some(winner) => self.settle_race(id, needed, winner, &race, now),
            None => {
                trace!(run = self.run_number, patient = id, %needed, "waiting for a cot");
                self.set_state(
                    id,
                    ProcessState::Awaiting {
                        needed,
                        race,
                        since: now,
                    },
                )
            }
        }
    }

    /// Resolves a race in favour of `winner`. Every other request is gone
    /// from its pool before the winner's continuation is scheduled.
    fn settle_race(
        &mut self,
        id: PatientId,
        needed: CareTier,
        winner: RequestId,
        race: &[RequestId],
        since: u64,
    ) -> Result<(), SimulationError> {
        let mut handed_on = Vec::new();

        for loser in race.iter().copied().filter(|request| *request != winner) {
            let pool = &mut self.pools[loser.tier];
            match pool.status(loser) {
                Some(RequestStatus::Pending) => {
                    pool.cancel(loser)?;
                }
                // Granted in the same instant as the winner: hand the cot back.
                Some(RequestStatus::Granted) => {
                    if let Some(grant) = pool.release(loser)? {
                        handed_on.push(grant);
                    }
                }
                Some(RequestStatus::Cancelled) | None => {
                    return Err(SimulationError::RaceInconsistency {
                        patient: id,
                        request: loser,
                    })
                }
            }
        }

        if winner.tier != needed {
            debug!(
                run = self.run_number,
                patient = id,
                %needed,
                occupied = %winner.tier,
                "admitted to a higher tier"
            );
        }
        self.set_state(
            id,
            ProcessState::Admitted {
                needed,
                held: winner,
                since,
            },
        )?;
        self.clock.schedule_in(0, Event::Admitted(id));

        for grant in handed_on {
            self.on_grant(grant)?;
        }
        Ok(())
    }

    /// A pool passed a freed cot to a waiting request.
    fn on_grant(&mut self, grant: Grant) -> Result<(), SimulationError> {
        let inconsistent = SimulationError::RaceInconsistency {
            patient: grant.patient,
            request: grant.request,
        };
        let (needed, race, since) = match &self.process(grant.patient)?.state {
            ProcessState::Awaiting {
                needed,
                race,
                since,
            } if race.contains(&grant.request) => (*needed, race.clone(), *since),
            _ => return Err(inconsistent),
        };
        self.settle_race(grant.patient, needed, grant.request, &race, since)
    }

    fn on_admitted(&mut self, id: PatientId) -> Result<(), SimulationError> {
        let now = self.clock.now();
        let process = self
            .patients
            .get_mut(&id)
            .ok_or(SimulationError::UnknownPatient(id))?;
        let ProcessState::Admitted {
            needed,
            held,
            since,
        } = process.state
        else {
            return Err(unexpected(id, "admission", &process.state));
        };
        process.patient.queue_wait += now - since;

        let occupied = held.tier;
        let days = self
            .stay_model
            .stay_days(occupied, self.config.mean_stay[occupied], &mut self.rng);
        trace!(run = self.run_number, patient = id, %occupied, days, "stay begins");

        process.state = ProcessState::InResource {
            needed,
            held,
            since,
            admitted_at: now,
        };
        self.clock.schedule_in(days, Event::StayOver(id));
        Ok(())
    }

    fn on_stay_over(&mut self, id: PatientId) -> Result<(), SimulationError> {
        let now = self.clock.now();
        let process = self
            .patients
            .get_mut(&id)
            .ok_or(SimulationError::UnknownPatient(id))?;
        let ProcessState::InResource {
            needed,
            held,
            since,
            admitted_at,
        } = process.state
        else {
            return Err(unexpected(id, "end of stay", &process.state));
        };
        let occupied = held.tier;

        process.state = ProcessState::Reassessing;
        process.patient.clear_need(needed);
        let basis = match self.config.reassessment {
            ReassessmentBasis::NeededTier => Some(needed),
            ReassessmentBasis::OccupiedTier => Some(occupied),
            ReassessmentBasis::SkipOnSubstitution if occupied != needed => None,
            ReassessmentBasis::SkipOnSubstitution => Some(needed),
        };
        if let Some(tier) = basis {
            let follow_on = self.config.chances.after(tier);
            process.patient.reassess(&follow_on, &mut self.rng);
        }

        self.stays.push(StayRecord {
            run_number: self.run_number,
            patient_id: id,
            needed,
            occupied,
            requested_day: since,
            admitted_day: admitted_at,
            left_day: now,
            wait_days: admitted_at - since,
        });

        if let Some(grant) = self.pools[occupied].release(held)? {
            self.on_grant(grant)?;
        }
        self.seek_care(id)
    }

    fn discharge(&mut self, id: PatientId) {
        if let Some(process) = self.patients.remove(&id) {
            self.discharged += 1;
            trace!(
                run = self.run_number,
                patient = id,
                waited = process.patient.queue_wait,
                "discharged"
            );
        }
    }
}
