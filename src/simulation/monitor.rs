// src/simulation/monitor.rs

use crate::model::queues::ResourcePool;
use crate::model::tier::{CareTier, PerTier};
use serde::Serialize;

/// One row of the output table: the state of a pool on a given day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sample {
    pub run_number: u32,
    pub day: u64,
    pub resource_name: CareTier,
    pub daily_use: u32,
    pub total_capacity: u32,
    pub available_capacity: u32,
    pub queue_length: u32,
}

impl Sample {
    pub fn of_pool(run_number: u32, day: u64, pool: &ResourcePool) -> Self {
        Self {
            run_number,
            day,
            resource_name: pool.tier(),
            daily_use: pool.in_use(),
            total_capacity: pool.capacity(),
            available_capacity: pool.available(),
            queue_length: pool.queue_len() as u32,
        }
    }
}

/// Daily sampler of every pool, silent during the warm-up period.
#[derive(Debug, Clone)]
pub struct ResourceMonitor {
    run_number: u32,
    warm_up_days: u64,
    samples: Vec<Sample>,
}

impl ResourceMonitor {
    pub fn new(run_number: u32, warm_up_days: u64) -> Self {
        Self {
            run_number,
            warm_up_days,
            samples: Vec::new(),
        }
    }

    /// Records one sample per pool, NICU first, if `day` is past the warm-up.
    ///
    /// Returns the number of samples recorded.
    pub fn observe(&mut self, day: u64, pools: &PerTier<ResourcePool>) -> usize {
        if day <= self.warm_up_days {
            return 0;
        }
        for (_, pool) in pools.iter() {
            self.samples.push(Sample::of_pool(self.run_number, day, pool));
        }
        CareTier::ALL.len()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<Sample> {
        self.samples
    }
}
