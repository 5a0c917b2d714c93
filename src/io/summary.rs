// src/io/summary.rs

//! Aggregates over the sample table and the stay trace.
//!
//! These are the figures planners read first: how full each tier runs,
//! how often it is at capacity, and how often babies are placed in a
//! higher tier because their own is full.

use crate::model::tier::{CareTier, PerTier};
use crate::simulation::engine::StayRecord;
use crate::simulation::monitor::Sample;
use serde::Serialize;
use std::collections::BTreeMap;

/// Occupancy figures of one tier across every sampled day of every run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierSummary {
    pub resource_name: CareTier,
    pub samples: usize,
    pub mean_daily_use: f64,
    pub mean_available: f64,
    /// Mean use as a percentage of capacity.
    pub occupancy_pct: f64,
    /// Share of samples with no free cot.
    pub at_capacity_pct: f64,
    pub mean_queue_length: f64,
    pub max_queue_length: u32,
}

/// Means across runs for one tier on one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyMean {
    pub day: u64,
    pub resource_name: CareTier,
    pub runs: usize,
    pub mean_daily_use: f64,
    pub mean_available: f64,
    pub mean_queue_length: f64,
    /// Rise in mean use since the tier's previous sampled day, read as admissions.
    pub admissions: f64,
    /// Fall in mean use since the tier's previous sampled day, read as discharges.
    pub discharges: f64,
}

/// Stay figures grouped by the tier the patient needed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaySummary {
    pub needed: CareTier,
    pub stays: usize,
    /// Stays spent in a higher tier than the one needed.
    pub substitutions: usize,
    pub mean_wait_days: f64,
    pub mean_length_of_stay: f64,
}

fn mean(total: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

/// One summary per tier, NICU first. Tiers without samples are left out.
pub fn summarize_tiers(samples: &[Sample]) -> Vec<TierSummary> {
    CareTier::ALL
        .into_iter()
        .filter_map(|tier| {
            let rows: Vec<&Sample> = samples.iter().filter(|s| s.resource_name == tier).collect();
            if rows.is_empty() {
                return None;
            }
            let n = rows.len();
            let used: f64 = rows.iter().map(|s| s.daily_use as f64).sum();
            let capacity: f64 = rows.iter().map(|s| s.total_capacity as f64).sum();
            let available: f64 = rows.iter().map(|s| s.available_capacity as f64).sum();
            let queued: f64 = rows.iter().map(|s| s.queue_length as f64).sum();
            let full = rows.iter().filter(|s| s.available_capacity == 0).count();

            Some(TierSummary {
                resource_name: tier,
                samples: n,
                mean_daily_use: mean(used, n),
                mean_available: mean(available, n),
                occupancy_pct: if capacity > 0.0 { used / capacity * 100.0 } else { 0.0 },
                at_capacity_pct: mean(full as f64 * 100.0, n),
                mean_queue_length: mean(queued, n),
                max_queue_length: rows.iter().map(|s| s.queue_length).max().unwrap_or(0),
            })
        })
        .collect()
}

/// Per-day means across runs, ordered by day then tier.
///
/// Admissions and discharges are inferred from the day-to-day change in
/// mean use, so they are zero on a tier's first sampled day.
pub fn daily_means(samples: &[Sample]) -> Vec<DailyMean> {
    // (use, available, queue, runs)
    let mut grouped: BTreeMap<(u64, CareTier), (f64, f64, f64, usize)> = BTreeMap::new();
    for s in samples {
        let entry = grouped.entry((s.day, s.resource_name)).or_default();
        entry.0 += s.daily_use as f64;
        entry.1 += s.available_capacity as f64;
        entry.2 += s.queue_length as f64;
        entry.3 += 1;
    }

    let mut previous: PerTier<Option<f64>> = PerTier::default();
    grouped
        .into_iter()
        .map(|((day, tier), (used, available, queued, runs))| {
            let mean_daily_use = mean(used, runs);
            let change = previous[tier].map_or(0.0, |before| mean_daily_use - before);
            previous[tier] = Some(mean_daily_use);
            DailyMean {
                day,
                resource_name: tier,
                runs,
                mean_daily_use,
                mean_available: mean(available, runs),
                mean_queue_length: mean(queued, runs),
                admissions: change.max(0.0),
                discharges: (-change).max(0.0),
            }
        })
        .collect()
}

/// One summary per needed tier that had at least one stay.
pub fn summarize_stays(stays: &[StayRecord]) -> Vec<StaySummary> {
    CareTier::ALL
        .into_iter()
        .filter_map(|tier| {
            let rows: Vec<&StayRecord> = stays.iter().filter(|s| s.needed == tier).collect();
            if rows.is_empty() {
                return None;
            }
            let n = rows.len();
            let waited: u64 = rows.iter().map(|s| s.wait_days).sum();
            let stayed: u64 = rows.iter().map(|s| s.left_day - s.admitted_day).sum();

            Some(StaySummary {
                needed: tier,
                stays: n,
                substitutions: rows.iter().filter(|s| s.is_substitution()).count(),
                mean_wait_days: mean(waited as f64, n),
                mean_length_of_stay: mean(stayed as f64, n),
            })
        })
        .collect()
}
