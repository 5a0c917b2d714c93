// src/io/reporting.rs

use crate::io::summary::{DailyMean, TierSummary};
use crate::simulation::engine::StayRecord;
use crate::simulation::monitor::Sample;
use serde::Serialize;
use std::error::Error;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Serializes `rows` as CSV, header first, into any writer.
pub fn write_rows<W: Write, T: Serialize>(writer: W, rows: &[T]) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes the sample table to a CSV file.
///
/// # Arguments
/// * `file_path` - The path to save the file (e.g., "results/samples.csv").
/// * `data` - Samples of every completed replication.
pub fn write_samples(file_path: &str, data: &[Sample]) -> Result<(), Box<dyn Error>> {
    write_file(file_path, data)
}

/// Writes one row per completed stay to a CSV file.
pub fn write_stays(file_path: &str, data: &[StayRecord]) -> Result<(), Box<dyn Error>> {
    write_file(file_path, data)
}

pub fn write_summary(file_path: &str, data: &[TierSummary]) -> Result<(), Box<dyn Error>> {
    write_file(file_path, data)
}

pub fn write_daily_means(file_path: &str, data: &[DailyMean]) -> Result<(), Box<dyn Error>> {
    write_file(file_path, data)
}

fn write_file<T: Serialize>(file_path: &str, data: &[T]) -> Result<(), Box<dyn Error>> {
    let path = Path::new(file_path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    write_rows(std::io::BufWriter::new(file), data)?;

    info!(rows = data.len(), path = file_path, "exported");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tier::CareTier;

    #[test]
    fn sample_table_has_the_agreed_columns() {
        let samples = vec![Sample {
            run_number: 2,
            day: 11,
            resource_name: CareTier::Hdcu,
            daily_use: 3,
            total_capacity: 4,
            available_capacity: 1,
            queue_length: 0,
        }];
        let mut out = Vec::new();
        write_rows(&mut out, &samples).unwrap();

        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("run_number,day,resource_name,daily_use,total_capacity,available_capacity,queue_length")
        );
        assert_eq!(lines.next(), Some("2,11,HDCU,3,4,1,0"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn stay_rows_name_both_tiers() {
        let stays = vec![StayRecord {
            run_number: 1,
            patient_id: 7,
            needed: CareTier::Scbu,
            occupied: CareTier::Nicu,
            requested_day: 3,
            admitted_day: 5,
            left_day: 9,
            wait_days: 2,
        }];
        let mut out = Vec::new();
        write_rows(&mut out, &stays).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with("1,7,SCBU,NICU,3,5,9,2\n"));
    }
}
