//! CSV report writers.
//!
//! Each report is written to a temporary file next to its destination and
//! renamed into place once complete, so a failed run never leaves a
//! half-written report behind.

use std::fs::File;
use std::io;
use std::path::Path;

use csv::{Writer, WriterBuilder};
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::reading::Reading;
use crate::sorting::SortedReadings;
use crate::stats::Transitions;
use crate::summary::BinSummary;

pub const OUTLIER_FILE_NAME: &str = "outlier_data.csv";
pub const SUMMARY_FILE_NAME: &str = "data_summary.csv";
pub const STATISTICS_FILE_NAME: &str = "data_statistics.csv";
pub const SORTED_FILE_NAME: &str = "sorted_data.csv";

const READING_HEADER: [&str; 3] = ["id", "time", "values"];
const SUMMARY_HEADER: [&str; 4] = ["id", "parameters", "time", "values"];
const STATISTICS_HEADER: [&str; 3] = ["id", "direction", "frequency"];

#[derive(Serialize)]
struct ReadingRow {
    id: u32,
    time: String,
    values: f64,
}

impl From<&Reading> for ReadingRow {
    fn from(r: &Reading) -> Self {
        Self {
            id: r.sensor_id,
            time: r.time_label(),
            values: r.speed,
        }
    }
}

#[derive(Serialize)]
struct SummaryRow {
    id: u32,
    parameters: &'static str,
    time: String,
    values: f64,
}

impl SummaryRow {
    fn from_reading(parameter: &'static str, r: &Reading) -> Self {
        Self {
            id: r.sensor_id,
            parameters: parameter,
            time: r.time_label(),
            values: r.speed,
        }
    }
}

#[derive(Serialize)]
struct StatisticsRow {
    id: u32,
    direction: &'static str,
    frequency: usize,
}

/// Writes a CSV file through a temporary sibling and renames it to `path`
/// when `fill` succeeds.
pub(crate) fn persist_csv<F>(path: &Path, fill: F) -> io::Result<()>
where
    F: FnOnce(&mut Writer<&mut File>) -> csv::Result<()>,
{
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;

    {
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_writer(tmp.as_file_mut());
        fill(&mut writer)?;
        writer.flush()?;
    }

    tmp.persist(path).map_err(|e| e.error)?;
    debug!(path = %path.display(), "Report written");
    Ok(())
}

/// `number of outliers : N`, a header row, then one row per outlier.
pub fn write_outliers(path: &Path, outliers: &[Reading]) -> io::Result<()> {
    persist_csv(path, |w| {
        w.write_record([format!("number of outliers : {}", outliers.len())])?;
        w.write_record(READING_HEADER)?;
        for r in outliers {
            w.serialize(ReadingRow::from(r))?;
        }
        Ok(())
    })
}

/// Three rows per sensor: `max`, `min`, `mean`. The mean row's time column
/// holds the simulation time span.
pub fn write_summary(path: &Path, summaries: &[BinSummary]) -> io::Result<()> {
    persist_csv(path, |w| {
        w.write_record(SUMMARY_HEADER)?;
        for s in summaries {
            w.serialize(SummaryRow::from_reading("max", &s.max))?;
            w.serialize(SummaryRow::from_reading("min", &s.min))?;
            w.serialize(SummaryRow {
                id: s.mean.sensor_id,
                parameters: "mean",
                time: s.mean.span_label(),
                values: round_to_hundredths(s.mean.speed),
            })?;
        }
        Ok(())
    })
}

/// Two rows per sensor: `increment` and `decrement` counts.
pub fn write_statistics(path: &Path, transitions: &[Transitions]) -> io::Result<()> {
    persist_csv(path, |w| {
        w.write_record(STATISTICS_HEADER)?;
        for t in transitions {
            w.serialize(StatisticsRow {
                id: t.sensor_id,
                direction: "increment",
                frequency: t.increments,
            })?;
            w.serialize(StatisticsRow {
                id: t.sensor_id,
                direction: "decrement",
                frequency: t.decrements,
            })?;
        }
        Ok(())
    })
}

/// A timing line, a header row, then every sorted reading.
pub fn write_sorted(path: &Path, sorted: &SortedReadings) -> io::Result<()> {
    persist_csv(path, |w| {
        w.write_record([format!(
            "sorting duration: {} seconds",
            sorted.elapsed.as_secs_f64()
        )])?;
        w.write_record(READING_HEADER)?;
        for r in &sorted.readings {
            w.serialize(ReadingRow::from(r))?;
        }
        Ok(())
    })
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
