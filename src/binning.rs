//! Outlier filtering and per-sensor binning of a speed data stream.

use std::collections::BTreeMap;
use std::io::BufRead;
use std::ops::RangeInclusive;
use std::path::Path;

use tracing::{debug, info};

use crate::error::ProcessError;
use crate::reading::{LineDefect, Reading, parse_line};
use crate::telemetry::report;

/// Speeds inside this band are binned; everything else is an outlier.
pub const SPEED_BAND: RangeInclusive<f64> = 900.0..=1600.0;

pub fn is_in_band(speed: f64) -> bool {
    SPEED_BAND.contains(&speed)
}

/// In-band readings grouped by sensor id, in file order within each group.
///
/// Only sensors that produced at least one in-band reading have a bin.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Bins {
    bins: BTreeMap<u32, Vec<Reading>>,
}

impl Bins {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `reading` to the bin of its sensor.
    pub fn push(&mut self, reading: Reading) {
        self.bins.entry(reading.sensor_id).or_default().push(reading);
    }

    pub fn get(&self, sensor_id: u32) -> Option<&[Reading]> {
        self.bins.get(&sensor_id).map(Vec::as_slice)
    }

    /// Bins in ascending sensor id order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &[Reading])> {
        self.bins.iter().map(|(id, bin)| (*id, bin.as_slice()))
    }

    /// Every binned reading, bin by bin.
    pub fn readings(&self) -> impl Iterator<Item = &Reading> {
        self.bins.values().flatten()
    }

    /// Number of non-empty bins.
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn total_readings(&self) -> usize {
        self.bins.values().map(Vec::len).sum()
    }
}

impl FromIterator<Reading> for Bins {
    fn from_iter<I: IntoIterator<Item = Reading>>(iter: I) -> Self {
        let mut bins = Bins::new();
        for reading in iter {
            bins.push(reading);
        }
        bins
    }
}

/// Everything gathered from one input file.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub bins: Bins,
    pub outliers: Vec<Reading>,
    /// Data line numbers (first line after the header is 1) that had a
    /// missing field.
    pub missing_lines: Vec<usize>,
}

impl LoadOutcome {
    /// Routes one parsed reading to its bin or to the outlier set.
    pub fn accept(&mut self, reading: Reading) {
        if is_in_band(reading.speed) {
            self.bins.push(reading);
        } else {
            self.outliers.push(reading);
        }
    }
}

/// Reads a whole data file: skips the header, parses each line once and
/// routes it.
///
/// Lines with a missing field are reported and skipped. The first line with
/// an invalid value, or bytes that are not UTF-8, aborts the load with
/// [`ProcessError::InvalidFormat`]. `source` is only used to describe read
/// failures.
#[tracing::instrument(skip(reader, source), fields(source = %source.display()))]
pub fn load<R: BufRead>(reader: R, source: &Path) -> Result<LoadOutcome, ProcessError> {
    let mut outcome = LoadOutcome::default();
    let mut lines = reader.split(b'\n');

    let read_error = |e: std::io::Error| ProcessError::FileError {
        path: source.to_path_buf(),
        source: e,
    };

    // header
    if lines.next().transpose().map_err(read_error)?.is_none() {
        debug!("Data file is empty");
        return Ok(outcome);
    }

    for (index, bytes) in lines.enumerate() {
        let line_num = index + 1;
        let bytes = bytes.map_err(read_error)?;
        let Ok(line) = std::str::from_utf8(&bytes) else {
            return Err(ProcessError::InvalidFormat { line: line_num });
        };

        let defect = match parse_line(line.trim_end_matches('\r')) {
            Ok(reading) => {
                outcome.accept(reading);
                continue;
            }
            Err(LineDefect::MissingField) => ProcessError::MissingData { line: line_num },
            Err(LineDefect::InvalidFormat) => ProcessError::InvalidFormat { line: line_num },
        };
        if !defect.is_recoverable() {
            return Err(defect);
        }
        report(&defect);
        outcome.missing_lines.push(line_num);
    }

    info!(
        bins = outcome.bins.len(),
        binned = outcome.bins.total_readings(),
        outliers = outcome.outliers.len(),
        missing = outcome.missing_lines.len(),
        "Data file loaded"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use std::io::Cursor;

    fn load_str(data: &str) -> Result<LoadOutcome, ProcessError> {
        load(Cursor::new(data), Path::new("test.csv"))
    }

    fn reading(id: u32, secs: u32, speed: f64) -> Reading {
        let time = NaiveTime::from_num_seconds_from_midnight_opt(secs, 0).unwrap();
        Reading::new(id, time, speed)
    }

    #[test]
    fn test_band_edges_are_in_band() {
        assert!(is_in_band(900.0));
        assert!(is_in_band(1600.0));
        assert!(!is_in_band(899.9));
        assert!(!is_in_band(1600.1));
    }

    #[test]
    fn test_bins_keep_file_order_and_sensor_identity() {
        let bins: Bins = vec![
            reading(2, 20, 1000.0),
            reading(1, 10, 1100.0),
            reading(2, 5, 1200.0),
        ]
        .into_iter()
        .collect();

        assert_eq!(bins.len(), 2);
        let ids: Vec<u32> = bins.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![1, 2]);

        let second = bins.get(2).unwrap();
        assert_eq!(second[0].speed, 1000.0);
        assert_eq!(second[1].speed, 1200.0);
        for (id, bin) in bins.iter() {
            assert!(bin.iter().all(|r| r.sensor_id == id));
        }
    }

    #[test]
    fn test_sparse_ids_do_not_create_empty_bins() {
        let bins: Bins = vec![reading(4_000_000, 0, 1000.0), reading(1, 0, 1000.0)]
            .into_iter()
            .collect();
        assert_eq!(bins.len(), 2);
        assert!(bins.get(2).is_none());
    }

    #[test]
    fn test_load_skips_header_and_routes_outliers() {
        let outcome =
            load_str("id,time,values\n1,10:00:00,1000\n1,10:00:10,1700\n2,10:00:00,850.5\n")
                .unwrap();

        assert_eq!(outcome.bins.total_readings(), 1);
        assert_eq!(outcome.outliers.len(), 2);
        assert_eq!(outcome.outliers[0].speed, 1700.0);
        assert!(outcome.missing_lines.is_empty());
    }

    #[test]
    fn test_load_reports_missing_and_continues() {
        let outcome =
            load_str("id,time,values\n1,10:00:00,1000\n5,,120.0\n\n1,10:00:10,1100\n").unwrap();

        assert_eq!(outcome.missing_lines, vec![2, 3]);
        assert_eq!(outcome.bins.total_readings(), 2);
        assert!(outcome.bins.get(5).is_none());
    }

    #[test]
    fn test_load_aborts_on_invalid_value() {
        let err = load_str("id,time,values\n1,10:00:00,1000\n1,10:00:10,9999\n1,10:00:20,1000\n")
            .unwrap_err();
        assert!(matches!(err, ProcessError::InvalidFormat { line: 2 }));
    }

    #[test]
    fn test_load_rejects_non_utf8_line() {
        let data: &[u8] = b"id,time,values\n1,10:00:00,1000\n1,10:00:\xff0,1000\n";
        let err = load(Cursor::new(data), Path::new("test.csv")).unwrap_err();
        assert!(matches!(err, ProcessError::InvalidFormat { line: 2 }));
    }

    #[test]
    fn test_load_ignores_non_utf8_header() {
        let data: &[u8] = b"id,t\xffme,values\n1,10:00:00,1000\n";
        let outcome = load(Cursor::new(data), Path::new("test.csv")).unwrap();
        assert_eq!(outcome.bins.total_readings(), 1);
    }

    #[test]
    fn test_load_accepts_crlf_lines() {
        let outcome = load_str("id,time,values\r\n1,10:00:00,1000\r\n1,10:00:10,1100\r\n").unwrap();
        assert_eq!(outcome.bins.total_readings(), 2);
    }

    #[test]
    fn test_load_read_failure_is_file_error() {
        struct Broken;
        impl std::io::Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("device gone"))
            }
        }
        let err = load(std::io::BufReader::new(Broken), Path::new("test.csv")).unwrap_err();
        assert!(matches!(err, ProcessError::FileError { .. }));
    }

    #[test]
    fn test_load_empty_input() {
        let outcome = load_str("").unwrap();
        assert!(outcome.bins.is_empty());
        assert!(outcome.outliers.is_empty());
    }

    #[test]
    fn test_load_header_only() {
        let outcome = load_str("id,time,values\n").unwrap();
        assert!(outcome.bins.is_empty());
    }
}
