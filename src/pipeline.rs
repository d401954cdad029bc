//! Processing run over one data file: load, summarise, count, sort.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::binning::{Bins, load};
use crate::error::ProcessError;
use crate::output::{
    OUTLIER_FILE_NAME, SORTED_FILE_NAME, STATISTICS_FILE_NAME, SUMMARY_FILE_NAME, write_outliers,
    write_sorted, write_statistics, write_summary,
};
use crate::sorting::sort_bins;
use crate::stats::count_all;
use crate::summary::summarize_all;

pub const DEFAULT_DATA_FILE: &str = "speed_data.csv";

/// Destination paths of the reports.
#[derive(Debug, Clone)]
pub struct OutputSinks {
    dir: PathBuf,
}

impl OutputSinks {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn outliers(&self) -> PathBuf {
        self.dir.join(OUTLIER_FILE_NAME)
    }

    pub fn summary(&self) -> PathBuf {
        self.dir.join(SUMMARY_FILE_NAME)
    }

    pub fn statistics(&self) -> PathBuf {
        self.dir.join(STATISTICS_FILE_NAME)
    }

    pub fn sorted(&self) -> PathBuf {
        self.dir.join(SORTED_FILE_NAME)
    }
}

/// What a completed run produced.
#[derive(Debug, Default)]
pub struct RunReport {
    pub bins: usize,
    pub binned: usize,
    pub outliers: usize,
    pub missing_lines: Vec<usize>,
    pub written: Vec<PathBuf>,
}

/// State shared by the stages of one run.
#[derive(Debug)]
pub struct Pipeline {
    input: PathBuf,
    sinks: OutputSinks,
    sort: bool,
    bins: Bins,
    report: RunReport,
}

impl Pipeline {
    pub fn new(input: impl Into<PathBuf>, sinks: OutputSinks) -> Self {
        Self {
            input: input.into(),
            sinks,
            sort: false,
            bins: Bins::new(),
            report: RunReport::default(),
        }
    }

    /// Enables the speed-sorted report.
    pub fn with_sort(mut self, sort: bool) -> Self {
        self.sort = sort;
        self
    }

    /// Runs every stage in order, stopping at the first fatal error.
    ///
    /// Nothing is written when the input cannot be read or contains an
    /// invalid value.
    #[tracing::instrument(skip(self), fields(input = %self.input.display(), sort = self.sort))]
    pub fn run(mut self) -> Result<RunReport, ProcessError> {
        self.load()?;
        self.summarize()?;
        self.count_transitions()?;
        if self.sort {
            self.sort_readings()?;
        }

        info!(files = self.report.written.len(), "Processing finished");
        Ok(self.report)
    }

    fn load(&mut self) -> Result<(), ProcessError> {
        let file = File::open(&self.input).map_err(|source| ProcessError::FileError {
            path: self.input.clone(),
            source,
        })?;
        let outcome = load(BufReader::new(file), &self.input)?;

        self.report.bins = outcome.bins.len();
        self.report.binned = outcome.bins.total_readings();
        self.report.outliers = outcome.outliers.len();
        self.report.missing_lines = outcome.missing_lines;
        self.bins = outcome.bins;

        let path = self.sinks.outliers();
        self.save(&path, write_outliers(&path, &outcome.outliers))
    }

    fn summarize(&mut self) -> Result<(), ProcessError> {
        let summaries = summarize_all(&self.bins);
        let path = self.sinks.summary();
        self.save(&path, write_summary(&path, &summaries))
    }

    fn count_transitions(&mut self) -> Result<(), ProcessError> {
        let transitions = count_all(&self.bins);
        let path = self.sinks.statistics();
        self.save(&path, write_statistics(&path, &transitions))
    }

    fn sort_readings(&mut self) -> Result<(), ProcessError> {
        let sorted = sort_bins(&self.bins);
        info!(
            readings = sorted.readings.len(),
            seconds = sorted.elapsed.as_secs_f64(),
            "Readings sorted"
        );
        let path = self.sinks.sorted();
        self.save(&path, write_sorted(&path, &sorted))
    }

    fn save(&mut self, path: &Path, result: std::io::Result<()>) -> Result<(), ProcessError> {
        result.map_err(|source| ProcessError::CannotSave {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "Report saved");
        self.report.written.push(path.to_path_buf());
        Ok(())
    }
}
