//! Command line definitions for `speed_sim` and `speed_process`.
//!
//! `clap` already rejects unknown, repeated and malformed flags. The
//! `classify_*` functions translate those rejections into the numbered
//! error taxonomy.

use std::path::PathBuf;

use chrono::NaiveTime;
use clap::Parser;
use clap::error::{ContextKind, ContextValue, ErrorKind};

use crate::error::{ProcessError, SimError};
use crate::pipeline::DEFAULT_DATA_FILE;
use crate::reading::MAX_SPEED;
use crate::simulate::{DEFAULT_DURATION_SECS, DEFAULT_SAMPLING_SECS, DEFAULT_SENSORS, SimConfig};

#[derive(Debug, Parser)]
#[command(name = "speed_sim", version)]
#[command(about = "Generate a CSV of synthetic sensor speed readings", long_about = None)]
#[command(after_help = "Sampling and duration take -s/--st and -d/--si. \
    The two-letter single-dash forms -st and -si are not accepted.")]
pub struct SimArgs {
    /// Number of sensors
    #[arg(short = 'n', long, value_name = "SENSORS", default_value_t = DEFAULT_SENSORS,
          value_parser = clap::value_parser!(u32).range(1..))]
    pub sensors: u32,

    /// Seconds between two samples
    #[arg(short = 's', long, visible_alias = "st", value_name = "SAMPLING",
          default_value_t = DEFAULT_SAMPLING_SECS, value_parser = clap::value_parser!(u32).range(1..))]
    pub sampling: u32,

    /// Simulation length in seconds
    #[arg(short = 'd', long, visible_alias = "si", value_name = "DURATION",
          default_value_t = DEFAULT_DURATION_SECS, value_parser = clap::value_parser!(u32).range(1..))]
    pub duration: u32,

    /// Output CSV (defaults to speed_data_<unix time>.csv)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Time of the first sample (defaults to now)
    #[arg(long, value_name = "HH:MM:SS", value_parser = parse_clock_time)]
    pub start: Option<NaiveTime>,

    /// Seed for reproducible data
    #[arg(long)]
    pub seed: Option<u64>,

    /// Lowest generated speed
    #[arg(long, default_value_t = 0)]
    pub min_speed: u32,

    /// Generated speeds stay below this
    #[arg(long, default_value_t = MAX_SPEED as u32)]
    pub max_speed: u32,
}

impl SimArgs {
    /// Builds the run configuration; `now` is used when `--start` is absent.
    pub fn to_config(&self, now: NaiveTime) -> SimConfig {
        SimConfig {
            sensors: self.sensors,
            sampling: self.sampling,
            duration: self.duration,
            start: self.start.unwrap_or(now),
            min_speed: self.min_speed,
            max_speed: self.max_speed,
        }
    }

    pub fn output_path(&self, unix_secs: i64) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("speed_data_{unix_secs}.csv")))
    }
}

#[derive(Debug, Parser)]
#[command(name = "speed_process", version)]
#[command(about = "Filter, summarise and sort sensor speed data", long_about = None)]
pub struct ProcessArgs {
    /// Speed data CSV to analyse
    #[arg(value_name = "DATA_FILE", default_value = DEFAULT_DATA_FILE)]
    pub data_file: PathBuf,

    /// Also write the speed-sorted report
    #[arg(short, long)]
    pub sort: bool,

    /// Directory receiving the reports
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,
}

fn parse_clock_time(value: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(value, "%H:%M:%S").map_err(|e| e.to_string())
}

/// `--help` and `--version` surface as clap errors but are not failures.
pub fn is_informational(err: &clap::Error) -> bool {
    matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion)
}

fn offending_arg(err: &clap::Error) -> Option<&str> {
    match err.get(ContextKind::InvalidArg) {
        Some(ContextValue::String(arg)) => Some(arg.as_str()),
        _ => None,
    }
}

pub fn classify_sim_error(err: &clap::Error) -> SimError {
    match err.kind() {
        ErrorKind::InvalidValue | ErrorKind::ValueValidation => match offending_arg(err) {
            Some(arg) if arg.contains("<SENSORS>") => SimError::InvalidSensorCount,
            Some(arg) if arg.contains("<SAMPLING>") => SimError::InvalidSampling,
            Some(arg) if arg.contains("<DURATION>") => SimError::InvalidDuration,
            _ => SimError::InvalidArgument,
        },
        _ => SimError::InvalidArgument,
    }
}

pub fn classify_process_error(_err: &clap::Error) -> ProcessError {
    ProcessError::InvalidArgument
}
