//! Numbered error taxonomy shared by both programs.
//!
//! Every error renders as `error G.N: <message>`, where `G` is the program
//! group (1 = generator, 2 = processor). Tests and log consumers should match
//! on [`Coded::code`] rather than on the text.

use std::path::PathBuf;

use thiserror::Error;

/// An error carrying a stable `group.number` identifier.
pub trait Coded: std::error::Error {
    fn code(&self) -> &'static str;
}

/// Errors raised by the synthetic data generator.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("error 1.1: invalid command line argument")]
    InvalidArgument,

    #[error("error 1.2: invalid number of sensors")]
    InvalidSensorCount,

    #[error("error 1.3: invalid number of sampling time")]
    InvalidSampling,

    #[error("error 1.4: invalid duration")]
    InvalidDuration,

    #[error("error 1.5: unable to save data")]
    CannotSave(#[source] std::io::Error),

    #[error("error 1.6: the simulation duration less than the sampling time")]
    DurationShorterThanSampling,
}

impl Coded for SimError {
    fn code(&self) -> &'static str {
        match self {
            SimError::InvalidArgument => "1.1",
            SimError::InvalidSensorCount => "1.2",
            SimError::InvalidSampling => "1.3",
            SimError::InvalidDuration => "1.4",
            SimError::CannotSave(_) => "1.5",
            SimError::DurationShorterThanSampling => "1.6",
        }
    }
}

/// Errors raised while loading and analysing a speed data file.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("error 2.1: non existing or not readable data file")]
    FileError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error 2.2: wrong data file format in line {line}")]
    InvalidFormat { line: usize },

    #[error("error 2.3: missing data in line {line}")]
    MissingData { line: usize },

    #[error("error 2.4: invalid command line argument")]
    InvalidArgument,

    #[error("error 2.5: unable to save file {}", path.display())]
    CannotSave {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Coded for ProcessError {
    fn code(&self) -> &'static str {
        match self {
            ProcessError::FileError { .. } => "2.1",
            ProcessError::InvalidFormat { .. } => "2.2",
            ProcessError::MissingData { .. } => "2.3",
            ProcessError::InvalidArgument => "2.4",
            ProcessError::CannotSave { .. } => "2.5",
        }
    }
}

impl ProcessError {
    /// Whether processing may continue after this error was reported.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ProcessError::MissingData { .. })
    }
}
