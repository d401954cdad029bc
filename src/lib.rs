//! Synthetic sensor speed data generation and analysis.
//!
//! `speed_sim` writes a CSV of fabricated readings; `speed_process` reads
//! such a file, filters outliers, bins readings per sensor and writes
//! summary, statistics and (optionally) sorted reports.

pub mod binning;
pub mod cli;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod reading;
pub mod simulate;
pub mod sorting;
pub mod stats;
pub mod summary;
pub mod telemetry;
