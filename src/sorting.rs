//! Speed ordering of binned readings.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::binning::Bins;
use crate::reading::Reading;

/// All binned readings, each bin sorted by speed, bins in sensor id order.
#[derive(Debug, Clone, PartialEq)]
pub struct SortedReadings {
    pub readings: Vec<Reading>,
    /// Time spent sorting, summed over bins, copying included.
    pub elapsed: Duration,
}

/// Returns a copy of `bin` in ascending speed order. Equal speeds keep their
/// bin order.
pub fn sort_bin(bin: &[Reading]) -> Vec<Reading> {
    let mut sorted = bin.to_vec();
    sorted.sort_by(|a, b| a.speed.total_cmp(&b.speed));
    sorted
}

#[tracing::instrument(skip(bins), fields(bins = bins.len()))]
pub fn sort_bins(bins: &Bins) -> SortedReadings {
    let mut readings = Vec::with_capacity(bins.total_readings());
    let mut elapsed = Duration::ZERO;

    for (sensor_id, bin) in bins.iter() {
        let start = Instant::now();
        let sorted = sort_bin(bin);
        elapsed += start.elapsed();

        debug!(sensor_id, readings = sorted.len(), "Bin sorted");
        readings.extend(sorted);
    }

    SortedReadings { readings, elapsed }
}
