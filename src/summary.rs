//! Per-sensor max/min/mean summaries.

use crate::binning::Bins;
use crate::reading::{Reading, elapsed_seconds, format_hms};

/// Mean speed of one bin, paired with the simulation time span.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeanRow {
    pub sensor_id: u32,
    /// Seconds between the earliest and latest reading across all bins.
    pub span_seconds: i64,
    pub speed: f64,
}

impl MeanRow {
    pub fn span_label(&self) -> String {
        format_hms(self.span_seconds)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinSummary {
    pub max: Reading,
    pub min: Reading,
    pub mean: MeanRow,
}

/// Elapsed seconds between the earliest and the latest timestamp found in
/// any bin, or `None` when there are no readings.
///
/// Timestamps are compared as seconds since midnight of a single day.
pub fn simulation_span(bins: &Bins) -> Option<i64> {
    let mut readings = bins.readings();
    let first = readings.next()?;

    let (start, end) = readings.fold((first, first), |(start, end), r| {
        let start = if elapsed_seconds(start, r) < 0 { r } else { start };
        let end = if elapsed_seconds(r, end) < 0 { r } else { end };
        (start, end)
    });

    Some(elapsed_seconds(start, end))
}

/// Summarises one bin. Ties on max/min go to the earliest reading in bin
/// order. Returns `None` for an empty bin.
pub fn summarize(bin: &[Reading], span_seconds: i64) -> Option<BinSummary> {
    let first = bin.first()?;
    let mut max = first;
    let mut min = first;
    let mut sum = 0.0;

    for r in bin {
        if r.speed > max.speed {
            max = r;
        }
        if r.speed < min.speed {
            min = r;
        }
        sum += r.speed;
    }

    Some(BinSummary {
        max: *max,
        min: *min,
        mean: MeanRow {
            sensor_id: first.sensor_id,
            span_seconds,
            speed: sum / bin.len() as f64,
        },
    })
}

/// Summaries for every bin in sensor id order.
pub fn summarize_all(bins: &Bins) -> Vec<BinSummary> {
    let Some(span) = simulation_span(bins) else {
        return Vec::new();
    };
    bins.iter()
        .filter_map(|(_, bin)| summarize(bin, span))
        .collect()
}
