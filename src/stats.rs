//! Sharp speed change counting.

use tracing::debug;

use crate::binning::Bins;
use crate::reading::{Reading, elapsed_seconds};

/// Speed change per second beyond which a step counts as sharp.
pub const RATE_THRESHOLD: f64 = 100.0;

/// Sharp increase/decrease counts for one sensor.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Transitions {
    pub sensor_id: u32,
    pub increments: usize,
    pub decrements: usize,
    /// Consecutive pairs sharing a timestamp, which have no defined rate.
    pub skipped: usize,
}

/// Speed change per second from `from` to `to`, or `None` if both share a
/// timestamp.
pub fn speed_rate(from: &Reading, to: &Reading) -> Option<f64> {
    match elapsed_seconds(from, to) {
        0 => None,
        secs => Some((to.speed - from.speed) / secs as f64),
    }
}

/// Walks consecutive pairs of `bin` in file order. Returns `None` for an
/// empty bin.
pub fn count_transitions(bin: &[Reading]) -> Option<Transitions> {
    let first = bin.first()?;
    let mut t = Transitions {
        sensor_id: first.sensor_id,
        ..Default::default()
    };

    for pair in bin.windows(2) {
        match speed_rate(&pair[0], &pair[1]) {
            Some(rate) if rate > RATE_THRESHOLD => t.increments += 1,
            Some(rate) if rate < -RATE_THRESHOLD => t.decrements += 1,
            Some(_) => {}
            None => {
                debug!(
                    sensor_id = t.sensor_id,
                    time = %pair[0].time_label(),
                    "Skipping pair with identical timestamps"
                );
                t.skipped += 1;
            }
        }
    }

    Some(t)
}

/// Transition counts for every bin in sensor id order.
pub fn count_all(bins: &Bins) -> Vec<Transitions> {
    bins.iter()
        .filter_map(|(_, bin)| count_transitions(bin))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn reading(secs: u32, speed: f64) -> Reading {
        let time = NaiveTime::from_num_seconds_from_midnight_opt(secs, 0).unwrap();
        Reading::new(1, time, speed)
    }

    #[test]
    fn test_empty_bin() {
        assert!(count_transitions(&[]).is_none());
    }

    #[test]
    fn test_single_reading_has_no_pairs() {
        let t = count_transitions(&[reading(0, 1000.0)]).unwrap();
        assert_eq!(t.increments + t.decrements, 0);
    }

    #[test]
    fn test_counts_sharp_changes() {
        // rates: +101, +10, -150, +100 (not strictly above)
        let bin = vec![
            reading(0, 900.0),
            reading(1, 1001.0),
            reading(11, 1101.0),
            reading(13, 801.0),
            reading(14, 901.0),
        ];
        let t = count_transitions(&bin).unwrap();
        assert_eq!(t.increments, 1);
        assert_eq!(t.decrements, 1);
        assert_eq!(t.skipped, 0);
    }

    #[test]
    fn test_rate_is_real_valued() {
        // 100.5 per second counts; integer truncation would not
        let bin = vec![reading(0, 1000.0), reading(2, 1201.0)];
        assert_eq!(count_transitions(&bin).unwrap().increments, 1);
    }

    #[test]
    fn test_identical_timestamps_are_skipped() {
        let bin = vec![reading(5, 900.0), reading(5, 1600.0), reading(6, 900.0)];
        let t = count_transitions(&bin).unwrap();
        assert_eq!(t.skipped, 1);
        assert_eq!(t.increments, 0);
        assert_eq!(t.decrements, 1);
    }

    #[test]
    fn test_speed_rate() {
        assert_eq!(speed_rate(&reading(0, 1000.0), &reading(10, 1500.0)), Some(50.0));
        assert_eq!(speed_rate(&reading(3, 1000.0), &reading(3, 1500.0)), None);
    }

    #[test]
    fn test_count_all_follows_bin_order() {
        let time = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        let bins: Bins = vec![
            Reading::new(3, time, 1000.0),
            Reading::new(1, time, 1000.0),
        ]
        .into_iter()
        .collect();
        let ids: Vec<u32> = count_all(&bins).iter().map(|t| t.sensor_id).collect();
        assert_eq!(ids, vec![1, 3]);
    }
}
