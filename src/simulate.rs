//! Synthetic speed data generation.

use std::path::Path;

use chrono::{NaiveTime, TimeDelta};
use rand::Rng;
use serde::Serialize;
use tracing::info;

use crate::error::SimError;
use crate::output::persist_csv;
use crate::reading::{MAX_SPEED, Reading};

pub const DEFAULT_SENSORS: u32 = 1;
pub const DEFAULT_SAMPLING_SECS: u32 = 10;
pub const DEFAULT_DURATION_SECS: u32 = 3600;

/// Parameters of one simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    pub sensors: u32,
    /// Seconds between two samples of the same sensor.
    pub sampling: u32,
    /// Length of the simulation in seconds. The last tick may land exactly
    /// on it.
    pub duration: u32,
    /// Wall clock time of the first tick.
    pub start: NaiveTime,
    /// Lowest generated speed.
    pub min_speed: u32,
    /// Generated speeds stay strictly below this.
    pub max_speed: u32,
}

impl SimConfig {
    pub fn new(start: NaiveTime) -> Self {
        Self {
            sensors: DEFAULT_SENSORS,
            sampling: DEFAULT_SAMPLING_SECS,
            duration: DEFAULT_DURATION_SECS,
            start,
            min_speed: 0,
            max_speed: MAX_SPEED as u32,
        }
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if self.sensors == 0 {
            return Err(SimError::InvalidSensorCount);
        }
        if self.sampling == 0 {
            return Err(SimError::InvalidSampling);
        }
        if self.duration == 0 {
            return Err(SimError::InvalidDuration);
        }
        if self.duration < self.sampling {
            return Err(SimError::DurationShorterThanSampling);
        }
        if self.min_speed >= self.max_speed || f64::from(self.max_speed) > MAX_SPEED {
            return Err(SimError::InvalidArgument);
        }
        Ok(())
    }

    /// Sampling ticks per sensor, counting the one at time zero.
    pub fn ticks(&self) -> u64 {
        u64::from(self.duration / self.sampling) + 1
    }

    pub fn row_count(&self) -> u64 {
        self.ticks() * u64::from(self.sensors)
    }
}

/// Produces readings tick by tick, every sensor once per tick.
pub struct Generator<R> {
    config: SimConfig,
    rng: R,
}

impl<R: Rng> Generator<R> {
    pub fn new(config: SimConfig, rng: R) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self { config, rng })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Speed in 0.1 steps within the configured band.
    fn next_speed(&mut self) -> f64 {
        let tenths = self
            .rng
            .random_range(self.config.min_speed * 10..self.config.max_speed * 10);
        f64::from(tenths) / 10.0
    }

    pub fn readings(mut self) -> impl Iterator<Item = Reading> {
        let SimConfig {
            sensors,
            sampling,
            duration,
            start,
            ..
        } = self.config.clone();

        (0..=duration).step_by(sampling as usize).flat_map(move |offset| {
            // wraps past midnight
            let time = start + TimeDelta::seconds(i64::from(offset));
            (1..=sensors)
                .map(|sensor_id| Reading::new(sensor_id, time, self.next_speed()))
                .collect::<Vec<_>>()
        })
    }
}

#[derive(Serialize)]
struct DataRow {
    id: u32,
    time: String,
    values: String,
}

/// Runs the generator to completion and writes its CSV to `path`. Returns
/// the number of data rows written.
#[tracing::instrument(skip(path, generator), fields(path = %path.display()))]
pub fn write_data<R: Rng>(path: &Path, generator: Generator<R>) -> Result<u64, SimError> {
    let expected = generator.config().row_count();
    let mut rows = 0u64;

    persist_csv(path, |w| {
        w.write_record(["id", "time", "values"])?;
        for r in generator.readings() {
            w.serialize(DataRow {
                id: r.sensor_id,
                time: r.time_label(),
                values: format!("{:.1}", r.speed),
            })?;
            rows += 1;
        }
        Ok(())
    })
    .map_err(SimError::CannotSave)?;

    debug_assert_eq!(rows, expected);
    info!(rows, "Speed data saved");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::parse_line;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::fs;

    fn config(sensors: u32, sampling: u32, duration: u32) -> SimConfig {
        SimConfig {
            sensors,
            sampling,
            duration,
            ..SimConfig::new(NaiveTime::from_hms_opt(10, 0, 0).unwrap())
        }
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        assert!(matches!(config(0, 10, 30).validate(), Err(SimError::InvalidSensorCount)));
        assert!(matches!(config(1, 0, 30).validate(), Err(SimError::InvalidSampling)));
        assert!(matches!(config(1, 10, 0).validate(), Err(SimError::InvalidDuration)));
    }

    #[test]
    fn test_validate_duration_shorter_than_sampling() {
        assert!(matches!(
            config(1, 60, 30).validate(),
            Err(SimError::DurationShorterThanSampling)
        ));
        assert!(config(1, 30, 30).validate().is_ok());
    }

    #[test]
    fn test_validate_speed_band() {
        let mut c = config(1, 10, 30);
        c.min_speed = 1600;
        c.max_speed = 900;
        assert!(matches!(c.validate(), Err(SimError::InvalidArgument)));
        c.min_speed = 0;
        c.max_speed = 3001;
        assert!(matches!(c.validate(), Err(SimError::InvalidArgument)));
    }

    #[test]
    fn test_row_count() {
        assert_eq!(config(2, 10, 30).row_count(), 8);
        assert_eq!(config(3, 10, 35).row_count(), 12);
        assert_eq!(config(1, 10, 3600).row_count(), 361);
    }

    #[test]
    fn test_readings_tick_then_sensor_order() {
        let generator = Generator::new(config(2, 10, 30), StdRng::seed_from_u64(7)).unwrap();
        let readings: Vec<Reading> = generator.readings().collect();

        assert_eq!(readings.len(), 8);
        let ids: Vec<u32> = readings.iter().map(|r| r.sensor_id).collect();
        assert_eq!(ids, vec![1, 2, 1, 2, 1, 2, 1, 2]);
        let labels: Vec<String> = readings.iter().step_by(2).map(Reading::time_label).collect();
        assert_eq!(labels, vec!["10:00:00", "10:00:10", "10:00:20", "10:00:30"]);
    }

    #[test]
    fn test_speeds_stay_in_band_with_tenth_precision() {
        let mut c = config(4, 1, 500);
        c.min_speed = 900;
        c.max_speed = 1600;
        let generator = Generator::new(c, StdRng::seed_from_u64(1)).unwrap();

        for r in generator.readings() {
            assert!((900.0..1600.0).contains(&r.speed));
            let tenths = r.speed * 10.0;
            assert!((tenths - tenths.round()).abs() < 1e-6);
        }
    }

    #[test]
    fn test_time_wraps_past_midnight() {
        let mut c = config(1, 10, 20);
        c.start = NaiveTime::from_hms_opt(23, 59, 55).unwrap();
        let generator = Generator::new(c, StdRng::seed_from_u64(3)).unwrap();
        let labels: Vec<String> = generator.readings().map(|r| r.time_label()).collect();
        assert_eq!(labels, vec!["23:59:55", "00:00:05", "00:00:15"]);
    }

    #[test]
    fn test_same_seed_same_data() {
        let a: Vec<Reading> = Generator::new(config(2, 5, 50), StdRng::seed_from_u64(42))
            .unwrap()
            .readings()
            .collect();
        let b: Vec<Reading> = Generator::new(config(2, 5, 50), StdRng::seed_from_u64(42))
            .unwrap()
            .readings()
            .collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_write_data_produces_parseable_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("speed_data.csv");
        let generator = Generator::new(config(2, 10, 30), StdRng::seed_from_u64(9)).unwrap();

        let rows = write_data(&path, generator).unwrap();
        assert_eq!(rows, 8);

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("id,time,values"));
        let parsed: Vec<Reading> = lines.map(|l| parse_line(l).unwrap()).collect();
        assert_eq!(parsed.len(), 8);
    }

    #[test]
    fn test_write_data_unwritable_destination() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("speed_data.csv");
        let generator = Generator::new(config(1, 10, 10), StdRng::seed_from_u64(0)).unwrap();

        let err = write_data(&path, generator).unwrap_err();
        assert!(matches!(err, SimError::CannotSave(_)));
    }
}
