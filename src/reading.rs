//! Sensor readings and the CSV line parser.

use chrono::{NaiveTime, Timelike};

/// Largest speed value accepted by the parser.
pub const MAX_SPEED: f64 = 3000.0;

/// One sensor sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub sensor_id: u32,
    pub time: NaiveTime,
    pub speed: f64,
}

impl Reading {
    pub fn new(sensor_id: u32, time: NaiveTime, speed: f64) -> Self {
        Self {
            sensor_id,
            time,
            speed,
        }
    }

    /// Seconds elapsed since midnight of the (assumed single) simulation day.
    pub fn seconds_of_day(&self) -> i64 {
        i64::from(self.time.num_seconds_from_midnight())
    }

    /// `HH:MM:SS` form of the timestamp.
    pub fn time_label(&self) -> String {
        self.time.format("%H:%M:%S").to_string()
    }
}

/// Signed seconds from `start` to `end`.
///
/// Both readings are assumed to belong to the same day: a pair that crosses
/// midnight yields a negative value.
pub fn elapsed_seconds(start: &Reading, end: &Reading) -> i64 {
    end.seconds_of_day() - start.seconds_of_day()
}

/// Formats a non-negative number of seconds as `HH:MM:SS`.
///
/// Hours are not wrapped at 24.
pub fn format_hms(total_seconds: i64) -> String {
    let total = total_seconds.max(0);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Why a line could not be turned into a [`Reading`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineDefect {
    /// A field is absent or empty. The line is skipped.
    MissingField,
    /// A field is malformed or out of its domain. The whole load aborts.
    InvalidFormat,
}

/// Parses one `id,HH:MM:SS,speed` data line.
///
/// A [`Reading`] is only produced when every field is present and valid.
pub fn parse_line(line: &str) -> Result<Reading, LineDefect> {
    let fields: Vec<&str> = line.trim_end_matches('\r').split(',').map(str::trim).collect();

    if fields.len() < 3 || fields.iter().take(3).any(|f| f.is_empty()) {
        return Err(LineDefect::MissingField);
    }
    if fields.len() > 3 {
        return Err(LineDefect::InvalidFormat);
    }

    let sensor_id = parse_sensor_id(fields[0])?;
    let time = parse_time(fields[1])?;
    let speed = parse_speed(fields[2])?;

    Ok(Reading::new(sensor_id, time, speed))
}

fn parse_sensor_id(field: &str) -> Result<u32, LineDefect> {
    match field.parse::<u32>() {
        Ok(id) if id >= 1 => Ok(id),
        _ => Err(LineDefect::InvalidFormat),
    }
}

fn parse_time(field: &str) -> Result<NaiveTime, LineDefect> {
    let parts: Vec<&str> = field.split(':').collect();
    if parts.len() != 3 {
        return Err(LineDefect::InvalidFormat);
    }

    let mut hms = [0u32; 3];
    for (slot, part) in hms.iter_mut().zip(&parts) {
        *slot = part.parse().map_err(|_| LineDefect::InvalidFormat)?;
    }

    NaiveTime::from_hms_opt(hms[0], hms[1], hms[2]).ok_or(LineDefect::InvalidFormat)
}

fn parse_speed(field: &str) -> Result<f64, LineDefect> {
    match field.parse::<f64>() {
        Ok(speed) if speed.is_finite() && (0.0..=MAX_SPEED).contains(&speed) => Ok(speed),
        _ => Err(LineDefect::InvalidFormat),
    }
}
