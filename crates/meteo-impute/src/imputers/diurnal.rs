//! Time-of-day adjustment for temperature fallbacks.

use chrono::{NaiveDateTime, Timelike};

const MINUTES_PER_DAY: u64 = 1440;

/// Offset added to the base fallback during daytime hours.
pub const DAYTIME_OFFSET: f64 = 3.0;
/// Offset added to the base fallback outside daytime hours.
pub const NIGHTTIME_OFFSET: f64 = -2.0;

/// Datetime layouts seen in station exports, tried in order.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%m/%d/%y %I:%M %p",
    "%m/%d/%Y %I:%M %p",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M",
];

/// Estimates the hour of day from a row index and a fixed sample cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiurnalClock {
    interval_minutes: u32,
}

impl DiurnalClock {
    pub fn new(interval_minutes: u32) -> Self {
        Self { interval_minutes }
    }

    /// Hour of day (0-23) for a 0-based row index.
    pub fn hour_of(&self, row: usize) -> u32 {
        let minutes = (row as u64).wrapping_mul(u64::from(self.interval_minutes)) % MINUTES_PER_DAY;
        (minutes / 60) as u32
    }
}

/// Daytime is [06:00, 18:00).
pub fn is_daytime(hour: u32) -> bool {
    (6..18).contains(&hour)
}

/// Offset applied to a diurnal sensor's fallback at the given hour.
pub fn diurnal_offset(hour: u32) -> f64 {
    if is_daytime(hour) {
        DAYTIME_OFFSET
    } else {
        NIGHTTIME_OFFSET
    }
}

/// Hour of day from a station timestamp cell, if it parses.
pub fn hour_from_timestamp(text: &str) -> Option<u32> {
    let text = text.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|dt| dt.hour())
}
