//! Mapping from media time to the simulated wall clock.
//!
//! A short clip can stand in for a long monitoring period: with a speed
//! multiplier of `s`, one second of media time is `s` simulated minutes.
//! The anchor is fixed when the clock is built and never re-derived, so the
//! displayed clock cannot drift while a session runs.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatedClock {
    anchor: NaiveDateTime,
    /// Simulated seconds per media second.
    scale: f64,
}

impl SimulatedClock {
    /// `speed_multiplier` is simulated minutes per media second.
    pub fn from_speed(anchor: NaiveDateTime, speed_multiplier: f64) -> Self {
        Self {
            anchor,
            scale: speed_multiplier * 60.0,
        }
    }

    /// One media second is one simulated second.
    pub fn real_time(anchor: NaiveDateTime) -> Self {
        Self { anchor, scale: 1.0 }
    }

    pub fn anchor(&self) -> NaiveDateTime {
        self.anchor
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Simulated instant for a media timestamp in milliseconds.
    pub fn at(&self, elapsed_ms: u64) -> NaiveDateTime {
        let simulated_ms = (elapsed_ms as f64 * self.scale).round();
        Duration::try_milliseconds(simulated_ms as i64)
            .and_then(|delta| self.anchor.checked_add_signed(delta))
            .unwrap_or(NaiveDateTime::MAX)
    }

    /// Simulated instant for elapsed media seconds.
    pub fn at_secs(&self, elapsed_secs: f64) -> NaiveDateTime {
        self.at((elapsed_secs.max(0.0) * 1_000.0).round() as u64)
    }
}

/// Builds an anchor from a calendar date (`YYYY-MM-DD`) and a start time
/// (`HH:MM`).
pub fn anchor_from_parts(date: &str, start_time: &str) -> Result<NaiveDateTime, ConfigError> {
    let day = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|e| {
        ConfigError::InvalidAnchor {
            input: date.to_string(),
            reason: e.to_string(),
        }
    })?;
    let time = NaiveTime::parse_from_str(start_time.trim(), "%H:%M").map_err(|e| {
        ConfigError::InvalidAnchor {
            input: start_time.to_string(),
            reason: e.to_string(),
        }
    })?;
    Ok(day.and_time(time))
}

/// `HH:MM`, as shown in the event list.
pub fn format_clock(at: NaiveDateTime) -> String {
    at.format("%H:%M").to_string()
}

/// `"{m}m {s}s"`, with an `"{h}h "` prefix from one hour upwards.
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m {secs}s")
    } else {
        format!("{minutes}m {secs}s")
    }
}

/// Playback position as `MM:SS`.
pub fn format_playback(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Playback progress in percent, clamped to [0, 100].
pub fn progress_percent(elapsed_secs: f64, duration_secs: f64) -> f64 {
    let duration = if duration_secs > 0.0 { duration_secs } else { 1.0 };
    (elapsed_secs / duration * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eight_am() -> NaiveDateTime {
        anchor_from_parts("2024-01-01", "08:00").unwrap()
    }

    #[test]
    fn speed_scales_media_seconds_to_simulated_minutes() {
        let clock = SimulatedClock::from_speed(eight_am(), 5.0);
        let expected = anchor_from_parts("2024-01-01", "13:00").unwrap();
        assert_eq!(clock.at_secs(60.0), expected);
        assert_eq!(clock.at(60_000), expected);
    }

    #[test]
    fn clock_is_monotonic() {
        let clock = SimulatedClock::from_speed(eight_am(), 2.5);
        let mut last = clock.at(0);
        for ms in (0..120_000).step_by(250) {
            let now = clock.at(ms);
            assert!(now >= last);
            last = now;
        }
        assert_eq!(clock.at(0), clock.anchor());
    }

    #[test]
    fn real_time_clock_is_one_to_one() {
        let clock = SimulatedClock::real_time(eight_am());
        assert_eq!(clock.at(90_000), eight_am() + Duration::seconds(90));
    }

    #[test]
    fn bad_anchor_parts_are_rejected() {
        assert!(anchor_from_parts("2024-13-01", "08:00").is_err());
        assert!(anchor_from_parts("2024-01-01", "8am").is_err());
    }

    #[test]
    fn formats_durations_like_the_event_list() {
        assert_eq!(format_duration(2.9), "0m 2s");
        assert_eq!(format_duration(65.0), "1m 5s");
        assert_eq!(format_duration(3_725.0), "1h 2m 5s");
    }

    #[test]
    fn formats_playback_and_progress() {
        assert_eq!(format_playback(125.7), "02:05");
        assert_eq!(format_clock(eight_am()), "08:00");
        assert_eq!(progress_percent(150.0, 300.0), 50.0);
        assert_eq!(progress_percent(400.0, 300.0), 100.0);
        assert_eq!(progress_percent(0.5, 0.0), 50.0);
    }
}
