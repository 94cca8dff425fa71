use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::clock::{anchor_from_parts, SimulatedClock};
use crate::error::ConfigError;
use crate::posture::Thresholds;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub thresholds: Thresholds,
    pub smoothing: SmoothingConfig,
    pub session: SessionConfig,
    pub clock: ClockConfig,
    pub overlay: OverlayConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    pub window_size: usize,
    /// Newest entries that must agree before a label is stable.
    pub quorum: usize,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            window_size: 5,
            quorum: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub fall_confirm_delay_ms: u64,
    /// Sessions must be strictly longer than this to be logged.
    pub min_session_seconds: f64,
    /// Simulated minutes of continuous sitting before an alert is raised.
    pub prolonged_sitting_minutes: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            fall_confirm_delay_ms: 5_000,
            min_session_seconds: 2.0,
            prolonged_sitting_minutes: 45.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Simulated wall-clock time at media time zero. Defaults to 08:00
    /// today, local time.
    pub start: NaiveDateTime,
    /// Simulated minutes per media second. Absent means real time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    /// Length of the clip; monitoring stops when playback reaches it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_duration_seconds: Option<f64>,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            start: Local::now()
                .date_naive()
                .and_hms_opt(8, 0, 0)
                .unwrap_or_default(),
            speed: None,
            video_duration_seconds: None,
        }
    }
}

impl ClockConfig {
    pub fn with_start_parts(mut self, date: &str, start_time: &str) -> Result<Self, ConfigError> {
        self.start = anchor_from_parts(date, start_time)?;
        Ok(self)
    }

    /// Builds the session clock. Called once per session; the anchor is
    /// copied into the clock and never read back from the config.
    pub fn clock(&self) -> SimulatedClock {
        match self.speed {
            Some(speed) => SimulatedClock::from_speed(self.start, speed),
            None => SimulatedClock::real_time(self.start),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Keypoints below this visibility are not drawn. Not used for
    /// classification.
    pub min_visibility: f32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            min_visibility: 0.5,
        }
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::invalid_value(
            field,
            format!("must be a finite non-negative number, got {value}"),
        ));
    }
    Ok(())
}

fn at_most(field: &'static str, value: f64, max: f64) -> Result<(), ConfigError> {
    non_negative(field, value)?;
    if value > max {
        return Err(ConfigError::invalid_value(
            field,
            format!("must be at most {max}, got {value}"),
        ));
    }
    Ok(())
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::invalid_value(
            field,
            format!("must be a finite positive number, got {value}"),
        ));
    }
    Ok(())
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("writing config {}", path.display()))?;
        Ok(())
    }

    /// Rejects out-of-range values. Nothing is clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.thresholds;
        at_most("thresholds.fall_angle", t.fall_angle as f64, 90.0)?;
        at_most("thresholds.standing_angle", t.standing_angle as f64, 90.0)?;
        at_most("thresholds.leg_straightness", t.leg_straightness as f64, 180.0)?;
        non_negative("thresholds.flat_aspect_ratio", t.flat_aspect_ratio as f64)?;
        non_negative("thresholds.standing_aspect_ratio", t.standing_aspect_ratio as f64)?;

        let s = &self.smoothing;
        if s.window_size == 0 {
            return Err(ConfigError::invalid_value("smoothing.window_size", "must be > 0"));
        }
        if s.quorum == 0 {
            return Err(ConfigError::invalid_value("smoothing.quorum", "must be > 0"));
        }
        if s.quorum > s.window_size {
            return Err(ConfigError::invalid_value(
                "smoothing.quorum",
                format!("must not exceed window_size ({})", s.window_size),
            ));
        }

        non_negative("session.min_session_seconds", self.session.min_session_seconds)?;
        positive(
            "session.prolonged_sitting_minutes",
            self.session.prolonged_sitting_minutes,
        )?;

        if let Some(speed) = self.clock.speed {
            positive("clock.speed", speed)?;
        }
        if let Some(duration) = self.clock.video_duration_seconds {
            positive("clock.video_duration_seconds", duration)?;
        }

        at_most("overlay.min_visibility", self.overlay.min_visibility as f64, 1.0)?;
        Ok(())
    }
}
