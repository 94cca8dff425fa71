//! The owned per-frame step.
//!
//! A [`MonitoringSession`] holds the smoothing window, the fall gate and the
//! session tracker for one monitoring run. Nothing else mutates them; a fresh
//! session per run (or per test) starts from a clean slate.

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, warn};

use crate::clock::SimulatedClock;
use crate::config::Config;
use crate::error::ConfigError;
use crate::fall_gate::FallGate;
use crate::keypoints::KeypointSet;
use crate::posture::{PostureClassifier, PostureLabel};
use crate::smoothing::{SmoothingWindow, StableLabel};
use crate::tracker::{SessionEvent, SessionTracker};

/// Live notifications that are not session events.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Alert {
    /// Continuous sitting reached the configured limit.
    ProlongedSitting {
        since: NaiveDateTime,
        sitting_minutes: f64,
    },
}

/// Everything one frame produced.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub timestamp_ms: u64,
    pub simulated_at: NaiveDateTime,
    /// Classifier output for this frame; `None` when no body was found.
    pub instantaneous: Option<PostureLabel>,
    /// Label the smoothing window currently holds.
    pub stable: Option<PostureLabel>,
    /// Raw gate output: the person is falling right now.
    pub fall_confirmed: bool,
    /// Posture the tracker has confirmed.
    pub posture: PostureLabel,
    pub event: Option<SessionEvent>,
    pub alert: Option<Alert>,
}

#[derive(Debug, Clone)]
pub struct MonitoringSession {
    classifier: PostureClassifier,
    window: SmoothingWindow,
    gate: FallGate,
    tracker: SessionTracker,
    clock: SimulatedClock,
    prolonged_sitting_secs: f64,
    sitting_alerted_for: Option<NaiveDateTime>,
}

impl MonitoringSession {
    /// Starts a session at media time `started_ms` using the clock the
    /// config describes. Out-of-range configuration is rejected.
    pub fn new(config: &Config, started_ms: u64) -> Result<Self, ConfigError> {
        Self::with_clock(config, config.clock.clock(), started_ms)
    }

    pub fn with_clock(
        config: &Config,
        clock: SimulatedClock,
        started_ms: u64,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if !clock.scale().is_finite() || clock.scale() <= 0.0 {
            return Err(ConfigError::invalid_value(
                "clock.speed",
                format!("must be a finite positive number, got scale {}", clock.scale()),
            ));
        }

        Ok(Self {
            classifier: PostureClassifier::new(config.thresholds),
            window: SmoothingWindow::new(config.smoothing.window_size, config.smoothing.quorum),
            gate: FallGate::new(config.session.fall_confirm_delay_ms),
            tracker: SessionTracker::new(clock.at(started_ms), config.session.min_session_seconds),
            clock,
            prolonged_sitting_secs: config.session.prolonged_sitting_minutes * 60.0,
            sitting_alerted_for: None,
        })
    }

    pub fn clock(&self) -> &SimulatedClock {
        &self.clock
    }

    pub fn tracker(&self) -> &SessionTracker {
        &self.tracker
    }

    pub fn current_posture(&self) -> PostureLabel {
        self.tracker.current()
    }

    /// Process one frame. A frame without a body leaves the window, gate and
    /// tracker untouched.
    pub fn step(&mut self, keypoints: Option<&KeypointSet>, timestamp_ms: u64) -> StepOutcome {
        let simulated_at = self.clock.at(timestamp_ms);
        let instantaneous = self.classifier.classify_frame(keypoints);

        let mut fall_confirmed = false;
        let mut event = None;

        if let Some(label) = instantaneous {
            fall_confirmed = self.gate.observe(label, timestamp_ms);
            self.window.push(label, timestamp_ms);
            debug!(label = %label, at_ms = timestamp_ms, "frame classified");

            if let Some(stable) = self.window.stable() {
                event = self.apply_stable(stable, fall_confirmed);
            }
        }

        let alert = self.check_prolonged_sitting(simulated_at);

        StepOutcome {
            timestamp_ms,
            simulated_at,
            instantaneous,
            stable: self.window.stable().map(|s| s.label),
            fall_confirmed,
            posture: self.tracker.current(),
            event,
            alert,
        }
    }

    /// Hands a smoothed label to the tracker. Entering `falling` also needs
    /// the gate; leaving it does not. Changes are anchored at the first frame
    /// of the run that produced them.
    fn apply_stable(&mut self, stable: StableLabel, fall_confirmed: bool) -> Option<SessionEvent> {
        if stable.label == self.tracker.current() {
            return None;
        }

        let since_ms = if stable.label == PostureLabel::Falling {
            if !fall_confirmed {
                return None;
            }
            self.gate.candidate_since().unwrap_or(stable.since_ms)
        } else {
            stable.since_ms
        };

        let at = self.clock.at(since_ms);
        let event = self.tracker.on_stable_label(stable.label, at);

        if self.tracker.current() == PostureLabel::Falling {
            warn!(since = %at, "fall confirmed");
        }
        event
    }

    fn check_prolonged_sitting(&mut self, now: NaiveDateTime) -> Option<Alert> {
        if self.tracker.current() != PostureLabel::Sitting {
            return None;
        }

        let since = self.tracker.started_at();
        if self.sitting_alerted_for == Some(since) {
            return None;
        }

        let elapsed = self.tracker.elapsed_seconds(now);
        if elapsed < self.prolonged_sitting_secs {
            return None;
        }

        self.sitting_alerted_for = Some(since);
        warn!(since = %since, minutes = elapsed / 60.0, "prolonged sitting");
        Some(Alert::ProlongedSitting {
            since,
            sitting_minutes: elapsed / 60.0,
        })
    }
}
