use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::{format_clock, format_duration};
use crate::posture::PostureLabel;

/// A completed posture session, reported when the posture changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEvent {
    pub id: Uuid,
    /// The posture that just ended.
    #[serde(rename = "type")]
    pub posture: PostureLabel,
    pub started_at: NaiveDateTime,
    /// `HH:MM` of `started_at`.
    pub timestamp: String,
    pub duration_seconds: f64,
    /// Display form of `duration_seconds`.
    pub duration: String,
    pub is_critical: bool,
}

/// Holds the confirmed posture and when it began; turns confirmed changes
/// into retrospective [`SessionEvent`]s.
#[derive(Debug, Clone)]
pub struct SessionTracker {
    current: PostureLabel,
    started_at: NaiveDateTime,
    min_session_seconds: f64,
}

impl SessionTracker {
    /// Monitoring starts out assuming the person is standing.
    pub fn new(started_at: NaiveDateTime, min_session_seconds: f64) -> Self {
        Self {
            current: PostureLabel::Standing,
            started_at,
            min_session_seconds,
        }
    }

    pub fn current(&self) -> PostureLabel {
        self.current
    }

    pub fn started_at(&self) -> NaiveDateTime {
        self.started_at
    }

    /// Seconds spent in the current posture as of `now`.
    pub fn elapsed_seconds(&self, now: NaiveDateTime) -> f64 {
        ((now - self.started_at).num_milliseconds() as f64 / 1_000.0).max(0.0)
    }

    /// Apply a confirmed label. `at` is when the run of frames that produced
    /// the label began, not when it was confirmed; it becomes the new
    /// session's start. Sessions not longer than the minimum are dropped
    /// silently; the state still moves on.
    pub fn on_stable_label(&mut self, label: PostureLabel, at: NaiveDateTime) -> Option<SessionEvent> {
        if !label.is_known() || label == self.current {
            return None;
        }

        let ended = self.current;
        let duration_seconds = self.elapsed_seconds(at);

        let event = (duration_seconds > self.min_session_seconds).then(|| SessionEvent {
            id: Uuid::new_v4(),
            posture: ended,
            started_at: self.started_at,
            timestamp: format_clock(self.started_at),
            duration_seconds,
            duration: format_duration(duration_seconds),
            is_critical: ended == PostureLabel::Falling,
        });

        match &event {
            Some(e) => tracing::info!(
                ended = %ended,
                next = %label,
                duration_secs = e.duration_seconds,
                critical = e.is_critical,
                "posture session completed"
            ),
            None => tracing::debug!(
                ended = %ended,
                next = %label,
                duration_secs = duration_seconds,
                "posture session too short to log"
            ),
        }

        self.current = label;
        self.started_at = at.max(self.started_at);
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use PostureLabel::{Falling, Sitting, Standing, Unknown};

    fn start() -> NaiveDateTime {
        crate::clock::anchor_from_parts("2024-01-01", "08:00").unwrap()
    }

    fn after_ms(ms: i64) -> NaiveDateTime {
        start() + Duration::milliseconds(ms)
    }

    #[test]
    fn same_label_is_a_no_op() {
        let mut tracker = SessionTracker::new(start(), 2.0);
        assert_eq!(tracker.on_stable_label(Standing, after_ms(10_000)), None);
        assert_eq!(tracker.started_at(), start());
    }

    #[test]
    fn short_sessions_are_dropped_but_state_moves() {
        let mut tracker = SessionTracker::new(start(), 2.0);
        assert_eq!(tracker.on_stable_label(Sitting, after_ms(1_500)), None);
        assert_eq!(tracker.current(), Sitting);
        assert_eq!(tracker.started_at(), after_ms(1_500));
    }

    #[test]
    fn long_enough_session_emits_one_event() {
        let mut tracker = SessionTracker::new(start(), 2.0);
        let event = tracker.on_stable_label(Sitting, after_ms(2_100)).unwrap();
        assert_eq!(event.posture, Standing);
        assert!((event.duration_seconds - 2.1).abs() < 1e-9);
        assert!(!event.is_critical);
        assert_eq!(event.timestamp, "08:00");
        assert_eq!(event.started_at, start());
    }

    #[test]
    fn ended_fall_is_critical() {
        let mut tracker = SessionTracker::new(start(), 2.0);
        tracker.on_stable_label(Falling, after_ms(500));
        let event = tracker.on_stable_label(Standing, after_ms(6_500)).unwrap();
        assert_eq!(event.posture, Falling);
        assert!(event.is_critical);
        assert_eq!(event.duration, "0m 6s");
    }

    #[test]
    fn unknown_is_ignored() {
        let mut tracker = SessionTracker::new(start(), 2.0);
        assert_eq!(tracker.on_stable_label(Unknown, after_ms(9_000)), None);
        assert_eq!(tracker.current(), Standing);
    }

    #[test]
    fn event_ids_are_unique() {
        let mut tracker = SessionTracker::new(start(), 0.0);
        let a = tracker.on_stable_label(Sitting, after_ms(1_000)).unwrap();
        let b = tracker.on_stable_label(Standing, after_ms(2_000)).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn serialises_with_external_field_names() {
        let mut tracker = SessionTracker::new(start(), 0.0);
        let event = tracker.on_stable_label(Sitting, after_ms(3_000)).unwrap();
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "standing");
        assert_eq!(json["isCritical"], false);
        assert_eq!(json["durationSeconds"], 3.0);
    }
}
