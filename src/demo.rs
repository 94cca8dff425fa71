//! Canned analysis for configured demo clips.
//!
//! Demo sessions are described by configuration rather than detected, which
//! makes this the only place `laying` is produced.

use serde::Serialize;
use uuid::Uuid;

use crate::clock::{format_clock, format_duration, SimulatedClock};
use crate::posture::PostureLabel;
use crate::tracker::SessionEvent;

/// Media offset at which the configured event is placed.
pub const DEMO_EVENT_OFFSET_MS: u64 = 45_000;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemoAnalysis {
    pub summary: String,
    pub events: Vec<SessionEvent>,
}

pub fn analyze(event_type: PostureLabel, clock: &SimulatedClock) -> DemoAnalysis {
    let summary = match event_type {
        PostureLabel::Sitting => {
            "Prolonged sitting detected in the clip. Long unbroken sitting raises the risk of \
             office syndrome; a reminder to move is recommended."
        }
        PostureLabel::Falling => {
            "Fall detected 45 seconds into the clip. This is a critical event; a snapshot was \
             recorded and an alert raised immediately."
        }
        PostureLabel::Laying => {
            "Laying down detected. This may be normal rest or a health emergency; the lying \
             time will be watched against the configured limit."
        }
        PostureLabel::Standing | PostureLabel::Unknown => {
            return DemoAnalysis {
                summary: "No notable event detected in the clip.".to_string(),
                events: Vec::new(),
            };
        }
    };

    let started_at = clock.at(DEMO_EVENT_OFFSET_MS);
    tracing::info!(event = %event_type, at = %started_at, "demo analysis produced an event");

    DemoAnalysis {
        summary: summary.to_string(),
        events: vec![SessionEvent {
            id: Uuid::new_v4(),
            posture: event_type,
            started_at,
            timestamp: format_clock(started_at),
            duration_seconds: 0.0,
            duration: format_duration(0.0),
            is_critical: event_type == PostureLabel::Falling,
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::anchor_from_parts;

    fn clock() -> SimulatedClock {
        SimulatedClock::from_speed(anchor_from_parts("2024-01-01", "08:00").unwrap(), 2.0)
    }

    #[test]
    fn laying_comes_from_configuration() {
        let analysis = analyze(PostureLabel::Laying, &clock());
        assert_eq!(analysis.events.len(), 1);
        let event = &analysis.events[0];
        assert_eq!(event.posture, PostureLabel::Laying);
        assert!(!event.is_critical);
        // 45 media seconds at 2 simulated minutes per second.
        assert_eq!(event.timestamp, "09:30");
    }

    #[test]
    fn configured_fall_is_critical() {
        let analysis = analyze(PostureLabel::Falling, &clock());
        assert!(analysis.events[0].is_critical);
        assert!(analysis.summary.contains("critical"));
    }

    #[test]
    fn standing_produces_no_event() {
        assert!(analyze(PostureLabel::Standing, &clock()).events.is_empty());
    }
}
