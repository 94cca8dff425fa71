//! Per-posture aggregation of emitted events, as shown on the statistics
//! screen.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::clock::format_duration;
use crate::posture::PostureLabel;
use crate::session::Alert;
use crate::sink::EventSink;
use crate::tracker::SessionEvent;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PostureTotals {
    pub sessions: usize,
    pub seconds: f64,
}

const MINUTES_PER_DAY: u32 = 24 * 60;

/// What a stretch of the day timeline shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineState {
    Posture(PostureLabel),
    /// Later today; nothing can be known yet.
    Future,
}

/// A run of minutes in one state, starting `start_minute` after midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineSegment {
    pub state: TimelineState,
    pub start_minute: u32,
    pub minutes: u32,
}

#[derive(Debug, Clone, Default)]
pub struct PostureStats {
    totals: HashMap<PostureLabel, PostureTotals>,
    starts: Vec<(NaiveDateTime, PostureLabel)>,
    alerts: usize,
}

impl PostureStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: &SessionEvent) {
        let entry = self.totals.entry(event.posture).or_default();
        entry.sessions += 1;
        entry.seconds += event.duration_seconds;
        self.starts.push((event.started_at, event.posture));
    }

    pub fn totals(&self, posture: PostureLabel) -> PostureTotals {
        self.totals.get(&posture).copied().unwrap_or_default()
    }

    pub fn fall_count(&self) -> usize {
        self.totals(PostureLabel::Falling).sessions
    }

    /// Sitting plus laying.
    pub fn relax_seconds(&self) -> f64 {
        self.totals(PostureLabel::Sitting).seconds + self.totals(PostureLabel::Laying).seconds
    }

    /// Number of sitting and laying sessions.
    pub fn relax_sessions(&self) -> usize {
        self.totals(PostureLabel::Sitting).sessions + self.totals(PostureLabel::Laying).sessions
    }

    /// Days that have at least one event, oldest first.
    pub fn days(&self) -> Vec<NaiveDate> {
        self.starts
            .iter()
            .map(|(at, _)| at.date())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Minute-resolution posture timeline for `day`.
    ///
    /// Each event's posture holds from its start until the next event starts.
    /// Time before the first event is `unknown`. The last posture runs until
    /// `now` when given (the day is in progress, the rest is
    /// [`TimelineState::Future`]), otherwise until midnight.
    pub fn timeline(&self, day: NaiveDate, now: Option<NaiveTime>) -> Vec<TimelineSegment> {
        let mut starts: Vec<(u32, PostureLabel)> = self
            .starts
            .iter()
            .filter(|(at, _)| at.date() == day)
            .map(|(at, posture)| (at.hour() * 60 + at.minute(), *posture))
            .collect();
        starts.sort_by_key(|(minute, _)| *minute);

        let mut segments = Vec::new();
        let mut cursor = 0;
        let mut state = PostureLabel::Unknown;
        let mut push = |state: TimelineState, from: u32, to: u32| {
            if to > from {
                segments.push(TimelineSegment {
                    state,
                    start_minute: from,
                    minutes: to - from,
                });
            }
        };

        for (minute, posture) in starts {
            push(TimelineState::Posture(state), cursor, minute);
            cursor = minute;
            state = posture;
        }

        let limit = now.map_or(MINUTES_PER_DAY, |t| t.hour() * 60 + t.minute());
        if cursor < limit {
            push(TimelineState::Posture(state), cursor, limit);
            cursor = limit;
        }
        if now.is_some() {
            push(TimelineState::Future, cursor, MINUTES_PER_DAY);
        }
        segments
    }

    pub fn alert_count(&self) -> usize {
        self.alerts
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }
}

impl EventSink for PostureStats {
    fn emit(&mut self, event: SessionEvent) {
        self.record(&event);
    }

    fn alert(&mut self, _alert: &Alert) {
        self.alerts += 1;
    }
}

impl fmt::Display for PostureStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for posture in [
            PostureLabel::Standing,
            PostureLabel::Sitting,
            PostureLabel::Laying,
            PostureLabel::Falling,
        ] {
            let t = self.totals(posture);
            writeln!(
                f,
                "{:<9} {:>3} sessions  {}",
                posture.as_str(),
                t.sessions,
                format_duration(t.seconds)
            )?;
        }
        writeln!(
            f,
            "relax     {:>3} sessions  {}",
            self.relax_sessions(),
            format_duration(self.relax_seconds())
        )?;
        write!(f, "falls     {}  alerts {}", self.fall_count(), self.alerts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::SessionTracker;
    use chrono::Duration;
    use PostureLabel::{Falling, Sitting, Standing};

    fn events() -> Vec<SessionEvent> {
        let start = crate::clock::anchor_from_parts("2024-01-01", "08:00").unwrap();
        let mut tracker = SessionTracker::new(start, 2.0);
        let mut out = Vec::new();
        let mut t = 0;
        for (label, secs) in [(Sitting, 10), (Falling, 60), (Standing, 8), (Sitting, 30), (Standing, 20)] {
            t += secs;
            out.extend(tracker.on_stable_label(label, start + Duration::seconds(t)));
        }
        out
    }

    #[test]
    fn aggregates_by_ended_posture() {
        let mut stats = PostureStats::new();
        for e in events() {
            stats.emit(e);
        }
        assert_eq!(stats.totals(Standing).sessions, 2);
        assert_eq!(stats.totals(Standing).seconds, 10.0 + 30.0);
        assert_eq!(stats.totals(Sitting).seconds, 60.0 + 20.0);
        assert_eq!(stats.fall_count(), 1);
        assert_eq!(stats.relax_seconds(), 80.0);
    }

    #[test]
    fn relax_counts_sitting_sessions() {
        let mut stats = PostureStats::new();
        for e in events() {
            stats.emit(e);
        }
        assert_eq!(stats.relax_sessions(), 2);
    }

    fn event_at(posture: PostureLabel, hh_mm: &str) -> SessionEvent {
        let start = crate::clock::anchor_from_parts("2024-01-01", hh_mm).unwrap();
        SessionEvent {
            id: uuid::Uuid::new_v4(),
            posture,
            started_at: start,
            timestamp: crate::clock::format_clock(start),
            duration_seconds: 60.0,
            duration: format_duration(60.0),
            is_critical: posture == Falling,
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn past_day_timeline_runs_to_midnight() {
        let mut stats = PostureStats::new();
        stats.emit(event_at(Sitting, "09:00"));
        stats.emit(event_at(Standing, "08:00"));
        stats.emit(event_at(Falling, "10:30"));

        let timeline = stats.timeline(day(), None);
        let states: Vec<_> = timeline.iter().map(|s| (s.state, s.start_minute, s.minutes)).collect();
        assert_eq!(
            states,
            vec![
                (TimelineState::Posture(PostureLabel::Unknown), 0, 480),
                (TimelineState::Posture(Standing), 480, 60),
                (TimelineState::Posture(Sitting), 540, 90),
                (TimelineState::Posture(Falling), 630, 810),
            ]
        );
        assert_eq!(timeline.iter().map(|s| s.minutes).sum::<u32>(), 24 * 60);
    }

    #[test]
    fn today_timeline_stops_at_now() {
        let mut stats = PostureStats::new();
        stats.emit(event_at(Sitting, "09:00"));

        let now = NaiveTime::from_hms_opt(12, 0, 0).unwrap();
        let timeline = stats.timeline(day(), Some(now));
        assert_eq!(timeline.len(), 3);
        assert_eq!(timeline[1].state, TimelineState::Posture(Sitting));
        assert_eq!(timeline[1].minutes, 180);
        assert_eq!(timeline[2].state, TimelineState::Future);
        assert_eq!(timeline[2].start_minute, 720);
        assert_eq!(stats.days(), vec![day()]);
    }

    #[test]
    fn day_without_events_is_unknown() {
        let stats = PostureStats::new();
        assert!(stats.is_empty());
        let timeline = stats.timeline(day(), None);
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline[0].state, TimelineState::Posture(PostureLabel::Unknown));
    }

    #[test]
    fn summary_lists_every_posture() {
        let mut stats = PostureStats::new();
        for e in events() {
            stats.emit(e);
        }
        let text = stats.to_string();
        assert!(text.contains("falling"));
        assert!(text.contains("laying"));
        assert!(text.contains("falls     1"));
    }
}
