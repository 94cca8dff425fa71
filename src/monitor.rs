//! The single processing loop.
//!
//! One iteration per available frame: read, estimate, step the session,
//! hand off output. Iterations never overlap, and there is no queue: a slow
//! estimator simply sees fewer frames. Stopping is checked before each
//! iteration and again after inference, so a result that arrives after
//! [`StopHandle::stop`] is discarded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::ConfigError;
use crate::inference::PoseEstimator;
use crate::keypoints::KeypointSet;
use crate::posture::PostureLabel;
use crate::session::{MonitoringSession, StepOutcome};
use crate::sink::EventSink;
use crate::source::FrameSource;

/// Consecutive source failures tolerated before the run is abandoned.
const MAX_CONSECUTIVE_SOURCE_ERRORS: u32 = 16;

/// Cancels a running [`Monitor`] from any thread.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameMetrics {
    pub total_frames: u64,
    pub frames_without_body: u64,
    pub failed_frames: u64,
    pub deadline_misses: u64,
    pub worst_case: Duration,
}

impl FrameMetrics {
    fn record(&mut self, elapsed: Duration, budget: Duration, body_found: bool) {
        self.total_frames += 1;
        if !body_found {
            self.frames_without_body += 1;
        }
        if elapsed > budget {
            self.deadline_misses += 1;
        }
        if elapsed > self.worst_case {
            self.worst_case = elapsed;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndOfStream,
    EndOfClip,
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub metrics: FrameMetrics,
    pub stop_reason: StopReason,
    pub final_posture: Option<PostureLabel>,
    pub events_emitted: u64,
}

pub struct Monitor {
    config: Config,
    frame_budget: Duration,
    pace: bool,
    stop: StopHandle,
}

impl Monitor {
    /// Rejects out-of-range configuration before any frame is read.
    pub fn new(config: Config, fps: u32) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            frame_budget: Duration::from_millis(1_000 / fps.max(1) as u64),
            pace: false,
            stop: StopHandle::default(),
        })
    }

    /// Sleep between frames so a recording replays at its captured cadence.
    pub fn with_pacing(mut self, pace: bool) -> Self {
        self.pace = pace;
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn run<S, E, K>(&mut self, source: &mut S, estimator: &mut E, sink: &mut K) -> Result<RunSummary>
    where
        S: FrameSource,
        E: PoseEstimator<S::Payload>,
        K: EventSink,
    {
        self.run_with(source, estimator, sink, |_, _| {})
    }

    /// Like [`run`](Self::run), calling `on_step` after every processed
    /// frame with the outcome and the keypoints it was computed from.
    pub fn run_with<S, E, K, F>(
        &mut self,
        source: &mut S,
        estimator: &mut E,
        sink: &mut K,
        mut on_step: F,
    ) -> Result<RunSummary>
    where
        S: FrameSource,
        E: PoseEstimator<S::Payload>,
        K: EventSink,
        F: FnMut(&StepOutcome, Option<&KeypointSet>),
    {
        let clip_end_ms = self
            .config
            .clock
            .video_duration_seconds
            .map(|secs| (secs * 1_000.0).round() as u64);

        let mut session: Option<MonitoringSession> = None;
        let mut metrics = FrameMetrics::default();
        let mut events_emitted = 0;
        let mut source_errors = 0;
        let mut first_frame: Option<(u64, Instant)> = None;

        info!(pace = self.pace, ?clip_end_ms, "monitoring started");

        let stop_reason = loop {
            if self.stop.is_stopped() {
                break StopReason::Cancelled;
            }

            let frame = match source.read_frame() {
                Ok(Some(frame)) => {
                    source_errors = 0;
                    frame
                }
                Ok(None) => break StopReason::EndOfStream,
                Err(e) => {
                    source_errors += 1;
                    metrics.failed_frames += 1;
                    warn!(error = %e, "skipping unreadable frame");
                    if source_errors >= MAX_CONSECUTIVE_SOURCE_ERRORS {
                        bail!("frame source failed {source_errors} times in a row: {e}");
                    }
                    continue;
                }
            };
            let ts = frame.timestamp_ms;

            if clip_end_ms.is_some_and(|end| ts >= end) {
                break StopReason::EndOfClip;
            }

            if self.pace {
                let (first_ts, started) = *first_frame.get_or_insert((ts, Instant::now()));
                let due = started + Duration::from_millis(ts.saturating_sub(first_ts));
                let now = Instant::now();
                if due > now {
                    thread::sleep(due - now);
                }
            }

            let started = Instant::now();
            let estimate = estimator.estimate(&frame.payload, ts);

            if self.stop.is_stopped() {
                debug!(at_ms = ts, "discarding inference result after stop");
                break StopReason::Cancelled;
            }

            let keypoints = match estimate {
                Ok(keypoints) => keypoints,
                Err(e) => {
                    metrics.failed_frames += 1;
                    error!(at_ms = ts, error = %e, "pose estimation failed, frame skipped");
                    continue;
                }
            };

            let session = match &mut session {
                Some(session) => session,
                slot @ None => slot.insert(MonitoringSession::new(&self.config, ts)?),
            };
            let outcome = session.step(keypoints.as_ref(), ts);
            metrics.record(started.elapsed(), self.frame_budget, keypoints.is_some());

            if let Some(event) = outcome.event.clone() {
                events_emitted += 1;
                sink.emit(event);
            }
            if let Some(alert) = &outcome.alert {
                sink.alert(alert);
            }
            on_step(&outcome, keypoints.as_ref());
        };

        info!(
            reason = ?stop_reason,
            frames = metrics.total_frames,
            failed = metrics.failed_frames,
            deadline_misses = metrics.deadline_misses,
            events = events_emitted,
            "monitoring stopped"
        );

        Ok(RunSummary {
            metrics,
            stop_reason,
            final_posture: session.map(|s| s.current_posture()),
            events_emitted,
        })
    }
}
