//! Posture and fall classification over a stream of body keypoints.
//!
//! Each frame's keypoints are classified from their geometry, smoothed over a
//! short window, gated for falls, and turned into timed posture sessions. The
//! pose model, the camera and any rendering stay outside the crate: frames
//! arrive through [`source::FrameSource`], landmarks through
//! [`inference::PoseEstimator`], and results leave through [`sink::EventSink`].
//!
//! ```no_run
//! use fall_sentinel::{Config, Monitor, PostureStats, RecordedPoseEstimator, Recording};
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut monitor = Monitor::new(Config::default(), 30)?;
//! let mut stats = PostureStats::new();
//! let mut recording = Recording::open("session.jsonl")?;
//! monitor.run(&mut recording, &mut RecordedPoseEstimator, &mut stats)?;
//! println!("{stats}");
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod config;
pub mod demo;
pub mod error;
pub mod fall_gate;
pub mod geometry;
pub mod inference;
pub mod keypoints;
pub mod monitor;
pub mod overlay;
pub mod posture;
pub mod session;
pub mod sink;
pub mod smoothing;
pub mod source;
pub mod stats;
pub mod tracker;

pub use clock::SimulatedClock;
pub use config::Config;
pub use error::{ConfigError, KeypointError};
pub use inference::{PoseEstimator, RecordedPose, RecordedPoseEstimator};
pub use keypoints::{Keypoint, KeypointSet, LANDMARK_COUNT};
pub use monitor::{FrameMetrics, Monitor, RunSummary, StopHandle, StopReason};
pub use posture::{PostureClassifier, PostureLabel, Thresholds};
pub use session::{Alert, MonitoringSession, StepOutcome};
pub use sink::{EventSink, JsonLinesSink};
pub use source::{Frame, FrameIter, FrameSource, Recording};
pub use stats::PostureStats;
pub use tracker::{SessionEvent, SessionTracker};
