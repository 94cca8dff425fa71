use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::keypoints::{KeypointSet, LANDMARK_COUNT};

/// Boundary to the pose model.
///
/// Implementations must not mutate the frame, may be called repeatedly, and
/// return `Ok(None)` when no body is in view. A result with the wrong number
/// of landmarks is an error, not something to pad.
pub trait PoseEstimator<F> {
    fn estimate(&mut self, frame: &F, timestamp_ms: u64) -> Result<Option<KeypointSet>>;
}

impl<F, E> PoseEstimator<F> for E
where
    E: FnMut(&F, u64) -> Result<Option<KeypointSet>>,
{
    fn estimate(&mut self, frame: &F, timestamp_ms: u64) -> Result<Option<KeypointSet>> {
        self(frame, timestamp_ms)
    }
}

/// One line of a pose recording: a timestamp and either the raw landmark
/// rows `[x, y, z, visibility]` or `null` when no body was found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedPose {
    #[serde(rename = "t")]
    pub timestamp_ms: u64,
    #[serde(default)]
    pub keypoints: Option<Vec<[f32; 4]>>,
}

impl RecordedPose {
    pub fn new(timestamp_ms: u64, keypoints: Option<&KeypointSet>) -> Self {
        Self {
            timestamp_ms,
            keypoints: keypoints.map(|ks| {
                ks.iter()
                    .map(|kp| [kp.x, kp.y, kp.z, kp.visibility])
                    .collect()
            }),
        }
    }
}

/// Replays model output captured earlier; the "frame" already holds the
/// landmarks.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordedPoseEstimator;

impl PoseEstimator<RecordedPose> for RecordedPoseEstimator {
    fn estimate(&mut self, frame: &RecordedPose, _timestamp_ms: u64) -> Result<Option<KeypointSet>> {
        let Some(rows) = frame.keypoints.as_deref() else {
            return Ok(None);
        };
        if rows.len() != LANDMARK_COUNT {
            tracing::debug!(
                at_ms = frame.timestamp_ms,
                landmarks = rows.len(),
                "recorded frame has the wrong topology"
            );
        }
        Ok(Some(KeypointSet::from_rows(rows)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KeypointError;
    use crate::geometry::fixtures;

    #[test]
    fn replays_recorded_landmarks() {
        let ks = fixtures::standing();
        let frame = RecordedPose::new(40, Some(&ks));
        let out = RecordedPoseEstimator.estimate(&frame, 40).unwrap();
        assert_eq!(out, Some(ks));
    }

    #[test]
    fn null_frame_means_no_body() {
        let frame = RecordedPose::new(40, None);
        assert_eq!(RecordedPoseEstimator.estimate(&frame, 40).unwrap(), None);
    }

    #[test]
    fn wrong_topology_fails_fast() {
        let frame = RecordedPose {
            timestamp_ms: 0,
            keypoints: Some(vec![[0.5, 0.5, 0.0, 1.0]; 25]),
        };
        let err = RecordedPoseEstimator.estimate(&frame, 0).unwrap_err();
        assert_eq!(
            err.downcast_ref::<KeypointError>(),
            Some(&KeypointError::MalformedSet {
                expected: 33,
                actual: 25
            })
        );
    }

    #[test]
    fn closures_are_estimators() {
        let mut calls = 0;
        let mut estimator = |_: &(), _: u64| -> Result<Option<KeypointSet>> {
            calls += 1;
            Ok(None)
        };
        estimator.estimate(&(), 0).unwrap();
        estimator.estimate(&(), 1).unwrap();
        assert_eq!(calls, 2);
    }
}
