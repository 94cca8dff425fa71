use serde::{Deserialize, Serialize};

use crate::error::KeypointError;

/// Number of landmarks in the BlazePose topology.
pub const LANDMARK_COUNT: usize = 33;

pub const NOSE: usize = 0;
pub const LEFT_SHOULDER: usize = 11;
pub const RIGHT_SHOULDER: usize = 12;
pub const LEFT_ELBOW: usize = 13;
pub const RIGHT_ELBOW: usize = 14;
pub const LEFT_WRIST: usize = 15;
pub const RIGHT_WRIST: usize = 16;
pub const LEFT_HIP: usize = 23;
pub const RIGHT_HIP: usize = 24;
pub const LEFT_KNEE: usize = 25;
pub const RIGHT_KNEE: usize = 26;
pub const LEFT_ANKLE: usize = 27;
pub const RIGHT_ANKLE: usize = 28;

/// One estimated body landmark. `x`/`y` are normalised to the frame,
/// `z` is a relative depth and `visibility` a confidence in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub visibility: f32,
}

impl Keypoint {
    pub const fn new(x: f32, y: f32, z: f32, visibility: f32) -> Self {
        Self { x, y, z, visibility }
    }

    /// A landmark the model could not place at all. Low visibility alone
    /// does not make a keypoint absent.
    pub const fn absent() -> Self {
        Self {
            x: f32::NAN,
            y: f32::NAN,
            z: f32::NAN,
            visibility: 0.0,
        }
    }

    pub fn is_present(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<[f32; 4]> for Keypoint {
    fn from(row: [f32; 4]) -> Self {
        Self::new(row[0], row[1], row[2], row[3])
    }
}

/// A full 33-landmark estimate for one frame.
///
/// The fixed-size array makes a partially populated set unrepresentable;
/// conversions from model output fail with [`KeypointError::MalformedSet`]
/// rather than pad or truncate.
#[derive(Debug, Clone, PartialEq)]
pub struct KeypointSet {
    points: [Keypoint; LANDMARK_COUNT],
}

impl KeypointSet {
    pub fn new(points: [Keypoint; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    pub fn from_rows(rows: &[[f32; 4]]) -> Result<Self, KeypointError> {
        rows.iter()
            .copied()
            .map(Keypoint::from)
            .collect::<Vec<_>>()
            .try_into()
    }

    pub fn get(&self, index: usize) -> &Keypoint {
        &self.points[index]
    }

    pub fn set(&mut self, index: usize, keypoint: Keypoint) {
        self.points[index] = keypoint;
    }

    pub fn iter(&self) -> impl Iterator<Item = &Keypoint> {
        self.points.iter()
    }
}

impl TryFrom<Vec<Keypoint>> for KeypointSet {
    type Error = KeypointError;

    fn try_from(points: Vec<Keypoint>) -> Result<Self, Self::Error> {
        let actual = points.len();
        let points: [Keypoint; LANDMARK_COUNT] =
            points.try_into().map_err(|_| KeypointError::MalformedSet {
                expected: LANDMARK_COUNT,
                actual,
            })?;
        Ok(Self { points })
    }
}
