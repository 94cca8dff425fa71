//! Drawable skeleton for the debug view.
//!
//! Rendering is left to the caller; this only decides what is trustworthy
//! enough to draw. Visibility filtering here never feeds classification.

use serde::Serialize;

use crate::keypoints::{
    KeypointSet, LEFT_ANKLE, LEFT_ELBOW, LEFT_HIP, LEFT_KNEE, LEFT_SHOULDER, LEFT_WRIST,
    RIGHT_ANKLE, RIGHT_ELBOW, RIGHT_HIP, RIGHT_KNEE, RIGHT_SHOULDER, RIGHT_WRIST,
};
use crate::posture::PostureLabel;

/// Torso, arms, legs.
pub const SKELETON_CONNECTIONS: [(usize, usize); 12] = [
    (LEFT_SHOULDER, RIGHT_SHOULDER),
    (LEFT_SHOULDER, LEFT_HIP),
    (RIGHT_SHOULDER, RIGHT_HIP),
    (LEFT_HIP, RIGHT_HIP),
    (LEFT_SHOULDER, LEFT_ELBOW),
    (LEFT_ELBOW, LEFT_WRIST),
    (RIGHT_SHOULDER, RIGHT_ELBOW),
    (RIGHT_ELBOW, RIGHT_WRIST),
    (LEFT_HIP, LEFT_KNEE),
    (LEFT_KNEE, LEFT_ANKLE),
    (RIGHT_HIP, RIGHT_KNEE),
    (RIGHT_KNEE, RIGHT_ANKLE),
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OverlayPoint {
    pub index: usize,
    pub x: f32,
    pub y: f32,
}

impl OverlayPoint {
    pub fn to_pixels(&self, width: u32, height: u32) -> (f32, f32) {
        (self.x * width as f32, self.y * height as f32)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SkeletonOverlay {
    pub points: Vec<OverlayPoint>,
    pub bones: Vec<(usize, usize)>,
    /// Tint the frame: the instantaneous label is falling.
    pub alert: bool,
}

impl SkeletonOverlay {
    pub fn build(ks: &KeypointSet, min_visibility: f32, label: Option<PostureLabel>) -> Self {
        let visible = |i: usize| {
            let kp = ks.get(i);
            kp.is_present() && kp.visibility > min_visibility
        };

        let points = ks
            .iter()
            .enumerate()
            .filter(|(i, _)| visible(*i))
            .map(|(index, kp)| OverlayPoint {
                index,
                x: kp.x,
                y: kp.y,
            })
            .collect();

        let bones = SKELETON_CONNECTIONS
            .iter()
            .copied()
            .filter(|&(a, b)| visible(a) && visible(b))
            .collect();

        Self {
            points,
            bones,
            alert: label == Some(PostureLabel::Falling),
        }
    }
}
