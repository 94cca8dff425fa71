//! Scalar body-shape signals derived from a single [`KeypointSet`].
//!
//! All helpers are pure and fail soft: a landmark that the model could not
//! place yields a neutral default instead of an error, so classification
//! degrades rather than stops.

use crate::keypoints::{
    Keypoint, KeypointSet, LEFT_ANKLE, LEFT_HIP, LEFT_KNEE, LEFT_SHOULDER, RIGHT_ANKLE, RIGHT_HIP,
    RIGHT_KNEE, RIGHT_SHOULDER,
};

/// Extent of the keypoint cloud in normalised frame units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    /// `height / width`. Infinite for a zero-width box, NaN when both are zero.
    pub fn tallness(&self) -> f32 {
        self.height / self.width
    }
}

fn midpoint(a: &Keypoint, b: &Keypoint) -> (f32, f32) {
    ((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

/// Angle of the hip-to-shoulder vector against the horizontal, in degrees.
/// 90 is upright, 0 is flat.
///
/// Missing shoulders or hips give 0, which reads as "lying flat". That biases
/// partial occlusion towards a fall suspicion and is kept deliberately until
/// the product decides otherwise.
pub fn torso_verticality_angle(ks: &KeypointSet) -> f32 {
    let required = [LEFT_SHOULDER, RIGHT_SHOULDER, LEFT_HIP, RIGHT_HIP];
    if required.iter().any(|&i| !ks.get(i).is_present()) {
        return 0.0;
    }

    let (shoulder_x, shoulder_y) = midpoint(ks.get(LEFT_SHOULDER), ks.get(RIGHT_SHOULDER));
    let (hip_x, hip_y) = midpoint(ks.get(LEFT_HIP), ks.get(RIGHT_HIP));

    let dx = (shoulder_x - hip_x).abs();
    let dy = (shoulder_y - hip_y).abs();

    dy.atan2(dx).to_degrees()
}

/// Bounding box over every placed landmark, whatever its visibility.
pub fn bounding_box(ks: &KeypointSet) -> BoundingBox {
    let mut min_x = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_y = f32::NEG_INFINITY;

    for kp in ks.iter().filter(|kp| kp.is_present()) {
        min_x = min_x.min(kp.x);
        max_x = max_x.max(kp.x);
        min_y = min_y.min(kp.y);
        max_y = max_y.max(kp.y);
    }

    if min_x > max_x {
        return BoundingBox {
            width: 0.0,
            height: 0.0,
        };
    }

    BoundingBox {
        width: max_x - min_x,
        height: max_y - min_y,
    }
}

/// Knee bend for one hip-knee-ankle triple: 0 for a straight leg, growing
/// with flexion. Missing points count as fully bent (180).
fn knee_bend(hip: &Keypoint, knee: &Keypoint, ankle: &Keypoint) -> f32 {
    if !(hip.is_present() && knee.is_present() && ankle.is_present()) {
        return 180.0;
    }

    let ab = (knee.x - hip.x, knee.y - hip.y);
    let bc = (ankle.x - knee.x, ankle.y - knee.y);
    let dot = ab.0 * bc.0 + ab.1 * bc.1;
    let mag = (ab.0.hypot(ab.1)) * (bc.0.hypot(bc.1));
    if mag == 0.0 {
        return 0.0;
    }

    (dot / mag).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Bend of the straighter leg, in degrees [0, 180].
pub fn leg_straightness_angle(ks: &KeypointSet) -> f32 {
    let left = knee_bend(ks.get(LEFT_HIP), ks.get(LEFT_KNEE), ks.get(LEFT_ANKLE));
    let right = knee_bend(ks.get(RIGHT_HIP), ks.get(RIGHT_KNEE), ks.get(RIGHT_ANKLE));
    left.min(right)
}
