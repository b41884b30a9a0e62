//! World pose type and conversions to and from the wire arrays

use nalgebra::{Quaternion as NaQuaternion, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use stagekit_core::{Point3, Quaternion};

/// Accumulated orientation and position of a node relative to the root.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub rotation: UnitQuaternion<f64>,
    pub translation: Vector3<f64>,
}

impl Pose {
    /// The root's pose; callers supply it, the engine never computes it.
    pub fn identity() -> Self {
        Self {
            rotation: UnitQuaternion::identity(),
            translation: Vector3::zeros(),
        }
    }

    pub fn to_record(&self) -> PoseRecord {
        PoseRecord {
            rotation: quaternion_to_wire(&self.rotation),
            translation: [self.translation.x, self.translation.y, self.translation.z],
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

/// Plain-array form of a [`Pose`] for JSON output.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoseRecord {
    pub rotation: Quaternion,
    pub translation: Point3,
}

/// `[x, y, z, w]` to a unit quaternion.
pub fn quaternion_from_wire(q: &Quaternion) -> UnitQuaternion<f64> {
    UnitQuaternion::new_normalize(NaQuaternion::new(q[3], q[0], q[1], q[2]))
}

pub fn quaternion_to_wire(q: &UnitQuaternion<f64>) -> Quaternion {
    let c = q.quaternion().coords;
    [c.x, c.y, c.z, c.w]
}

pub fn vector_from_wire(p: &Point3) -> Vector3<f64> {
    Vector3::new(p[0], p[1], p[2])
}

/// Rotation vector (axis scaled by angle in radians) to a wire quaternion.
pub fn rotation_from_scaled_axis(rotvec: Point3) -> Quaternion {
    quaternion_to_wire(&UnitQuaternion::from_scaled_axis(vector_from_wire(&rotvec)))
}

/// Unit-length copy of `q`, or `None` for a zero or non-finite quaternion.
pub fn normalize_quaternion(q: Quaternion) -> Option<Quaternion> {
    let norm = stagekit_core::quaternion_norm(&q);
    if norm == 0.0 || !norm.is_finite() {
        return None;
    }
    Some(q.map(|c| c / norm))
}
