//! Forward kinematics over the component tree
//!
//! Each child composes its rotation onto the parent's (`R * q`, parent first)
//! and its attachment point is rotated by that composed rotation before being
//! added to the parent's translation:
//!
//! ```text
//! composed          = R_parent * q_child
//! world_translation = T_parent + composed * p_child
//! ```
//!
//! The point is rotated by the composed rotation, not the parent's alone.

use crate::pose::{quaternion_from_wire, vector_from_wire, Pose};
use nalgebra::Vector3;
use stagekit_core::Component;
use std::collections::{BTreeMap, HashMap};

/// Current carriage position per axis identifier.
pub type AxisPositions = HashMap<i64, f64>;

/// World pose of every node except the root.
pub fn compute_world_poses(root: &Component) -> BTreeMap<String, Pose> {
    let mut poses = BTreeMap::new();
    accumulate(root, &Pose::identity(), None, &mut poses);
    poses
}

/// Like [`compute_world_poses`], with axis carriages displaced along their
/// axis vector by the recorded position.
///
/// An axis with position `s` behaves as if its attachment point were
/// `p + s * axis_direction`; the displacement carries through to descendants.
/// Axes with no recorded position or no axis vector stay at their zero.
pub fn compute_world_poses_with_positions(
    root: &Component,
    positions: &AxisPositions,
) -> BTreeMap<String, Pose> {
    let mut poses = BTreeMap::new();
    accumulate(root, &Pose::identity(), Some(positions), &mut poses);
    poses
}

fn accumulate(
    node: &Component,
    parent: &Pose,
    positions: Option<&AxisPositions>,
    poses: &mut BTreeMap<String, Pose>,
) {
    for child in &node.children {
        let composed = parent.rotation * quaternion_from_wire(&child.attachment_rotation);
        let local = vector_from_wire(&child.attachment_point) + displacement(child, positions);
        let pose = Pose {
            rotation: composed,
            translation: parent.translation + composed * local,
        };
        accumulate(child, &pose, positions, poses);
        poses.insert(child.name.clone(), pose);
    }
}

fn displacement(node: &Component, positions: Option<&AxisPositions>) -> Vector3<f64> {
    let (Some(positions), Some(id), Some(direction)) =
        (positions, node.axis_identifier(), node.axis_direction())
    else {
        return Vector3::zeros();
    };
    match positions.get(&id) {
        Some(s) => vector_from_wire(&direction) * *s,
        None => Vector3::zeros(),
    }
}
