//! Stagekit Kinematics - world poses from attachment transforms

pub mod forward;
pub mod pose;

pub use forward::{compute_world_poses, compute_world_poses_with_positions, AxisPositions};
pub use pose::{
    normalize_quaternion, quaternion_from_wire, quaternion_to_wire, rotation_from_scaled_axis,
    vector_from_wire, Pose, PoseRecord,
};
