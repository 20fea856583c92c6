//! Shared value types and frame math for the simulation server.
//!
//! # Conventions
//! - Euler angles are `(roll, pitch, yaw)` applied as `Rz(yaw) * Ry(pitch) * Rx(roll)`.
//! - Every pose, velocity and acceleration is expressed in the world frame
//!   unless its name says `relative`.

pub mod math;
pub mod types;

pub use math::{
    euler_angles_to_quat, euler_angles_to_rotation_matrix, rotation_matrix_to_euler_angles,
};
pub use types::{JointId, JointState, LinkId, LinkState, Pose, ServerId};
