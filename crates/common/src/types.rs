use glam::{DMat3, DQuat, DVec3};
use serde::{Deserialize, Serialize};
use std::ops::Mul;
use uuid::Uuid;

use crate::math::euler_angles_to_quat;

/// Unique identity of one simulation server instance.
///
/// Handles carry the id of the server that issued them so they cannot be
/// used against a different server by accident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServerId(pub Uuid);

impl ServerId {
    /// Fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ServerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ServerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Backend index of a link, in the order reported at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkId(pub usize);

/// Backend index of a joint, in the order reported at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JointId(pub usize);

/// Rigid transform: position plus orientation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: DVec3,
    pub orientation: DQuat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Self = Self {
        position: DVec3::ZERO,
        orientation: DQuat::IDENTITY,
    };

    /// Pose from a position and an orientation quaternion.
    pub fn new(position: DVec3, orientation: DQuat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Pose from a position and `(roll, pitch, yaw)` Euler angles.
    pub fn from_xyz_rpy(position: DVec3, rpy: DVec3) -> Self {
        Self::new(position, euler_angles_to_quat(rpy.x, rpy.y, rpy.z))
    }

    /// Orientation as a direction-cosine matrix.
    pub fn rotation_matrix(&self) -> DMat3 {
        DMat3::from_quat(self.orientation)
    }

    /// The transform that undoes this one, so `p * p.inverse()` is identity.
    pub fn inverse(&self) -> Self {
        let orientation = self.orientation.inverse();
        Self {
            position: orientation * -self.position,
            orientation,
        }
    }

    /// Map a point expressed in this pose's frame into the parent frame.
    pub fn transform_point(&self, point: DVec3) -> DVec3 {
        self.position + self.orientation * point
    }

    /// True when neither the position nor the orientation holds NaN or infinity.
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.orientation.is_finite()
    }
}

impl Mul for Pose {
    type Output = Pose;

    /// `a * b` places `b` (expressed in frame `a`) into `a`'s parent frame.
    fn mul(self, rhs: Pose) -> Pose {
        Pose {
            position: self.transform_point(rhs.position),
            orientation: (self.orientation * rhs.orientation).normalize(),
        }
    }
}

/// Kinematic state of a link, everything in the world frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LinkState {
    pub pose: Pose,
    pub linear_velocity: DVec3,
    pub angular_velocity: DVec3,
    pub linear_acceleration: DVec3,
    pub angular_acceleration: DVec3,
}

impl LinkState {
    /// Linear velocity expressed in the link frame.
    pub fn relative_linear_velocity(&self) -> DVec3 {
        self.in_link_frame(self.linear_velocity)
    }

    /// Angular velocity expressed in the link frame.
    pub fn relative_angular_velocity(&self) -> DVec3 {
        self.in_link_frame(self.angular_velocity)
    }

    /// Linear acceleration expressed in the link frame.
    pub fn relative_linear_acceleration(&self) -> DVec3 {
        self.in_link_frame(self.linear_acceleration)
    }

    /// Angular acceleration expressed in the link frame.
    pub fn relative_angular_acceleration(&self) -> DVec3 {
        self.in_link_frame(self.angular_acceleration)
    }

    fn in_link_frame(&self, world_vector: DVec3) -> DVec3 {
        self.pose.orientation.inverse() * world_vector
    }
}

/// State of a joint's first axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct JointState {
    pub position: f64,
    pub velocity: f64,
    /// Last commanded torque (or force, for prismatic joints).
    pub torque: f64,
}
