use glam::{DMat3, DQuat, DVec3};

/// Direction-cosine matrix for the given Euler angles.
///
/// The rotation is `Rz(yaw) * Ry(pitch) * Rx(roll)`, i.e. roll about the
/// fixed X axis first, then pitch about fixed Y, then yaw about fixed Z.
/// This is the same convention [`euler_angles_to_quat`] and
/// [`crate::Pose::from_xyz_rpy`] use when a body is placed in the world.
pub fn euler_angles_to_rotation_matrix(roll: f64, pitch: f64, yaw: f64) -> DMat3 {
    DMat3::from_rotation_z(yaw) * DMat3::from_rotation_y(pitch) * DMat3::from_rotation_x(roll)
}

/// Unit quaternion for the given Euler angles (same convention as the matrix form).
pub fn euler_angles_to_quat(roll: f64, pitch: f64, yaw: f64) -> DQuat {
    DQuat::from_rotation_z(yaw) * DQuat::from_rotation_y(pitch) * DQuat::from_rotation_x(roll)
}

/// Recover `(roll, pitch, yaw)` from a direction-cosine matrix.
///
/// The pitch sine is clamped to `[-1, 1]` so slightly non-orthonormal input
/// near gimbal lock does not produce NaN.
pub fn rotation_matrix_to_euler_angles(global_r_local: &DMat3) -> DVec3 {
    // glam stores columns: element (row i, col j) is `col(j)[i]`.
    let r11 = global_r_local.x_axis.x;
    let r21 = global_r_local.x_axis.y;
    let r31 = global_r_local.x_axis.z;
    let r32 = global_r_local.y_axis.z;
    let r33 = global_r_local.z_axis.z;

    let yaw = r21.atan2(r11);
    let pitch = (-r31).clamp(-1.0, 1.0).asin();
    let roll = r32.atan2(r33);
    DVec3::new(roll, pitch, yaw)
}
