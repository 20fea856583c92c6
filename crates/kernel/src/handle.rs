//! Handles to named entities of a running simulation.
//!
//! A handle is a small `Copy` token: the id of the server that issued it plus
//! the backend index of the entity. It owns nothing. Every operation takes the
//! [`World`] it reads from or writes to, so a handle can only reach live state
//! while its server is alive. Passing a handle to another server's world
//! panics.

use glam::{DMat3, DVec3};
use simserver_common::{JointId, JointState, LinkId, LinkState, Pose, ServerId};

use crate::world::World;

/// Handle to a rigid link of the spawned model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkHandle {
    server: ServerId,
    id: LinkId,
}

impl LinkHandle {
    pub(crate) fn new(server: ServerId, id: LinkId) -> Self {
        Self { server, id }
    }

    /// Backend index of the link.
    pub fn id(&self) -> LinkId {
        self.id
    }

    /// Server that issued the handle.
    pub fn server(&self) -> ServerId {
        self.server
    }

    /// Name in the model description.
    pub fn name<'w>(&self, world: &'w World) -> &'w str {
        world.link_name(*self)
    }

    /// Full kinematic state as of the latest completed step.
    pub fn state(&self, world: &World) -> LinkState {
        world.link_state(*self)
    }

    /// Pose of the link frame in the world.
    pub fn world_pose(&self, world: &World) -> Pose {
        self.state(world).pose
    }

    /// World pose as `(world_p_link, world_r_link)`.
    pub fn world_pose_matrix(&self, world: &World) -> (DVec3, DMat3) {
        let pose = self.world_pose(world);
        (pose.position, pose.rotation_matrix())
    }

    /// Linear velocity in the world frame.
    pub fn world_linear_velocity(&self, world: &World) -> DVec3 {
        self.state(world).linear_velocity
    }

    pub fn world_angular_velocity(&self, world: &World) -> DVec3 {
        self.state(world).angular_velocity
    }

    pub fn world_linear_acceleration(&self, world: &World) -> DVec3 {
        self.state(world).linear_acceleration
    }

    pub fn world_angular_acceleration(&self, world: &World) -> DVec3 {
        self.state(world).angular_acceleration
    }

    /// Linear velocity expressed in the link frame.
    pub fn relative_linear_velocity(&self, world: &World) -> DVec3 {
        self.state(world).relative_linear_velocity()
    }

    pub fn relative_angular_velocity(&self, world: &World) -> DVec3 {
        self.state(world).relative_angular_velocity()
    }

    pub fn relative_linear_acceleration(&self, world: &World) -> DVec3 {
        self.state(world).relative_linear_acceleration()
    }

    pub fn relative_angular_acceleration(&self, world: &World) -> DVec3 {
        self.state(world).relative_angular_acceleration()
    }
}

/// Handle to a joint of the spawned model. Acts on the joint's first axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JointHandle {
    server: ServerId,
    id: JointId,
}

impl JointHandle {
    pub(crate) fn new(server: ServerId, id: JointId) -> Self {
        Self { server, id }
    }

    /// Backend index of the joint.
    pub fn id(&self) -> JointId {
        self.id
    }

    /// Server that issued the handle.
    pub fn server(&self) -> ServerId {
        self.server
    }

    /// Name in the model description.
    pub fn name<'w>(&self, world: &'w World) -> &'w str {
        world.joint_name(*self)
    }

    /// Position, velocity and commanded torque of the first axis.
    pub fn state(&self, world: &World) -> JointState {
        world.joint_state(*self)
    }

    /// Command the joint torque. Takes effect on the next step and stays in
    /// force until overwritten or the world is reset.
    pub fn set_torque(&self, world: &mut World, torque: f64) {
        world.set_joint_torque(*self, torque);
    }

    /// The last commanded torque, not a measured one.
    pub fn torque(&self, world: &World) -> f64 {
        self.state(world).torque
    }

    /// Axis velocity, rad/s or m/s.
    pub fn velocity(&self, world: &World) -> f64 {
        self.state(world).velocity
    }

    /// Axis position, rad or m.
    pub fn position(&self, world: &World) -> f64 {
        self.state(world).position
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::started_server;

    #[test]
    fn torque_echoes_the_last_written_value() {
        let mut server = started_server();
        let world = server.world_mut().unwrap();
        let left = world.get_joint("left_wheel_hinge").unwrap();
        let right = world.get_joint("right_wheel_hinge").unwrap();
        assert_eq!(left.torque(world), 0.0);

        left.set_torque(world, 1.0);
        right.set_torque(world, 1.0);
        assert_eq!(left.torque(world), 1.0);
        assert_eq!(right.torque(world), 1.0);

        left.set_torque(world, -0.25);
        assert_eq!(left.torque(world), -0.25);
        assert_eq!(right.torque(world), 1.0);
    }

    #[test]
    fn torque_survives_stepping() {
        let mut server = started_server();
        let hinge = server.get_joint("left_wheel_hinge").unwrap();
        hinge.set_torque(server.world_mut().unwrap(), 0.5);
        server.step().unwrap();
        server.step().unwrap();
        let world = server.world().unwrap();
        assert_eq!(hinge.torque(world), 0.5);
        assert!(hinge.velocity(world) > 0.0);
        assert!(hinge.position(world) > 0.0);
    }

    #[test]
    fn link_pose_reflects_latest_step() {
        let mut server = started_server();
        let chassis = server.get_link("chassis").unwrap();
        let hinge = server.get_joint("left_wheel_hinge").unwrap();
        let p0 = chassis.world_pose(server.world().unwrap()).position;
        hinge.set_torque(server.world_mut().unwrap(), 1.0);
        server.step().unwrap();
        server.step().unwrap();
        let world = server.world().unwrap();
        let (p2, r2) = chassis.world_pose_matrix(world);
        assert!(p2.x > p0.x);
        assert_eq!(r2, glam::DMat3::IDENTITY);
        assert!(chassis.world_linear_velocity(world).x > 0.0);
        assert_eq!(chassis.name(world), "chassis");
    }

    #[test]
    #[should_panic(expected = "did not issue it")]
    fn handle_from_another_server_panics() {
        let a = started_server();
        let b = started_server();
        let chassis = a.get_link("chassis").unwrap();
        let _ = chassis.world_pose(b.world().unwrap());
    }
}
