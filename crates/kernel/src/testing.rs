//! Deterministic stand-in backend for exercising the server without a solver.

use glam::{DQuat, DVec3};
use simserver_common::{JointId, JointState, LinkId, LinkState, Pose};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::backend::{BackendSetup, ModelLayout, PhysicsBackend};
use crate::config::{ServerConfig, WorldSource};
use crate::error::BackendError;
use crate::server::SimulationServer;

/// A chassis with two wheel hinges. The chassis slides along its X axis at a
/// speed equal to the sum of the hinge velocities; each hinge accelerates at
/// its commanded torque.
pub(crate) struct StubBackend {
    link_offsets: Vec<(String, DVec3)>,
    joint_names: Vec<String>,
    timestep: Duration,
    fail_initializations: usize,
    fail_on_tick: Option<u64>,
    physics: bool,
    base: Pose,
    chassis_shift: f64,
    chassis_velocity: f64,
    joints: Vec<JointState>,
    tick: u64,
    shutdowns: Arc<AtomicUsize>,
}

impl StubBackend {
    pub(crate) fn differential_drive() -> Self {
        Self {
            link_offsets: vec![
                ("chassis".into(), DVec3::new(0.0, 0.0, 0.1)),
                ("left_wheel".into(), DVec3::new(0.0, 0.15, 0.1)),
                ("right_wheel".into(), DVec3::new(0.0, -0.15, 0.1)),
            ],
            joint_names: vec!["left_wheel_hinge".into(), "right_wheel_hinge".into()],
            timestep: Duration::from_millis(1),
            fail_initializations: 0,
            fail_on_tick: None,
            physics: true,
            base: Pose::IDENTITY,
            chassis_shift: 0.0,
            chassis_velocity: 0.0,
            joints: vec![JointState::default(); 2],
            tick: 0,
            shutdowns: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Reject the first `n` initialization attempts.
    pub(crate) fn failing_initializations(mut self, n: usize) -> Self {
        self.fail_initializations = n;
        self
    }

    /// Fail the step that would reach `tick`.
    pub(crate) fn failing_on_tick(mut self, tick: u64) -> Self {
        self.fail_on_tick = Some(tick);
        self
    }

    pub(crate) fn with_duplicate_link(mut self) -> Self {
        self.link_offsets.push(("chassis".into(), DVec3::ZERO));
        self
    }

    pub(crate) fn shutdown_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.shutdowns)
    }

    fn clear_state(&mut self) {
        self.chassis_shift = 0.0;
        self.chassis_velocity = 0.0;
        self.joints.fill(JointState::default());
        self.tick = 0;
    }
}

impl PhysicsBackend for StubBackend {
    fn initialize(&mut self, setup: &BackendSetup<'_>) -> Result<ModelLayout, BackendError> {
        if self.fail_initializations > 0 {
            self.fail_initializations -= 1;
            let message = "scripted initialization failure";
            return Err(BackendError::InvalidModel(message.into()));
        }
        self.base = setup.initial_pose;
        self.physics = setup.enable_physics;
        self.joints = vec![JointState::default(); self.joint_names.len()];
        self.clear_state();
        let links = self.link_offsets.iter().map(|(name, _)| name.clone());
        Ok(ModelLayout {
            model_name: "differential_drive".into(),
            links: links.collect(),
            joints: self.joint_names.clone(),
        })
    }

    fn timestep(&self) -> Duration {
        self.timestep
    }

    fn advance(&mut self) -> Result<(), BackendError> {
        if self.fail_on_tick == Some(self.tick + 1) {
            return Err(BackendError::Diverged("scripted step failure".into()));
        }
        if self.physics {
            let dt = self.timestep.as_secs_f64();
            let mut next = self.joints.clone();
            for joint in &mut next {
                joint.velocity += joint.torque * dt;
                joint.position += joint.velocity * dt;
            }
            let velocity: f64 = next.iter().map(|j| j.velocity).sum();
            if !velocity.is_finite() {
                return Err(BackendError::Diverged("non-finite joint velocity".into()));
            }
            self.joints = next;
            self.chassis_velocity = velocity;
            self.chassis_shift += velocity * dt;
        }
        self.tick += 1;
        Ok(())
    }

    fn reset(&mut self) -> Result<(), BackendError> {
        self.clear_state();
        Ok(())
    }

    fn link_state(&self, link: LinkId) -> LinkState {
        let offset = self.link_offsets[link.0].1 + DVec3::X * self.chassis_shift;
        LinkState {
            pose: self.base * Pose::new(offset, DQuat::IDENTITY),
            linear_velocity: self.base.orientation * (DVec3::X * self.chassis_velocity),
            ..LinkState::default()
        }
    }

    fn joint_state(&self, joint: JointId) -> JointState {
        self.joints[joint.0]
    }

    fn set_joint_torque(&mut self, joint: JointId, torque: f64) {
        self.joints[joint.0].torque = torque;
    }

    fn shutdown(&mut self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

pub(crate) fn stub_config() -> ServerConfig {
    ServerConfig::new(WorldSource::Inline("<world/>".into()), "<model/>")
        .with_initial_pose(DVec3::new(1.2, 3.4, 0.0), DVec3::ZERO)
}

pub(crate) fn started_server() -> SimulationServer {
    let mut server = SimulationServer::new(stub_config(), StubBackend::differential_drive());
    server.start().unwrap();
    server
}
