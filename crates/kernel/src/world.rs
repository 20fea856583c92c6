use simserver_common::{JointId, JointState, LinkId, LinkState, ServerId};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::backend::{ModelLayout, PhysicsBackend};
use crate::error::{EntityKind, SimError};
use crate::handle::{JointHandle, LinkHandle};

/// The live simulated world: the spawned model, its clock and its backend.
///
/// Entities are fixed at construction. Link and joint state is never cached
/// here; every query goes to the backend, so it reflects the latest step.
///
/// Uses BTreeMap so name listings come out in the same order on every run.
pub struct World {
    server: ServerId,
    backend: Box<dyn PhysicsBackend>,
    model_name: String,
    links: BTreeMap<String, LinkId>,
    joints: BTreeMap<String, JointId>,
    layout: ModelLayout,
    timestep: Duration,
    tick: u64,
    simulation_time: Duration,
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("server", &self.server)
            .field("model_name", &self.model_name)
            .field("links", &self.links)
            .field("joints", &self.joints)
            .field("timestep", &self.timestep)
            .field("tick", &self.tick)
            .field("simulation_time", &self.simulation_time)
            .finish_non_exhaustive()
    }
}

impl World {
    /// Wrap an initialized backend. `layout` must already be validated.
    pub(crate) fn new(
        server: ServerId,
        backend: Box<dyn PhysicsBackend>,
        layout: ModelLayout,
        timestep: Duration,
    ) -> Self {
        let links = layout
            .links
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), LinkId(i)))
            .collect();
        let joints = layout
            .joints
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), JointId(i)))
            .collect();
        Self {
            server,
            backend,
            model_name: layout.model_name.clone(),
            links,
            joints,
            layout,
            timestep,
            tick: 0,
            simulation_time: Duration::ZERO,
        }
    }

    /// Name of the spawned model (the robot).
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Simulated time covered by one step.
    pub fn timestep(&self) -> Duration {
        self.timestep
    }

    /// Number of successful steps since start or the last reset.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Simulated time since start: `tick * timestep`.
    pub fn simulation_time(&self) -> Duration {
        self.simulation_time
    }

    /// Link names in sorted order.
    pub fn link_names(&self) -> impl Iterator<Item = &str> {
        self.links.keys().map(String::as_str)
    }

    /// Joint names in sorted order.
    pub fn joint_names(&self) -> impl Iterator<Item = &str> {
        self.joints.keys().map(String::as_str)
    }

    /// Resolve a link name into a handle.
    pub fn get_link(&self, name: &str) -> Result<LinkHandle, SimError> {
        match self.links.get(name) {
            Some(&id) => Ok(LinkHandle::new(self.server, id)),
            None => {
                error!(name, "failed to find link");
                Err(SimError::NotFound {
                    kind: EntityKind::Link,
                    name: name.to_string(),
                })
            }
        }
    }

    /// Resolve a joint name into a handle.
    pub fn get_joint(&self, name: &str) -> Result<JointHandle, SimError> {
        match self.joints.get(name) {
            Some(&id) => Ok(JointHandle::new(self.server, id)),
            None => {
                error!(name, "failed to find joint");
                Err(SimError::NotFound {
                    kind: EntityKind::Joint,
                    name: name.to_string(),
                })
            }
        }
    }

    /// Live state of a link.
    ///
    /// # Panics
    /// If the handle was issued by a different server.
    pub fn link_state(&self, link: LinkHandle) -> LinkState {
        self.check_owner(link.server(), EntityKind::Link);
        self.backend.link_state(link.id())
    }

    /// Live state of a joint.
    ///
    /// # Panics
    /// If the handle was issued by a different server.
    pub fn joint_state(&self, joint: JointHandle) -> JointState {
        self.check_owner(joint.server(), EntityKind::Joint);
        self.backend.joint_state(joint.id())
    }

    /// Command a joint torque, applied from the next step on.
    ///
    /// # Panics
    /// If the handle was issued by a different server.
    pub fn set_joint_torque(&mut self, joint: JointHandle, torque: f64) {
        self.check_owner(joint.server(), EntityKind::Joint);
        self.backend.set_joint_torque(joint.id(), torque);
    }

    /// Name the link was spawned with.
    pub fn link_name(&self, link: LinkHandle) -> &str {
        self.check_owner(link.server(), EntityKind::Link);
        &self.layout.links[link.id().0]
    }

    /// Name the joint was spawned with.
    pub fn joint_name(&self, joint: JointHandle) -> &str {
        self.check_owner(joint.server(), EntityKind::Joint);
        &self.layout.joints[joint.id().0]
    }

    fn check_owner(&self, server: ServerId, kind: EntityKind) {
        assert_eq!(
            server, self.server,
            "{kind} handle used with a simulation server that did not issue it"
        );
    }

    /// Advance the backend one timestep. The clock only moves on success.
    pub(crate) fn advance(&mut self) -> Result<(), SimError> {
        if let Err(source) = self.backend.advance() {
            warn!(tick = self.tick, error = %source, "simulation step failed");
            return Err(SimError::Step {
                time: self.simulation_time,
                source,
            });
        }
        self.tick += 1;
        self.simulation_time += self.timestep;
        Ok(())
    }

    /// Rewind the backend to the initial state and the clock to zero.
    pub(crate) fn reset(&mut self) -> Result<(), SimError> {
        self.backend.reset().map_err(SimError::Backend)?;
        self.tick = 0;
        self.simulation_time = Duration::ZERO;
        debug!(model = %self.model_name, "world reset");
        Ok(())
    }

    /// Compute a deterministic hash of the simulated state for comparison.
    /// Covers the tick and every link and joint state in id order.
    pub fn state_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325; // FNV offset basis
        let mix = |h: &mut u64, bytes: &[u8]| {
            for &b in bytes {
                *h ^= b as u64;
                *h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        let mix_f64s = |h: &mut u64, values: &[f64]| {
            for v in values {
                mix(h, &v.to_le_bytes());
            }
        };
        mix(&mut h, &self.tick.to_le_bytes());
        for i in 0..self.layout.links.len() {
            let s = self.backend.link_state(LinkId(i));
            let p = s.pose.position;
            let q = s.pose.orientation;
            let v = s.linear_velocity;
            let w = s.angular_velocity;
            mix_f64s(&mut h, &[p.x, p.y, p.z, q.x, q.y, q.z, q.w]);
            mix_f64s(&mut h, &[v.x, v.y, v.z, w.x, w.y, w.z]);
        }
        for i in 0..self.layout.joints.len() {
            let s = self.backend.joint_state(JointId(i));
            mix_f64s(&mut h, &[s.position, s.velocity, s.torque]);
        }
        h
    }
}

impl Drop for World {
    fn drop(&mut self) {
        self.backend.shutdown();
        debug!(model = %self.model_name, "backend shut down");
    }
}
