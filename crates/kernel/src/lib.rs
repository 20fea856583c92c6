//! Simulation server core: owns a physics backend, advances it in fixed
//! timesteps and resolves link and joint names into handles.
//!
//! # Invariants
//! - Simulation time starts at zero and grows by exactly one timestep per
//!   successful step, whether the step came from `step` or `run_for`.
//! - Entities are spawned once at start; names never appear or disappear later.
//! - Lookups of unknown names fail with [`SimError::NotFound`]; no placeholder
//!   handle is ever returned.
//! - Hooks run inline between steps and cannot step the world themselves.

pub mod backend;
pub mod config;
pub mod error;
pub mod handle;
pub mod server;
pub mod world;

#[cfg(test)]
mod testing;

pub use backend::{BackendSetup, ModelLayout, PhysicsBackend};
pub use config::{ServerConfig, WorldSource};
pub use error::{BackendError, ConfigError, EntityKind, SimError};
pub use handle::{JointHandle, LinkHandle};
pub use server::SimulationServer;
pub use world::World;

pub use simserver_common::{
    JointId, JointState, LinkId, LinkState, Pose, ServerId, euler_angles_to_quat,
    euler_angles_to_rotation_matrix, rotation_matrix_to_euler_angles,
};
