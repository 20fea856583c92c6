use simserver_common::{JointId, JointState, LinkId, LinkState, Pose};
use std::collections::BTreeSet;
use std::time::Duration;

use crate::error::BackendError;

/// Inputs a backend receives when the server starts.
#[derive(Debug, Clone, Copy)]
pub struct BackendSetup<'a> {
    pub world_description: &'a str,
    pub model_description: &'a str,
    /// World pose of the model frame. Overrides any pose in the model description.
    pub initial_pose: Pose,
    pub enable_physics: bool,
    pub verbose: bool,
}

/// Names of the entities a backend spawned, in id order.
///
/// `links[i]` is the name of `LinkId(i)`, `joints[j]` the name of `JointId(j)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelLayout {
    pub model_name: String,
    pub links: Vec<String>,
    pub joints: Vec<String>,
}

impl ModelLayout {
    /// Names must be unique within each namespace and the model must be named.
    pub fn validate(&self) -> Result<(), BackendError> {
        if self.model_name.is_empty() {
            return Err(BackendError::InvalidModel("model has no name".into()));
        }
        check_unique("link", &self.links)?;
        check_unique("joint", &self.joints)
    }
}

fn check_unique(kind: &str, names: &[String]) -> Result<(), BackendError> {
    let mut seen = BTreeSet::new();
    for name in names {
        if !seen.insert(name.as_str()) {
            let message = format!("duplicate {kind} name: {name}");
            return Err(BackendError::InvalidModel(message));
        }
    }
    Ok(())
}

/// Capability interface of a physics solver driven by the server.
///
/// The server treats the backend as a deterministic black box: the same setup
/// and the same sequence of torque commands must produce the same states.
/// Ids passed in are always in range of the [`ModelLayout`] returned by
/// `initialize`.
pub trait PhysicsBackend: Send {
    /// Build the world and spawn the model. A failed call leaves the backend
    /// ready for another attempt.
    fn initialize(&mut self, setup: &BackendSetup<'_>) -> Result<ModelLayout, BackendError>;

    /// Fixed simulated time covered by one call to [`PhysicsBackend::advance`].
    fn timestep(&self) -> Duration;

    /// Integrate one timestep. After an error every query must still answer.
    fn advance(&mut self) -> Result<(), BackendError>;

    /// Put the model back to its initial pose with zero joint state and torque.
    fn reset(&mut self) -> Result<(), BackendError>;

    /// Latest state of a link, in the world frame.
    fn link_state(&self, link: LinkId) -> LinkState;

    fn joint_state(&self, joint: JointId) -> JointState;

    /// Record the actuation command for the joint's first axis. It is applied
    /// from the next `advance` on and persists until overwritten.
    fn set_joint_torque(&mut self, joint: JointId, torque: f64);

    /// Release backend resources. Called once when the owning world is dropped.
    fn shutdown(&mut self) {}
}
