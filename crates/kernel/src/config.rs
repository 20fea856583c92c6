use glam::DVec3;
use serde::{Deserialize, Serialize};
use simserver_common::Pose;
use std::borrow::Cow;
use std::path::PathBuf;

use crate::error::ConfigError;

/// Where the static environment description comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorldSource {
    /// A world description file, read when the server starts.
    Path(PathBuf),
    /// World description text passed as is.
    Inline(String),
}

impl Default for WorldSource {
    fn default() -> Self {
        WorldSource::Path(PathBuf::from("worlds/empty.world"))
    }
}

impl WorldSource {
    /// Produce the world description text.
    pub fn load(&self) -> Result<Cow<'_, str>, ConfigError> {
        match self {
            WorldSource::Path(path) => std::fs::read_to_string(path)
                .map(Cow::Owned)
                .map_err(|source| ConfigError::WorldUnreadable {
                    path: path.clone(),
                    source,
                }),
            WorldSource::Inline(text) => Ok(Cow::Borrowed(text)),
        }
    }
}

/// Everything needed to construct a simulation server.
///
/// The server takes this by value and never mutates it. It is validated once,
/// when [`crate::SimulationServer::start`] runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Log the model layout and backend chatter at `info` instead of `debug`.
    pub verbose: bool,
    pub world: WorldSource,
    /// Raw model markup handed to the backend.
    pub model_description: String,
    /// Initial body position; overrides the pose in the model description.
    pub initial_world_position_of_body: DVec3,
    /// Initial body orientation as `(roll, pitch, yaw)`; overrides the model pose.
    pub initial_world_orientation_of_body: DVec3,
    /// With physics disabled the clock advances but bodies do not move.
    pub enable_physics: bool,
    /// Upper bound on steps per wall-clock second; `0` runs as fast as possible.
    pub real_time_update_rate: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            world: WorldSource::default(),
            model_description: String::new(),
            initial_world_position_of_body: DVec3::ZERO,
            initial_world_orientation_of_body: DVec3::ZERO,
            enable_physics: true,
            real_time_update_rate: Self::AS_FAST_AS_POSSIBLE,
        }
    }
}

impl ServerConfig {
    /// `real_time_update_rate` value that disables pacing.
    pub const AS_FAST_AS_POSSIBLE: f64 = 0.0;

    /// Config for a world and a model, everything else at its default.
    pub fn new(world: WorldSource, model_description: impl Into<String>) -> Self {
        Self {
            world,
            model_description: model_description.into(),
            ..Default::default()
        }
    }

    /// Set the initial body position and `(roll, pitch, yaw)` orientation.
    pub fn with_initial_pose(mut self, position: DVec3, rpy: DVec3) -> Self {
        self.initial_world_position_of_body = position;
        self.initial_world_orientation_of_body = rpy;
        self
    }

    /// Raise backend and layout logging from `debug` to `info`.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// World pose the backend places the model at.
    pub fn initial_pose(&self) -> Pose {
        Pose::from_xyz_rpy(
            self.initial_world_position_of_body,
            self.initial_world_orientation_of_body,
        )
    }

    /// Check the fields without touching the filesystem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.world {
            WorldSource::Path(path) if path.as_os_str().is_empty() => {
                return Err(ConfigError::EmptyWorldPath);
            }
            WorldSource::Inline(text) if text.trim().is_empty() => {
                return Err(ConfigError::EmptyWorldDescription);
            }
            _ => {}
        }
        if self.model_description.trim().is_empty() {
            return Err(ConfigError::EmptyModelDescription);
        }
        if !self.initial_world_position_of_body.is_finite() {
            return Err(ConfigError::NonFinite {
                field: "initial_world_position_of_body",
            });
        }
        if !self.initial_world_orientation_of_body.is_finite() {
            return Err(ConfigError::NonFinite {
                field: "initial_world_orientation_of_body",
            });
        }
        let rate = self.real_time_update_rate;
        if !rate.is_finite() || rate < 0.0 {
            return Err(ConfigError::InvalidUpdateRate(rate));
        }
        Ok(())
    }
}
