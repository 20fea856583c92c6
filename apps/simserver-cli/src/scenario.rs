//! Scenario files: a YAML pointer to a world and a model plus the start pose.

use anyhow::{Context, Result};
use glam::DVec3;
use serde::Deserialize;
use simserver_kernel::{ServerConfig, WorldSource};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// World SDF file.
    pub world: PathBuf,
    /// Model SDF file.
    pub model: PathBuf,
    #[serde(default)]
    pub initial_position: DVec3,
    /// `(roll, pitch, yaw)` in radians.
    #[serde(default)]
    pub initial_orientation: DVec3,
    #[serde(default = "enabled")]
    pub enable_physics: bool,
    #[serde(default)]
    pub real_time_update_rate: f64,
}

fn enabled() -> bool {
    true
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        let base = path.parent().unwrap_or(Path::new("."));
        Self::from_yaml(&text, base)
            .with_context(|| format!("parsing scenario {}", path.display()))
    }

    /// Parse scenario text. Relative paths are resolved against `base`.
    pub fn from_yaml(text: &str, base: &Path) -> Result<Self> {
        let mut scenario: Scenario = serde_yaml::from_str(text)?;
        scenario.world = base.join(&scenario.world);
        scenario.model = base.join(&scenario.model);
        Ok(scenario)
    }

    /// Read the model file and build the server configuration.
    pub fn to_config(&self, verbose: bool) -> Result<ServerConfig> {
        let model = std::fs::read_to_string(&self.model)
            .with_context(|| format!("reading model {}", self.model.display()))?;
        let mut config = ServerConfig::new(WorldSource::Path(self.world.clone()), model)
            .with_initial_pose(self.initial_position, self.initial_orientation)
            .with_verbose(verbose);
        config.enable_physics = self.enable_physics;
        config.real_time_update_rate = self.real_time_update_rate;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_follow_the_scenario_file() {
        let scenario = Scenario::from_yaml(
            "world: worlds/empty.world\nmodel: /abs/robot.sdf\ninitial_position: [1, 2, 3]\n",
            Path::new("/data/run"),
        )
        .unwrap();
        let world = PathBuf::from("/data/run/worlds/empty.world");
        assert_eq!(scenario.world, world);
        assert_eq!(scenario.model, PathBuf::from("/abs/robot.sdf"));
        assert_eq!(scenario.initial_position, DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(scenario.initial_orientation, DVec3::ZERO);
        assert!(scenario.enable_physics);
        assert_eq!(scenario.real_time_update_rate, 0.0);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let here = Path::new(".");
        let err = Scenario::from_yaml("world: a\nmodel: b\nseed: 4\n", here).unwrap_err();
        assert!(err.to_string().contains("seed"), "{err}");
        assert!(Scenario::from_yaml("world: a\n", here).is_err());
    }

    #[test]
    fn bundled_scenario_builds_a_config() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../scenarios/differential_drive.yaml");
        let scenario = Scenario::load(&path).unwrap();
        let config = scenario.to_config(false).unwrap();
        assert!(config.model_description.contains("differential_drive"));
        let start = config.initial_world_position_of_body;
        assert_eq!(start, DVec3::new(1.2, 3.4, 0.0));
        assert!(config.validate().is_ok());
    }
}
