use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Problems with a [`crate::ServerConfig`], reported when the server starts.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("got an empty world configuration file path")]
    EmptyWorldPath,
    #[error("got an empty inline world description")]
    EmptyWorldDescription,
    #[error("got an empty model description")]
    EmptyModelDescription,
    #[error("{field} must be finite")]
    NonFinite { field: &'static str },
    #[error("real time update rate must be finite and >= 0, got {0}")]
    InvalidUpdateRate(f64),
    #[error("failed to read world description {path}: {source}")]
    WorldUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures reported by a [`crate::PhysicsBackend`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    #[error("invalid world description: {0}")]
    InvalidWorld(String),
    #[error("invalid model description: {0}")]
    InvalidModel(String),
    #[error("solver diverged: {0}")]
    Diverged(String),
    #[error("{0}")]
    Other(String),
}

/// The two entity namespaces a name can be looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Link,
    Joint,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Link => f.write_str("link"),
            EntityKind::Joint => f.write_str("joint"),
        }
    }
}

/// Errors from [`crate::SimulationServer`] and [`crate::World`] operations.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("physics backend error: {0}")]
    Backend(#[source] BackendError),
    #[error("the simulation server is already started")]
    AlreadyStarted,
    #[error("the simulation server is not started")]
    NotStarted,
    #[error("{kind} not found: {name}")]
    NotFound { kind: EntityKind, name: String },
    #[error("simulation step failed at t={time:?}: {source}")]
    Step {
        /// Simulation time before the failed step; the clock does not advance.
        time: Duration,
        #[source]
        source: BackendError,
    },
}

impl SimError {
    /// Whether this is a failed name lookup.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SimError::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_the_entity() {
        let err = SimError::NotFound {
            kind: EntityKind::Joint,
            name: "efg".into(),
        };
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "joint not found: efg");
    }

    #[test]
    fn config_errors_convert() {
        let err: SimError = ConfigError::EmptyModelDescription.into();
        let SimError::Config(inner) = &err else {
            panic!("expected a config error, got {err:?}");
        };
        assert!(matches!(inner, ConfigError::EmptyModelDescription));
        assert!(!err.is_not_found());
    }
}
