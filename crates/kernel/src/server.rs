use simserver_common::ServerId;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use crate::backend::{BackendSetup, PhysicsBackend};
use crate::config::ServerConfig;
use crate::error::{BackendError, SimError};
use crate::handle::{JointHandle, LinkHandle};
use crate::world::World;

/// Drives one simulated world in fixed timesteps.
///
/// Lifecycle: unstarted → [`start`](Self::start) → started. There is no way
/// back to unstarted; [`reset`](Self::reset) rewinds a started world in place.
/// Dropping the server shuts the backend down, which ends the usefulness of
/// every handle it issued.
///
/// Everything runs on the caller's thread. `step` and `run_for` return only
/// after the backend finished.
pub struct SimulationServer {
    id: ServerId,
    config: ServerConfig,
    /// Backend waiting for a successful start.
    pending: Option<Box<dyn PhysicsBackend>>,
    world: Option<World>,
    pacer: Pacer,
}

impl fmt::Debug for SimulationServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationServer")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("world", &self.world)
            .finish_non_exhaustive()
    }
}

impl SimulationServer {
    /// Create an unstarted server that will drive `backend`.
    pub fn new(config: ServerConfig, backend: impl PhysicsBackend + 'static) -> Self {
        Self {
            id: ServerId::new(),
            config,
            pending: Some(Box::new(backend)),
            world: None,
            pacer: Pacer::default(),
        }
    }

    /// Identity stamped on every handle this server issues.
    pub fn id(&self) -> ServerId {
        self.id
    }

    /// Configuration the server was created with.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Whether a [`start`](Self::start) call has succeeded.
    pub fn is_started(&self) -> bool {
        self.world.is_some()
    }

    /// Validate the configuration, build the backend world and spawn the model.
    ///
    /// On failure the server stays unstarted and `start` may be retried.
    /// Starting an already started server fails with
    /// [`SimError::AlreadyStarted`] and leaves it untouched.
    pub fn start(&mut self) -> Result<(), SimError> {
        if self.world.is_some() {
            error!(server = %self.id, "another start requested on a running server");
            return Err(SimError::AlreadyStarted);
        }
        self.config.validate()?;
        let world_description = self.config.world.load()?;
        let Some(mut backend) = self.pending.take() else {
            return Err(SimError::AlreadyStarted);
        };

        let setup = BackendSetup {
            world_description: &world_description,
            model_description: &self.config.model_description,
            initial_pose: self.config.initial_pose(),
            enable_physics: self.config.enable_physics,
            verbose: self.config.verbose,
        };
        let initialized = backend.initialize(&setup).and_then(|layout| {
            layout.validate()?;
            let timestep = backend.timestep();
            if timestep.is_zero() {
                let message = "backend reported a zero timestep";
                return Err(BackendError::Other(message.into()));
            }
            Ok((layout, timestep))
        });
        let (layout, timestep) = match initialized {
            Ok(ok) => ok,
            Err(err) => {
                error!(server = %self.id, error = %err, "failed to start simulation server");
                self.pending = Some(backend);
                return Err(SimError::Backend(err));
            }
        };

        let world = World::new(self.id, backend, layout, timestep);
        let links = world.link_names().collect::<Vec<_>>().join(" ");
        let joints = world.joint_names().collect::<Vec<_>>().join(" ");
        if self.config.verbose {
            info!(model = world.model_name(), %links, %joints, ?timestep, "model spawned");
        } else {
            debug!(model = world.model_name(), %links, %joints, ?timestep, "model spawned");
        }

        self.pacer = Pacer::new(self.config.real_time_update_rate);
        self.world = Some(world);
        Ok(())
    }

    /// Advance the simulation by exactly one timestep.
    pub fn step(&mut self) -> Result<(), SimError> {
        let world = started(&mut self.world)?;
        self.pacer.wait();
        world.advance()
    }

    /// Run `num_steps` iterations of: `on_before_step`, one step, `on_after_step`.
    ///
    /// Stops at the first failing step and returns its error; the after hook
    /// is not called for that iteration. Hooks get the world to read state and
    /// command torques but have no way to step it. `num_steps == 0` does
    /// nothing.
    pub fn run_for<B, A>(
        &mut self,
        num_steps: u32,
        mut on_before_step: B,
        mut on_after_step: A,
    ) -> Result<(), SimError>
    where
        B: FnMut(&mut World),
        A: FnMut(&mut World),
    {
        let world = started(&mut self.world)?;
        for _ in 0..num_steps {
            on_before_step(world);
            self.pacer.wait();
            world.advance()?;
            on_after_step(world);
        }
        Ok(())
    }

    /// Put the model back to its initial pose and the clock back to zero.
    /// Outstanding handles stay valid.
    pub fn reset(&mut self) -> Result<(), SimError> {
        started(&mut self.world)?.reset()
    }

    /// Zero until the server is started.
    pub fn simulation_time(&self) -> Duration {
        self.world
            .as_ref()
            .map_or(Duration::ZERO, World::simulation_time)
    }

    /// Name of the spawned model, once started.
    pub fn robot_name(&self) -> Option<&str> {
        self.world.as_ref().map(World::model_name)
    }

    /// Resolve a link of the spawned model by name.
    pub fn get_link(&self, name: &str) -> Result<LinkHandle, SimError> {
        self.world()?.get_link(name)
    }

    /// Resolve a joint of the spawned model by name.
    pub fn get_joint(&self, name: &str) -> Result<JointHandle, SimError> {
        self.world()?.get_joint(name)
    }

    /// The started world, for reading state through handles.
    pub fn world(&self) -> Result<&World, SimError> {
        self.world.as_ref().ok_or(SimError::NotStarted)
    }

    /// The started world, for commanding torques through handles.
    pub fn world_mut(&mut self) -> Result<&mut World, SimError> {
        self.world.as_mut().ok_or(SimError::NotStarted)
    }
}

fn started(world: &mut Option<World>) -> Result<&mut World, SimError> {
    world.as_mut().ok_or_else(|| {
        error!("the simulation server is not initialized");
        SimError::NotStarted
    })
}

/// Holds stepping back to a wall-clock rate when one is configured.
#[derive(Debug, Default)]
struct Pacer {
    period: Option<Duration>,
    last: Option<Instant>,
}

impl Pacer {
    fn new(rate: f64) -> Self {
        let period = if rate > 0.0 {
            Duration::try_from_secs_f64(rate.recip()).ok()
        } else {
            None
        };
        Self { period, last: None }
    }

    fn wait(&mut self) {
        let Some(period) = self.period else {
            return;
        };
        if let Some(last) = self.last {
            let elapsed = last.elapsed();
            if elapsed < period {
                std::thread::sleep(period - elapsed);
            }
        }
        self.last = Some(Instant::now());
    }
}
