mod scenario;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glam::DVec3;
use serde::Serialize;
use simserver_kernel::{SimulationServer, World, rotation_matrix_to_euler_angles};
use simserver_physics::RigidBodyBackend;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::scenario::Scenario;

#[derive(Parser)]
#[command(name = "simserver-cli", about = "CLI tool for simserver scenarios")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Load a scenario, start the server and list the model's links and joints
    Validate {
        /// Scenario YAML file
        scenario: PathBuf,
    },
    /// Run a scenario for a number of steps and report the final link poses
    Run {
        /// Scenario YAML file
        scenario: PathBuf,
        /// Number of steps to simulate
        #[arg(short, long, default_value = "1000")]
        steps: u32,
        /// Constant joint torque, as `joint=value`; may be repeated
        #[arg(short, long, value_parser = parse_torque)]
        torque: Vec<(String, f64)>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn parse_torque(arg: &str) -> Result<(String, f64), String> {
    let (joint, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected joint=value, got {arg:?}"))?;
    if joint.is_empty() {
        return Err("joint name is empty".into());
    }
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("{value:?} is not a number"))?;
    Ok((joint.to_string(), value))
}

#[derive(Debug, Serialize)]
struct Report {
    model: String,
    steps: u64,
    /// Seconds.
    simulation_time: f64,
    links: Vec<LinkReport>,
    joints: Vec<JointReport>,
}

#[derive(Debug, Serialize)]
struct LinkReport {
    name: String,
    position: DVec3,
    /// `(roll, pitch, yaw)` in radians.
    orientation: DVec3,
    linear_velocity: DVec3,
}

#[derive(Debug, Serialize)]
struct JointReport {
    name: String,
    position: f64,
    velocity: f64,
    torque: f64,
}

impl Report {
    fn capture(world: &World) -> Result<Self> {
        let links = world
            .link_names()
            .map(|name| {
                let link = world.get_link(name)?;
                let pose = link.world_pose(world);
                Ok(LinkReport {
                    name: name.to_string(),
                    position: pose.position,
                    orientation: rotation_matrix_to_euler_angles(&pose.rotation_matrix()),
                    linear_velocity: link.world_linear_velocity(world),
                })
            })
            .collect::<Result<_>>()?;
        let joints = world
            .joint_names()
            .map(|name| {
                let state = world.get_joint(name)?.state(world);
                Ok(JointReport {
                    name: name.to_string(),
                    position: state.position,
                    velocity: state.velocity,
                    torque: state.torque,
                })
            })
            .collect::<Result<_>>()?;
        Ok(Self {
            model: world.model_name().to_string(),
            steps: world.tick(),
            simulation_time: world.simulation_time().as_secs_f64(),
            links,
            joints,
        })
    }

    fn print(&self) {
        println!("model: {}", self.model);
        let (steps, time) = (self.steps, self.simulation_time);
        println!("steps: {steps}, simulation time: {time:.6} s");
        for link in &self.links {
            let [x, y, z] = link.position.to_array();
            let [roll, pitch, yaw] = link.orientation.to_array();
            println!(
                "  link {:<20} xyz=({x:.6}, {y:.6}, {z:.6}) rpy=({roll:.6}, {pitch:.6}, {yaw:.6})",
                link.name
            );
        }
        for joint in &self.joints {
            println!(
                "  joint {:<19} q={:.6} qd={:.6} tau={}",
                joint.name, joint.position, joint.velocity, joint.torque
            );
        }
    }
}

fn start(path: &Path, verbose: bool) -> Result<SimulationServer> {
    let scenario = Scenario::load(path)?;
    let config = scenario.to_config(verbose)?;
    let mut server = SimulationServer::new(config, RigidBodyBackend::new());
    server
        .start()
        .with_context(|| format!("starting scenario {}", path.display()))?;
    Ok(server)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("simserver-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("kernel: fixed-step server, link/joint handles");
            println!("physics: SDF reader, rigid-body reference backend");
        }
        Commands::Validate { scenario } => {
            let server = start(&scenario, cli.verbose)?;
            let world = server.world()?;
            println!("model: {}", world.model_name());
            println!("timestep: {:?}", world.timestep());
            let links: Vec<_> = world.link_names().collect();
            let joints: Vec<_> = world.joint_names().collect();
            println!("links: {}", links.join(", "));
            println!("joints: {}", joints.join(", "));
            println!("OK");
        }
        Commands::Run {
            scenario,
            steps,
            torque,
            json,
        } => {
            let mut server = start(&scenario, cli.verbose)?;
            let world = server.world_mut()?;
            for (name, value) in &torque {
                let joint = world.get_joint(name)?;
                joint.set_torque(world, *value);
            }

            info!(steps, scenario = %scenario.display(), "running");
            server.run_for(
                steps,
                |_| {},
                |world| debug!(time = ?world.simulation_time(), "step done"),
            )?;

            let report = Report::capture(server.world()?)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                report.print();
            }
        }
    }

    Ok(())
}
