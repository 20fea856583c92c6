//! Deterministic rigid-body integrator behind [`PhysicsBackend`].
//!
//! The model is treated as a forest of kinematic trees. Each tree root is
//! either free (a floating body pulled by gravity and stopped by the ground
//! plane) or anchored to the world by a joint. Joint coordinates are
//! integrated with semi-implicit Euler, then link poses follow by forward
//! kinematics from the roots.

use glam::{DQuat, DVec3};
use simserver_common::{JointId, JointState, LinkId, LinkState, Pose};
use simserver_kernel::{BackendError, BackendSetup, ModelLayout, PhysicsBackend};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tracing::{debug, info};

use crate::description::{JointKind, ModelDescription, Shape, WorldDescription};
use crate::error::SdfError;

/// Reference backend reading SDF descriptions.
#[derive(Debug, Default)]
pub struct RigidBodyBackend {
    scene: Option<Scene>,
}

impl RigidBodyBackend {
    /// A backend with nothing loaded yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `initialize` succeeded and `shutdown` has not been called since.
    pub fn is_initialized(&self) -> bool {
        self.scene.is_some()
    }
}

impl PhysicsBackend for RigidBodyBackend {
    fn initialize(&mut self, setup: &BackendSetup<'_>) -> Result<ModelLayout, BackendError> {
        let world = WorldDescription::parse(setup.world_description)
            .map_err(|e| BackendError::InvalidWorld(e.to_string()))?;
        let model = ModelDescription::parse(setup.model_description)
            .map_err(|e| BackendError::InvalidModel(e.to_string()))?;
        let scene = Scene::build(&world, &model, setup)
            .map_err(|e| BackendError::InvalidModel(e.to_string()))?;

        if setup.verbose {
            info!(
                world = %world.name,
                gravity = ?world.gravity,
                step = world.max_step_size,
                ground = ?world.ground_height,
                "world loaded"
            );
        } else {
            debug!(world = %world.name, step = world.max_step_size, "world loaded");
        }

        let layout = ModelLayout {
            model_name: model.name,
            links: model.links.into_iter().map(|l| l.name).collect(),
            joints: model.joints.into_iter().map(|j| j.name).collect(),
        };
        self.scene = Some(scene);
        Ok(layout)
    }

    fn timestep(&self) -> Duration {
        self.scene.as_ref().map_or(Duration::ZERO, |s| s.timestep)
    }

    fn advance(&mut self) -> Result<(), BackendError> {
        match self.scene.as_mut() {
            Some(scene) => scene.advance(),
            None => Err(BackendError::Other("backend is not initialized".into())),
        }
    }

    fn reset(&mut self) -> Result<(), BackendError> {
        match self.scene.as_mut() {
            Some(scene) => {
                scene.state = scene.initial.clone();
                Ok(())
            }
            None => Err(BackendError::Other("backend is not initialized".into())),
        }
    }

    fn link_state(&self, link: LinkId) -> LinkState {
        self.scene
            .as_ref()
            .map(|s| s.state.links[link.0])
            .unwrap_or_default()
    }

    fn joint_state(&self, joint: JointId) -> JointState {
        self.scene
            .as_ref()
            .map(|s| s.state.joints[joint.0])
            .unwrap_or_default()
    }

    fn set_joint_torque(&mut self, joint: JointId, torque: f64) {
        if let Some(scene) = self.scene.as_mut() {
            scene.state.joints[joint.0].torque = torque;
        }
    }

    fn shutdown(&mut self) {
        self.scene = None;
    }
}

/// How a link hangs in its tree.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Attachment {
    /// Floating root.
    Free,
    /// Root attached to the fixed model frame through a joint.
    Anchored { joint: usize },
    Child { joint: usize, parent: usize },
}

#[derive(Debug, Clone)]
struct Body {
    attachment: Attachment,
    /// Pose relative to the parent link (or the model frame for roots) at
    /// zero joint position.
    rest: Pose,
    root: usize,
    collisions: Vec<Shape>,
}

#[derive(Debug, Clone)]
struct Axis {
    kind: JointKind,
    /// Unit axis in the child frame.
    axis: DVec3,
    damping: f64,
    /// Inertia seen along the axis: mass for prismatic joints, moment for
    /// revolute ones.
    inertia: f64,
}

impl Axis {
    fn motion(&self, position: f64) -> Pose {
        match self.kind {
            JointKind::Revolute => {
                Pose::new(DVec3::ZERO, DQuat::from_axis_angle(self.axis, position))
            }
            JointKind::Prismatic => Pose::new(self.axis * position, DQuat::IDENTITY),
            JointKind::Fixed => Pose::IDENTITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Snapshot {
    links: Vec<LinkState>,
    joints: Vec<JointState>,
}

impl Snapshot {
    fn is_finite(&self) -> bool {
        self.links.iter().all(|l| {
            l.pose.is_finite()
                && l.linear_velocity.is_finite()
                && l.angular_velocity.is_finite()
                && l.linear_acceleration.is_finite()
                && l.angular_acceleration.is_finite()
        }) && self
            .joints
            .iter()
            .all(|j| j.position.is_finite() && j.velocity.is_finite())
    }
}

#[derive(Debug)]
struct Scene {
    model_pose: Pose,
    gravity: DVec3,
    ground_height: Option<f64>,
    dt: f64,
    timestep: Duration,
    /// Whether anything moves at all.
    dynamic: bool,
    bodies: Vec<Body>,
    axes: Vec<Axis>,
    /// Link indices, parents before children.
    order: Vec<usize>,
    initial: Snapshot,
    state: Snapshot,
}

impl Scene {
    fn build(
        world: &WorldDescription,
        model: &ModelDescription,
        setup: &BackendSetup<'_>,
    ) -> Result<Self, SdfError> {
        let index: HashMap<&str, usize> = model
            .links
            .iter()
            .enumerate()
            .map(|(i, l)| (l.name.as_str(), i))
            .collect();
        let lookup = |joint: &str, link: &str| match index.get(link) {
            Some(&i) => Ok(i),
            None => Err(SdfError::UndefinedLink {
                joint: joint.to_string(),
                link: link.to_string(),
            }),
        };

        let mut attachments = vec![Attachment::Free; model.links.len()];
        let mut has_parent = vec![false; model.links.len()];
        let mut axes = Vec::with_capacity(model.joints.len());
        for (j, joint) in model.joints.iter().enumerate() {
            let child = lookup(&joint.name, &joint.child)?;
            let parent = joint
                .parent
                .as_deref()
                .map(|p| lookup(&joint.name, p))
                .transpose()?;
            if has_parent[child] {
                return Err(SdfError::MultipleParents(joint.child.clone()));
            }
            if parent == Some(child) {
                return Err(SdfError::KinematicLoop(joint.child.clone()));
            }
            has_parent[child] = true;
            attachments[child] = match parent {
                Some(parent) => Attachment::Child { joint: j, parent },
                None => Attachment::Anchored { joint: j },
            };

            let link = &model.links[child];
            let inertia = match joint.kind {
                JointKind::Prismatic => link.mass,
                _ => (joint.axis * joint.axis).dot(link.inertia),
            };
            axes.push(Axis {
                kind: joint.kind,
                axis: joint.axis,
                damping: joint.damping,
                inertia,
            });
        }

        let order = match topological_order(&attachments) {
            Ok(order) => order,
            Err(link) => {
                let name = model.links[link].name.clone();
                return Err(SdfError::KinematicLoop(name));
            }
        };

        let mut bodies: Vec<Body> = Vec::with_capacity(model.links.len());
        let mut roots = vec![0; model.links.len()];
        for &i in &order {
            roots[i] = match attachments[i] {
                Attachment::Child { parent, .. } => roots[parent],
                _ => i,
            };
        }
        for (i, link) in model.links.iter().enumerate() {
            let rest = match attachments[i] {
                Attachment::Child { parent, .. } => model.links[parent].pose.inverse() * link.pose,
                _ => link.pose,
            };
            bodies.push(Body {
                attachment: attachments[i],
                rest,
                root: roots[i],
                collisions: link.collisions.clone(),
            });
        }

        let model_pose = setup.initial_pose;
        let links = model
            .links
            .iter()
            .map(|link| LinkState {
                pose: model_pose * link.pose,
                ..LinkState::default()
            })
            .collect();
        let initial = Snapshot {
            links,
            joints: vec![JointState::default(); model.joints.len()],
        };

        // Integrate with exactly the step the clock reports.
        let timestep = Duration::from_nanos((world.max_step_size * 1e9).round() as u64);
        Ok(Self {
            model_pose,
            gravity: world.gravity,
            ground_height: world.ground_height,
            dt: timestep.as_secs_f64(),
            timestep,
            dynamic: setup.enable_physics && !model.is_static,
            bodies,
            axes,
            order,
            state: initial.clone(),
            initial,
        })
    }

    fn advance(&mut self) -> Result<(), BackendError> {
        if !self.dynamic {
            return Ok(());
        }
        let mut previous = self.state.clone();
        let dt = self.dt;

        for (axis, joint) in self.axes.iter().zip(&mut self.state.joints) {
            if axis.kind == JointKind::Fixed {
                continue;
            }
            let accel = (joint.torque - axis.damping * joint.velocity) / axis.inertia;
            joint.velocity += accel * dt;
            joint.position += joint.velocity * dt;
        }

        for (i, body) in self.bodies.iter().enumerate() {
            if body.attachment == Attachment::Free {
                let link = &mut self.state.links[i];
                link.linear_velocity += self.gravity * dt;
                link.pose.position += link.linear_velocity * dt;
            }
        }

        self.forward_kinematics();
        self.ground_contact();
        self.update_velocities(&previous);

        if !self.state.is_finite() {
            // Commands stay as issued; only the motion rolls back.
            for (restored, current) in previous.joints.iter_mut().zip(&self.state.joints) {
                restored.torque = current.torque;
            }
            self.state = previous;
            return Err(BackendError::Diverged(
                "non-finite link or joint state".into(),
            ));
        }
        Ok(())
    }

    fn forward_kinematics(&mut self) {
        for &i in &self.order {
            let body = &self.bodies[i];
            let pose = match body.attachment {
                Attachment::Free => continue,
                Attachment::Anchored { joint } => {
                    let motion = self.axes[joint].motion(self.state.joints[joint].position);
                    self.model_pose * body.rest * motion
                }
                Attachment::Child { joint, parent } => {
                    let motion = self.axes[joint].motion(self.state.joints[joint].position);
                    self.state.links[parent].pose * body.rest * motion
                }
            };
            self.state.links[i].pose = pose;
        }
    }

    /// Push every free tree out of the ground plane and stop its fall.
    fn ground_contact(&mut self) {
        let Some(ground) = self.ground_height else {
            return;
        };
        let mut lowest: HashMap<usize, f64> = HashMap::new();
        for (i, body) in self.bodies.iter().enumerate() {
            if self.bodies[body.root].attachment != Attachment::Free {
                continue;
            }
            let pose = self.state.links[i].pose;
            for shape in &body.collisions {
                let bottom = pose.position.z - shape.vertical_extent(pose.orientation);
                let entry = lowest.entry(body.root).or_insert(bottom);
                *entry = entry.min(bottom);
            }
        }
        for (root, bottom) in lowest {
            let penetration = ground - bottom;
            if penetration <= 0.0 {
                continue;
            }
            for (i, body) in self.bodies.iter().enumerate() {
                if body.root == root {
                    self.state.links[i].pose.position.z += penetration;
                }
            }
            let velocity = &mut self.state.links[root].linear_velocity;
            velocity.z = velocity.z.max(0.0);
        }
    }

    fn update_velocities(&mut self, previous: &Snapshot) {
        let inv_dt = self.dt.recip();
        for &i in &self.order {
            let body = &self.bodies[i];
            let (joint, parent) = match body.attachment {
                Attachment::Free => (None, None),
                Attachment::Anchored { joint } => (Some(joint), None),
                Attachment::Child { joint, parent } => (Some(joint), Some(parent)),
            };
            let pose = self.state.links[i].pose;
            let (mut linear, mut angular) = match parent {
                Some(p) => {
                    let parent = &self.state.links[p];
                    let lever = pose.position - parent.pose.position;
                    (
                        parent.linear_velocity + parent.angular_velocity.cross(lever),
                        parent.angular_velocity,
                    )
                }
                None if joint.is_none() => (
                    self.state.links[i].linear_velocity,
                    self.state.links[i].angular_velocity,
                ),
                None => (DVec3::ZERO, DVec3::ZERO),
            };
            if let Some(j) = joint {
                let axis = &self.axes[j];
                let axis_world = pose.orientation * axis.axis;
                let rate = self.state.joints[j].velocity;
                match axis.kind {
                    JointKind::Revolute => angular += axis_world * rate,
                    JointKind::Prismatic => linear += axis_world * rate,
                    JointKind::Fixed => {}
                }
            }

            let before = &previous.links[i];
            let link = &mut self.state.links[i];
            link.linear_acceleration = (linear - before.linear_velocity) * inv_dt;
            link.angular_acceleration = (angular - before.angular_velocity) * inv_dt;
            link.linear_velocity = linear;
            link.angular_velocity = angular;
        }
    }
}

/// Parents-first order of all links. Fails with a link on a cycle when some
/// links cannot be reached from a root.
fn topological_order(attachments: &[Attachment]) -> Result<Vec<usize>, usize> {
    let mut children = vec![Vec::new(); attachments.len()];
    let mut queue = VecDeque::new();
    for (i, attachment) in attachments.iter().enumerate() {
        match *attachment {
            Attachment::Child { parent, .. } => children[parent].push(i),
            _ => queue.push_back(i),
        }
    }
    let mut order = Vec::with_capacity(attachments.len());
    while let Some(i) = queue.pop_front() {
        order.push(i);
        queue.extend(children[i].iter().copied());
    }
    if order.len() < attachments.len() {
        let mut reached = vec![false; attachments.len()];
        for &i in &order {
            reached[i] = true;
        }
        let stuck = reached.iter().position(|r| !r).unwrap_or(0);
        return Err(stuck);
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    const WORLD: &str = r#"<sdf version="1.6"><world name="default">
        <physics type="ode"><max_step_size>0.001</max_step_size></physics>
        <include><uri>model://ground_plane</uri></include>
      </world></sdf>"#;

    const PENDULUM: &str = r#"<sdf version="1.6"><model name="pendulum">
        <link name="base"/>
        <link name="arm"><pose>0 0 1 0 0 0</pose>
          <inertial><mass>1</mass><inertia><ixx>2</ixx><iyy>2</iyy><izz>2</izz></inertia></inertial>
        </link>
        <joint name="pivot" type="fixed"><parent>world</parent><child>base</child></joint>
        <joint name="hinge" type="revolute"><parent>base</parent><child>arm</child>
          <axis><xyz>0 0 1</xyz></axis></joint>
      </model></sdf>"#;

    const BALL: &str = r#"<sdf><model name="ball"><link name="body">
        <pose>0 0 1 0 0 0</pose>
        <collision name="c"><geometry><sphere><radius>0.25</radius></sphere></geometry></collision>
      </link></model></sdf>"#;

    fn setup<'a>(world: &'a str, model: &'a str) -> BackendSetup<'a> {
        BackendSetup {
            world_description: world,
            model_description: model,
            initial_pose: Pose::IDENTITY,
            enable_physics: true,
            verbose: false,
        }
    }

    fn backend(model: &str) -> RigidBodyBackend {
        let mut backend = RigidBodyBackend::new();
        backend.initialize(&setup(WORLD, model)).unwrap();
        backend
    }

    #[test]
    fn layout_lists_entities_in_document_order() {
        let mut backend = RigidBodyBackend::new();
        let layout = backend.initialize(&setup(WORLD, PENDULUM)).unwrap();
        assert_eq!(layout.model_name, "pendulum");
        assert_eq!(layout.links, ["base", "arm"]);
        assert_eq!(layout.joints, ["pivot", "hinge"]);
        assert_eq!(backend.timestep(), Duration::from_millis(1));
        assert!(backend.is_initialized());
    }

    #[test]
    fn description_errors_are_classified() {
        let mut backend = RigidBodyBackend::new();
        let err = backend.initialize(&setup("<sdf/>", PENDULUM)).unwrap_err();
        assert!(matches!(err, BackendError::InvalidWorld(_)));
        let err = backend.initialize(&setup(WORLD, "<sdf>")).unwrap_err();
        assert!(matches!(err, BackendError::InvalidModel(_)));
        assert!(!backend.is_initialized());
        assert!(backend.initialize(&setup(WORLD, PENDULUM)).is_ok());
    }

    #[test]
    fn broken_topologies_are_rejected() {
        let model = |joints: &str| {
            format!(
                "<sdf><model name='m'><link name='a'/><link name='b'/>{joints}</model></sdf>"
            )
        };
        let cases = [
            "<joint name='j' type='fixed'><parent>a</parent><child>ghost</child></joint>",
            "<joint name='j' type='fixed'><parent>a</parent><child>a</child></joint>",
            "<joint name='j' type='fixed'><parent>a</parent><child>b</child></joint>\
             <joint name='k' type='fixed'><parent>world</parent><child>b</child></joint>",
            "<joint name='j' type='fixed'><parent>a</parent><child>b</child></joint>\
             <joint name='k' type='fixed'><parent>b</parent><child>a</child></joint>",
        ];
        for joints in cases {
            let mut backend = RigidBodyBackend::new();
            let xml = model(joints);
            let err = backend.initialize(&setup(WORLD, &xml)).unwrap_err();
            assert!(
                matches!(err, BackendError::InvalidModel(_)),
                "{joints}: {err}"
            );
        }
    }

    #[test]
    fn torque_spins_a_revolute_joint() {
        let mut backend = backend(PENDULUM);
        backend.set_joint_torque(JointId(1), 2.0);
        backend.advance().unwrap();
        let hinge = backend.joint_state(JointId(1));
        // qdd = 2 / izz = 1 rad/s^2
        assert!((hinge.velocity - 0.001).abs() < 1e-12);
        assert!((hinge.position - 1e-6).abs() < 1e-15);
        assert_eq!(hinge.torque, 2.0);

        let arm = backend.link_state(LinkId(1));
        assert!(arm.angular_velocity.abs_diff_eq(DVec3::Z * 0.001, 1e-12));
        assert!((arm.angular_acceleration.z - 1.0).abs() < 1e-9);
        assert!(arm.pose.position.abs_diff_eq(DVec3::Z, 1e-12));
    }

    #[test]
    fn damping_opposes_motion() {
        let damped = PENDULUM.replace(
            "<axis><xyz>0 0 1</xyz></axis>",
            "<axis><xyz>0 0 1</xyz><dynamics><damping>1</damping></dynamics></axis>",
        );
        let mut backend = backend(&damped);
        backend.set_joint_torque(JointId(1), 2.0);
        for _ in 0..30_000 {
            backend.advance().unwrap();
        }
        // Terminal velocity is torque / damping.
        let velocity = backend.joint_state(JointId(1)).velocity;
        assert!((velocity - 2.0).abs() < 1e-3);
    }

    #[test]
    fn free_body_falls_and_settles_on_the_ground() {
        let mut backend = backend(BALL);
        backend.advance().unwrap();
        let first = backend.link_state(LinkId(0));
        assert!((first.linear_velocity.z + 0.0098).abs() < 1e-12);
        assert!((first.linear_acceleration.z + 9.8).abs() < 1e-9);
        assert!(first.pose.position.z < 1.0);

        for _ in 0..2_000 {
            backend.advance().unwrap();
        }
        let rest = backend.link_state(LinkId(0));
        assert!((rest.pose.position.z - 0.25).abs() < 1e-9);
        assert!(rest.linear_velocity.z.abs() < 0.01);
    }

    #[test]
    fn integration_uses_the_reported_timestep() {
        let world = r#"<sdf><world name="fine">
            <physics><max_step_size>0.000333333333</max_step_size></physics>
          </world></sdf>"#;
        let mut backend = RigidBodyBackend::new();
        backend.initialize(&setup(world, BALL)).unwrap();
        assert_eq!(backend.timestep(), Duration::from_nanos(333_333));
        backend.advance().unwrap();
        let dt = backend.timestep().as_secs_f64();
        let body = backend.link_state(LinkId(0));
        assert_eq!(body.linear_velocity.z, -9.8 * dt);
        assert_eq!(body.pose.position.z, 1.0 + body.linear_velocity.z * dt);
    }

    #[test]
    fn body_without_ground_keeps_falling() {
        let mut backend = RigidBodyBackend::new();
        let void = "<sdf><world name='void'/></sdf>";
        backend.initialize(&setup(void, BALL)).unwrap();
        for _ in 0..500 {
            backend.advance().unwrap();
        }
        // Without a plane the ball passes the height it would rest at.
        assert!(backend.link_state(LinkId(0)).pose.position.z < 0.0);
    }

    #[test]
    fn rolled_wheel_rests_on_its_rim() {
        let wheel = format!(
            r#"<sdf><model name="w"><link name="wheel">
                <pose>0 0 0.1 {FRAC_PI_2} 0 0</pose>
                <collision name="c"><geometry><cylinder>
                  <radius>0.1</radius><length>0.05</length>
                </cylinder></geometry></collision>
              </link></model></sdf>"#
        );
        let mut backend = backend(&wheel);
        backend.advance().unwrap();
        let state = backend.link_state(LinkId(0));
        assert!((state.pose.position.z - 0.1).abs() < 1e-9);
        assert_eq!(state.linear_velocity.z, 0.0);
    }

    #[test]
    fn prismatic_joint_slides_along_its_axis() {
        let slider = r#"<sdf><model name="slider">
            <link name="rail"/><link name="cart"><inertial><mass>2</mass></inertial></link>
            <joint name="fix" type="fixed"><parent>world</parent><child>rail</child></joint>
            <joint name="slide" type="prismatic"><parent>rail</parent><child>cart</child>
              <axis><xyz>1 0 0</xyz></axis></joint>
          </model></sdf>"#;
        let mut backend = backend(slider);
        backend.set_joint_torque(JointId(1), 4.0);
        for _ in 0..1000 {
            backend.advance().unwrap();
        }
        let cart = backend.link_state(LinkId(1));
        let slide = backend.joint_state(JointId(1));
        assert!((slide.velocity - 2.0).abs() < 1e-9);
        assert!((cart.pose.position.x - slide.position).abs() < 1e-12);
        assert!((cart.linear_velocity.x - 2.0).abs() < 1e-9);
    }

    #[test]
    fn static_or_disabled_models_do_not_move() {
        let fixed_ball = BALL.replace("<link", "<static>true</static><link");
        let mut frozen = backend(&fixed_ball);
        frozen.advance().unwrap();
        assert_eq!(frozen.link_state(LinkId(0)).pose.position.z, 1.0);

        let mut disabled = RigidBodyBackend::new();
        let mut s = setup(WORLD, PENDULUM);
        s.enable_physics = false;
        disabled.initialize(&s).unwrap();
        disabled.set_joint_torque(JointId(1), 5.0);
        disabled.advance().unwrap();
        assert_eq!(disabled.joint_state(JointId(1)).velocity, 0.0);
        assert_eq!(disabled.joint_state(JointId(1)).torque, 5.0);
    }

    #[test]
    fn divergence_keeps_the_last_good_state() {
        let mut backend = backend(PENDULUM);
        backend.set_joint_torque(JointId(1), 1.0);
        backend.advance().unwrap();
        let good = backend.joint_state(JointId(1));

        backend.set_joint_torque(JointId(1), f64::NAN);
        let err = backend.advance().unwrap_err();
        assert!(matches!(err, BackendError::Diverged(_)));
        let after = backend.joint_state(JointId(1));
        assert_eq!(after.position, good.position);
        assert_eq!(after.velocity, good.velocity);
        assert!(after.torque.is_nan());
    }

    #[test]
    fn initial_pose_places_the_model() {
        let mut backend = RigidBodyBackend::new();
        let mut s = setup(WORLD, PENDULUM);
        let yaw = DVec3::new(0.0, 0.0, FRAC_PI_2);
        s.initial_pose = Pose::from_xyz_rpy(DVec3::new(1.0, 2.0, 0.0), yaw);
        backend.initialize(&s).unwrap();
        let expected = DVec3::new(1.0, 2.0, 1.0);
        let arm = backend.link_state(LinkId(1));
        assert!(arm.pose.position.abs_diff_eq(expected, 1e-12));

        backend.advance().unwrap();
        let arm = backend.link_state(LinkId(1));
        assert!(arm.pose.position.abs_diff_eq(expected, 1e-12));
    }

    #[test]
    fn reset_restores_the_initial_state() {
        let mut backend = backend(PENDULUM);
        let link = backend.link_state(LinkId(1));
        let joint = backend.joint_state(JointId(1));
        backend.set_joint_torque(JointId(1), 3.0);
        for _ in 0..50 {
            backend.advance().unwrap();
        }
        assert_ne!(backend.joint_state(JointId(1)), joint);
        backend.reset().unwrap();
        assert_eq!(backend.link_state(LinkId(1)), link);
        assert_eq!(backend.joint_state(JointId(1)), joint);
    }

    #[test]
    fn shutdown_releases_the_scene() {
        let mut backend = backend(PENDULUM);
        backend.shutdown();
        assert!(!backend.is_initialized());
        assert!(backend.advance().is_err());
        assert_eq!(backend.timestep(), Duration::ZERO);
    }
}
