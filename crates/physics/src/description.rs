//! World and model descriptions extracted from SDF documents.

use glam::{DQuat, DVec3};
use simserver_common::Pose;

use crate::error::{Result, SdfError};
use crate::sdf::{Element, parse_document};

const DEFAULT_GRAVITY: DVec3 = DVec3::new(0.0, 0.0, -9.8);
const DEFAULT_MAX_STEP_SIZE: f64 = 0.001;

/// Static environment: gravity, integration step and an optional ground plane.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldDescription {
    pub name: String,
    pub gravity: DVec3,
    /// Seconds of simulated time per step.
    pub max_step_size: f64,
    /// Height of a horizontal ground plane, if the world has one.
    pub ground_height: Option<f64>,
}

impl WorldDescription {
    /// Read the first `<world>` of an SDF document.
    pub fn parse(xml: &str) -> Result<Self> {
        let root = sdf_root(xml)?;
        let world = root.required_child("world")?;
        let name = world.attribute("name").unwrap_or("default").to_string();

        let physics = world.child("physics");
        let gravity = match world.child_vec3("gravity")? {
            Some(g) => g,
            None => match physics {
                Some(p) => p.child_vec3("gravity")?.unwrap_or(DEFAULT_GRAVITY),
                None => DEFAULT_GRAVITY,
            },
        };
        let max_step_size = match physics {
            Some(p) => p.child_f64("max_step_size")?,
            None => None,
        };
        let max_step_size = max_step_size.unwrap_or(DEFAULT_MAX_STEP_SIZE);
        if max_step_size <= 0.0 {
            return Err(SdfError::InvalidValue {
                element: "max_step_size".into(),
                message: format!("must be positive, got {max_step_size}"),
            });
        }

        let mut ground_height: Option<f64> = None;
        for model in world.children("model") {
            if model.find("plane").is_some() {
                let z = model.pose()?.position.z;
                ground_height = Some(ground_height.map_or(z, |h| h.max(z)));
            }
        }
        for include in world.children("include") {
            let is_ground = include
                .child("uri")
                .is_some_and(|uri| uri.text().contains("ground_plane"));
            if is_ground {
                let z = include.pose()?.position.z;
                ground_height = Some(ground_height.map_or(z, |h| h.max(z)));
            }
        }

        Ok(Self {
            name,
            gravity,
            max_step_size,
            ground_height,
        })
    }
}

/// Collision geometry of a link.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Box { size: DVec3 },
    Sphere { radius: f64 },
    /// Axis along the link's local Z.
    Cylinder { radius: f64, length: f64 },
}

impl Shape {
    /// How far the shape reaches below its origin along world Z when the
    /// link has the given orientation.
    pub fn vertical_extent(&self, orientation: DQuat) -> f64 {
        match *self {
            Shape::Box { size } => {
                let half = size * 0.5;
                (orientation * DVec3::X).z.abs() * half.x
                    + (orientation * DVec3::Y).z.abs() * half.y
                    + (orientation * DVec3::Z).z.abs() * half.z
            }
            Shape::Sphere { radius } => radius,
            Shape::Cylinder { radius, length } => {
                let a = (orientation * DVec3::Z).z.clamp(-1.0, 1.0);
                radius * (1.0 - a * a).sqrt() + 0.5 * length * a.abs()
            }
        }
    }

    fn parse(geometry: &Element) -> Result<Option<Self>> {
        if let Some(b) = geometry.child("box") {
            let size = b.child_vec3("size")?.unwrap_or(DVec3::ONE);
            non_negative("box size", size.min_element())?;
            return Ok(Some(Shape::Box { size }));
        }
        if let Some(s) = geometry.child("sphere") {
            let radius = s.child_f64("radius")?.unwrap_or(1.0);
            non_negative("sphere radius", radius)?;
            return Ok(Some(Shape::Sphere { radius }));
        }
        if let Some(c) = geometry.child("cylinder") {
            let radius = c.child_f64("radius")?.unwrap_or(1.0);
            let length = c.child_f64("length")?.unwrap_or(1.0);
            non_negative("cylinder radius", radius)?;
            non_negative("cylinder length", length)?;
            return Ok(Some(Shape::Cylinder { radius, length }));
        }
        // Meshes, planes and friends do not take part in contact here.
        Ok(None)
    }
}

fn non_negative(what: &str, value: f64) -> Result<()> {
    if value < 0.0 {
        return Err(SdfError::InvalidValue {
            element: what.into(),
            message: format!("must not be negative, got {value}"),
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkDescription {
    pub name: String,
    /// Pose in the model frame.
    pub pose: Pose,
    pub mass: f64,
    /// Principal moments `(ixx, iyy, izz)` in the link frame.
    pub inertia: DVec3,
    pub collisions: Vec<Shape>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JointKind {
    /// `revolute` and `continuous`.
    Revolute,
    Prismatic,
    Fixed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JointDescription {
    pub name: String,
    pub kind: JointKind,
    /// `None` when the joint attaches the child to the world.
    pub parent: Option<String>,
    pub child: String,
    /// Unit axis in the child link frame.
    pub axis: DVec3,
    pub damping: f64,
}

/// The dynamic model to spawn.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDescription {
    pub name: String,
    pub is_static: bool,
    pub links: Vec<LinkDescription>,
    pub joints: Vec<JointDescription>,
}

impl ModelDescription {
    /// Read the first `<model>` of an SDF document.
    pub fn parse(xml: &str) -> Result<Self> {
        let root = sdf_root(xml)?;
        let model = root.required_child("model")?;
        let name = model.required_attribute("name")?.to_string();
        if name.is_empty() {
            return Err(SdfError::MissingAttribute {
                attribute: "name",
                element: "model".into(),
            });
        }
        let is_static = model.child_bool("static")?.unwrap_or(false);

        let links = model
            .children("link")
            .map(parse_link)
            .collect::<Result<Vec<_>>>()?;
        if links.is_empty() {
            return Err(SdfError::MissingElement {
                element: "link",
                context: format!("model {name}"),
            });
        }
        let joints = model
            .children("joint")
            .map(parse_joint)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name,
            is_static,
            links,
            joints,
        })
    }
}

fn sdf_root(xml: &str) -> Result<Element> {
    let root = parse_document(xml)?;
    if root.name != "sdf" {
        return Err(SdfError::MissingElement {
            element: "sdf",
            context: "document root".into(),
        });
    }
    Ok(root)
}

fn parse_link(link: &Element) -> Result<LinkDescription> {
    let name = link.required_attribute("name")?.to_string();
    let pose = link.pose()?;

    let (mut mass, mut inertia) = (1.0, DVec3::ONE);
    if let Some(inertial) = link.child("inertial") {
        mass = inertial.child_f64("mass")?.unwrap_or(mass);
        if let Some(moments) = inertial.child("inertia") {
            inertia = DVec3::new(
                moments.child_f64("ixx")?.unwrap_or(1.0),
                moments.child_f64("iyy")?.unwrap_or(1.0),
                moments.child_f64("izz")?.unwrap_or(1.0),
            );
        }
    }
    if mass <= 0.0 || inertia.min_element() <= 0.0 {
        return Err(SdfError::InvalidValue {
            element: format!("inertial of link {name}"),
            message: "mass and moments of inertia must be positive".into(),
        });
    }

    let mut collisions = Vec::new();
    for collision in link.children("collision") {
        if let Some(geometry) = collision.child("geometry") {
            collisions.extend(Shape::parse(geometry)?);
        }
    }

    Ok(LinkDescription {
        name,
        pose,
        mass,
        inertia,
        collisions,
    })
}

fn parse_joint(joint: &Element) -> Result<JointDescription> {
    let name = joint.required_attribute("name")?.to_string();
    let kind = match joint.required_attribute("type")? {
        "revolute" | "continuous" => JointKind::Revolute,
        "prismatic" => JointKind::Prismatic,
        "fixed" => JointKind::Fixed,
        other => {
            return Err(SdfError::UnsupportedJoint {
                joint: name,
                kind: other.to_string(),
            });
        }
    };
    let parent = joint.required_child("parent")?.text().to_string();
    let parent = (parent != "world").then_some(parent);
    let child = joint.required_child("child")?.text().to_string();

    let (mut axis, mut damping) = (DVec3::Z, 0.0);
    if let Some(a) = joint.child("axis") {
        axis = a.child_vec3("xyz")?.unwrap_or(axis);
        if let Some(dynamics) = a.child("dynamics") {
            damping = dynamics.child_f64("damping")?.unwrap_or(0.0);
        }
    }
    let axis = axis.try_normalize().ok_or_else(|| SdfError::InvalidValue {
        element: format!("axis of joint {name}"),
        message: "axis must not be zero".into(),
    })?;
    non_negative("joint damping", damping)?;

    Ok(JointDescription {
        name,
        kind,
        parent,
        child,
        axis,
        damping,
    })
}
