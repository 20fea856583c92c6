//! Reference physics backend for the simulation server.
//!
//! Reads a subset of SDF (world gravity, step size and ground plane; model
//! links, inertials, collision primitives and revolute/prismatic/fixed
//! joints) and integrates it deterministically.
//!
//! # Simplifications
//! - Gravity acts on free tree roots only. Anchored trees hang from the
//!   model frame.
//! - Contact is a single horizontal ground plane. Penetrating trees are
//!   lifted out and their downward velocity is cancelled; there is no
//!   friction, so wheels spin in place.
//! - Joint dynamics see only the child link's inertia along the axis.

pub mod backend;
pub mod description;
pub mod error;
pub mod sdf;

pub use backend::RigidBodyBackend;
pub use description::{
    JointDescription, JointKind, LinkDescription, ModelDescription, Shape, WorldDescription,
};
pub use error::SdfError;
