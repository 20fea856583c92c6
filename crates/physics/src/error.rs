//! Error types for reading world and model descriptions.

use thiserror::Error;

/// Errors that can occur while reading an SDF document.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SdfError {
    /// The document is not well-formed XML.
    #[error("XML parse error: {0}")]
    Xml(String),

    /// Missing required element.
    #[error("missing required element: {element} in {context}")]
    MissingElement {
        element: &'static str,
        context: String,
    },

    /// Missing required attribute.
    #[error("missing required attribute: {attribute} on {element}")]
    MissingAttribute {
        attribute: &'static str,
        element: String,
    },

    /// An element holds text that does not make sense for it.
    #[error("invalid value for {element}: {message}")]
    InvalidValue { element: String, message: String },

    #[error("unsupported joint type {kind} on joint {joint}")]
    UnsupportedJoint { joint: String, kind: String },

    /// A joint refers to a link the model does not define.
    #[error("joint {joint} refers to undefined link {link}")]
    UndefinedLink { joint: String, link: String },

    #[error("link {0} is the child of more than one joint")]
    MultipleParents(String),

    /// The joints do not form a tree.
    #[error("kinematic loop through link {0}")]
    KinematicLoop(String),
}

pub type Result<T> = std::result::Result<T, SdfError>;
