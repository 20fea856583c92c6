//! Minimal SDF (XML) document reader.
//!
//! Reads the whole document into a small element tree; the description
//! builders then pick out the handful of elements they understand and ignore
//! the rest.

use glam::DVec3;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use simserver_common::Pose;

use crate::error::{Result, SdfError};

/// One XML element with its attributes, concatenated text and children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    /// Attribute value with entity references resolved.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Attribute that must be present.
    pub fn required_attribute(&self, name: &'static str) -> Result<&str> {
        match self.attribute(name) {
            Some(value) => Ok(value),
            None => Err(SdfError::MissingAttribute {
                attribute: name,
                element: self.name.clone(),
            }),
        }
    }

    /// First direct child with the given name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Child element that must be present.
    pub fn required_child(&self, name: &'static str) -> Result<&Element> {
        self.child(name).ok_or_else(|| SdfError::MissingElement {
            element: name,
            context: self.describe(),
        })
    }

    pub fn children<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// First descendant (depth first) with the given name.
    pub fn find(&self, name: &str) -> Option<&Element> {
        for child in &self.children {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find(name) {
                return Some(found);
            }
        }
        None
    }

    /// Text content without surrounding whitespace.
    pub fn text(&self) -> &str {
        self.text.trim()
    }

    /// Text of a child parsed as one number, if the child exists.
    pub fn child_f64(&self, name: &str) -> Result<Option<f64>> {
        self.child(name)
            .map(|c| parse_floats::<1>(c).map(|[v]| v))
            .transpose()
    }

    /// Text of a child parsed as three numbers, if the child exists.
    pub fn child_vec3(&self, name: &str) -> Result<Option<DVec3>> {
        self.child(name)
            .map(|c| parse_floats::<3>(c).map(DVec3::from_array))
            .transpose()
    }

    /// The `<pose>x y z roll pitch yaw</pose>` child, identity when absent.
    pub fn pose(&self) -> Result<Pose> {
        match self.child("pose") {
            Some(pose) => {
                let [x, y, z, roll, pitch, yaw] = parse_floats::<6>(pose)?;
                Ok(Pose::from_xyz_rpy(
                    DVec3::new(x, y, z),
                    DVec3::new(roll, pitch, yaw),
                ))
            }
            None => Ok(Pose::IDENTITY),
        }
    }

    /// Text of a child read as an SDF boolean (`true`/`1`), if the child exists.
    pub fn child_bool(&self, name: &str) -> Result<Option<bool>> {
        self.child(name)
            .map(|c| match c.text() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                other => Err(SdfError::InvalidValue {
                    element: c.name.clone(),
                    message: format!("expected a boolean, got {other:?}"),
                }),
            })
            .transpose()
    }

    fn describe(&self) -> String {
        match self.attribute("name") {
            Some(name) => format!("{} {name}", self.name),
            None => self.name.clone(),
        }
    }
}

/// Parse exactly `N` whitespace separated finite numbers from an element's text.
pub fn parse_floats<const N: usize>(element: &Element) -> Result<[f64; N]> {
    let invalid = |message: String| SdfError::InvalidValue {
        element: element.name.clone(),
        message,
    };
    let mut out = [0.0; N];
    let mut count = 0;
    for token in element.text().split_whitespace() {
        if count == N {
            return Err(invalid(format!("expected {N} numbers, got more")));
        }
        let value: f64 = token
            .parse()
            .map_err(|_| invalid(format!("{token:?} is not a number")))?;
        if !value.is_finite() {
            return Err(invalid(format!("{token:?} is not finite")));
        }
        out[count] = value;
        count += 1;
    }
    if count != N {
        return Err(invalid(format!("expected {N} numbers, got {count}")));
    }
    Ok(out)
}

/// Parse an XML string into its root element.
///
/// # Errors
///
/// Returns an error if the XML is malformed or has no root element.
pub fn parse_document(xml: &str) -> Result<Element> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => stack.push(element_from(e)?),
            Ok(Event::Empty(ref e)) => close(&mut stack, &mut root, element_from(e)?)?,
            Ok(Event::Text(ref t)) => {
                if let Some(top) = stack.last_mut() {
                    let text = t.unescape().map_err(xml_error)?;
                    top.text.push_str(&text);
                }
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| SdfError::Xml("unexpected closing tag".into()))?;
                close(&mut stack, &mut root, element)?;
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(xml_error(e)),
        }
    }

    if let Some(open) = stack.last() {
        return Err(SdfError::Xml(format!("unexpected EOF in {}", open.name)));
    }
    root.ok_or_else(|| SdfError::Xml("document has no root element".into()))
}

/// Build an element from a start tag, resolving entity references in
/// attribute values.
fn element_from(start: &BytesStart) -> Result<Element> {
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(xml_error)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(xml_error)?;
        attributes.push((key, value.into_owned()));
    }
    Ok(Element {
        name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
        attributes,
        ..Element::default()
    })
}

fn xml_error(err: impl std::fmt::Display) -> SdfError {
    SdfError::Xml(err.to_string())
}

/// Attach a finished element to its parent, or make it the root.
fn close(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(SdfError::Xml("more than one root element".into())),
    }
    Ok(())
}
