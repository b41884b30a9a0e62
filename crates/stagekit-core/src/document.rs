//! Wire document parsing and schema validation
//!
//! Documents cross the process boundary as JSON. Anything that does not fit
//! the Component shape is rejected here, before it can reach server or draft
//! state.

use crate::error::{Error, Result};
use crate::types::{Component, ComponentKind, Quaternion, ORIGIN, ROOT_NAME};
use std::collections::HashSet;

/// Allowed deviation of a quaternion's norm from 1.
pub const NORM_TOLERANCE: f64 = 1e-6;

/// Parse and validate a document.
pub fn parse_document(json: &str) -> Result<Component> {
    let root: Component = serde_json::from_str(json).map_err(|e| Error::schema(e.to_string()))?;
    validate_document(&root)?;
    Ok(root)
}

/// Convert an already-decoded JSON value into a validated document.
pub fn document_from_value(value: serde_json::Value) -> Result<Component> {
    let root: Component = serde_json::from_value(value).map_err(|e| Error::schema(e.to_string()))?;
    validate_document(&root)?;
    Ok(root)
}

/// Parse a detached subtree, such as a component about to be added.
/// Rotations are scaled to unit length before validation.
pub fn parse_component(json: &str) -> Result<Component> {
    let mut node: Component = serde_json::from_str(json).map_err(|e| Error::schema(e.to_string()))?;
    canonicalize(&mut node);
    validate_subtree(&node)?;
    Ok(node)
}

pub fn to_document_string(root: &Component) -> Result<String> {
    Ok(serde_json::to_string(root)?)
}

pub fn to_document_string_pretty(root: &Component) -> Result<String> {
    Ok(serde_json::to_string_pretty(root)?)
}

/// Check the structural invariants of a whole document.
pub fn validate_document(root: &Component) -> Result<()> {
    if root.name != ROOT_NAME {
        return Err(Error::schema(format!(
            "document root must be named \"{}\", got \"{}\"",
            ROOT_NAME, root.name
        )));
    }
    if root.attachment_point != ORIGIN || !is_identity(&root.attachment_rotation) {
        return Err(Error::schema("root must have an identity attachment"));
    }
    let mut seen = HashSet::new();
    validate_node(root, &mut seen)
}

/// The per-node checks of [`validate_document`] without the root rules.
pub fn validate_subtree(node: &Component) -> Result<()> {
    let mut seen = HashSet::new();
    validate_node(node, &mut seen)
}

fn validate_node<'a>(node: &'a Component, seen: &mut HashSet<&'a str>) -> Result<()> {
    if node.name.is_empty() {
        return Err(Error::schema("component name must not be empty"));
    }
    if !seen.insert(node.name.as_str()) {
        return Err(Error::schema(format!(
            "component name \"{}\" appears more than once",
            node.name
        )));
    }
    check_finite(&node.name, "attachment_point", &node.attachment_point)?;
    check_finite(&node.name, "attachment_rotation", &node.attachment_rotation)?;
    let norm = quaternion_norm(&node.attachment_rotation);
    if (norm - 1.0).abs() > NORM_TOLERANCE {
        return Err(Error::schema(format!(
            "{}: attachment_rotation is not normalized (norm {})",
            node.name, norm
        )));
    }
    match &node.kind {
        ComponentKind::Plain => {}
        ComponentKind::Structure(b) => {
            check_finite(&node.name, "collision_box_dimensions", &b.dimensions)?;
            check_finite(&node.name, "collision_box_point", &b.point)?;
        }
        ComponentKind::Axis(a) => {
            check_finite(&node.name, "collision_box_dimensions", &a.collision_box.dimensions)?;
            check_finite(&node.name, "collision_box_point", &a.collision_box.point)?;
            if let Some(v) = &a.axis_vector {
                check_finite(&node.name, "axis_vector", v.components())?;
            }
        }
    }
    for child in &node.children {
        validate_node(child, seen)?;
    }
    Ok(())
}

fn check_finite(name: &str, field: &str, values: &[f64]) -> Result<()> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(Error::schema(format!("{}: {} contains a non-finite value", name, field)))
    }
}

pub fn quaternion_norm(q: &Quaternion) -> f64 {
    q.iter().map(|c| c * c).sum::<f64>().sqrt()
}

/// `q` and `-q` encode the same rotation, so both signs of the identity count.
fn is_identity(q: &Quaternion) -> bool {
    q[0].abs() <= NORM_TOLERANCE
        && q[1].abs() <= NORM_TOLERANCE
        && q[2].abs() <= NORM_TOLERANCE
        && (q[3].abs() - 1.0).abs() <= NORM_TOLERANCE
}

/// Scale every attachment rotation in the tree to exactly unit length.
///
/// Used by the source of truth to produce the canonical form of an accepted
/// document. Zero quaternions are left as-is; validation rejects them.
pub fn canonicalize(root: &mut Component) {
    let norm = quaternion_norm(&root.attachment_rotation);
    if norm > 0.0 && norm.is_finite() {
        for c in root.attachment_rotation.iter_mut() {
            *c /= norm;
        }
    }
    for child in root.children.iter_mut() {
        canonicalize(child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_identity_is_identity() {
        assert!(is_identity(&[0.0, 0.0, 0.0, -1.0]));
        assert!(!is_identity(&[1.0, 0.0, 0.0, 0.0]));
    }

    #[test]
    fn canonicalize_scales_to_unit() {
        let mut root =
            Component::root().with_child(Component::plain("a").rotated([0.0, 0.0, 0.0, 2.0]));
        canonicalize(&mut root);
        assert_eq!(root.children[0].attachment_rotation, [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn component_fragment_needs_no_root() {
        let node =
            parse_component(r#"{"name":"arm","kind":"Plain","attachment_rotation":[0,0,0,3]}"#)
                .unwrap();
        assert_eq!(node.name, "arm");
        assert_eq!(node.attachment_rotation, [0.0, 0.0, 0.0, 1.0]);
        assert!(parse_component(r#"{"name":"","kind":"Plain"}"#).is_err());
        let zero = r#"{"name":"a","kind":"Plain","attachment_rotation":[0,0,0,0]}"#;
        assert!(parse_component(zero).is_err());
    }
}
