//! Component tree model and its wire shape

use serde::{Deserialize, Serialize};

/// Translation vector `[x, y, z]`.
pub type Point3 = [f64; 3];

/// Rotation quaternion in `[x, y, z, w]` order.
pub type Quaternion = [f64; 4];

pub const ROOT_NAME: &str = "root";
pub const IDENTITY_ROTATION: Quaternion = [0.0, 0.0, 0.0, 1.0];
pub const ORIGIN: Point3 = [0.0, 0.0, 0.0];

fn identity_rotation() -> Quaternion {
    IDENTITY_ROTATION
}

/// A physical part of the assembly. Children are owned exclusively by their parent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    #[serde(flatten)]
    pub kind: ComponentKind,
    /// Intended parent name. Informational only; containment defines parentage.
    #[serde(default)]
    pub attach_to: String,
    /// Offset from the parent, expressed in the parent's rotated frame.
    #[serde(default)]
    pub attachment_point: Point3,
    /// Orientation relative to the parent. Always a unit quaternion.
    #[serde(default = "identity_rotation")]
    pub attachment_rotation: Quaternion,
    #[serde(default)]
    pub children: Vec<Component>,
}

/// Kind-specific payload, tagged on the wire by `"kind"`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ComponentKind {
    Plain,
    Structure(CollisionBox),
    Axis(AxisSpec),
}

/// Collision volume carried by structures and axes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionBox {
    #[serde(rename = "collision_box_dimensions")]
    pub dimensions: Point3,
    #[serde(rename = "collision_box_point")]
    pub point: Point3,
}

impl Default for CollisionBox {
    fn default() -> Self {
        Self {
            dimensions: [5.0, 2.0, 5.0],
            point: [0.0, 1.0, 0.0],
        }
    }
}

/// A motorized axis: a structure whose carriage moves along `axis_vector`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisSpec {
    #[serde(flatten)]
    pub collision_box: CollisionBox,
    #[serde(default)]
    pub axis_vector: Option<AxisVector>,
    /// Motor channel this axis is bound to.
    pub axis_identifier: i64,
}

/// Direction of travel, either `[x, y, z]` or homogeneous `[x, y, z, w]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AxisVector {
    Xyz([f64; 3]),
    Xyzw([f64; 4]),
}

impl AxisVector {
    /// Spatial part of the vector; the homogeneous component is dropped.
    pub fn direction(&self) -> Point3 {
        match *self {
            AxisVector::Xyz(v) => v,
            AxisVector::Xyzw([x, y, z, _]) => [x, y, z],
        }
    }

    pub fn components(&self) -> &[f64] {
        match self {
            AxisVector::Xyz(v) => v,
            AxisVector::Xyzw(v) => v,
        }
    }
}

/// Wire discriminant, handy for display and filtering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KindTag {
    Plain,
    Structure,
    Axis,
}

impl std::fmt::Display for KindTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            KindTag::Plain => "Plain",
            KindTag::Structure => "Structure",
            KindTag::Axis => "Axis",
        };
        f.write_str(s)
    }
}

impl ComponentKind {
    pub fn tag(&self) -> KindTag {
        match self {
            ComponentKind::Plain => KindTag::Plain,
            ComponentKind::Structure(_) => KindTag::Structure,
            ComponentKind::Axis(_) => KindTag::Axis,
        }
    }
}

impl Component {
    fn with_kind(name: impl Into<String>, kind: ComponentKind) -> Self {
        Self {
            name: name.into(),
            kind,
            attach_to: String::new(),
            attachment_point: ORIGIN,
            attachment_rotation: IDENTITY_ROTATION,
            children: Vec::new(),
        }
    }

    /// The default root every assembly starts from.
    pub fn root() -> Self {
        Self::with_kind(ROOT_NAME, ComponentKind::Plain)
    }

    pub fn plain(name: impl Into<String>) -> Self {
        Self::with_kind(name, ComponentKind::Plain)
    }

    pub fn structure(name: impl Into<String>, collision_box: CollisionBox) -> Self {
        Self::with_kind(name, ComponentKind::Structure(collision_box))
    }

    pub fn axis(
        name: impl Into<String>,
        axis_identifier: i64,
        axis_vector: Option<AxisVector>,
    ) -> Self {
        Self::with_kind(
            name,
            ComponentKind::Axis(AxisSpec {
                collision_box: CollisionBox::default(),
                axis_vector,
                axis_identifier,
            }),
        )
    }

    pub fn attached_to(mut self, parent: impl Into<String>) -> Self {
        self.attach_to = parent.into();
        self
    }

    pub fn at(mut self, point: Point3) -> Self {
        self.attachment_point = point;
        self
    }

    pub fn rotated(mut self, rotation: Quaternion) -> Self {
        self.attachment_rotation = rotation;
        self
    }

    pub fn with_child(mut self, child: Component) -> Self {
        self.children.push(child);
        self
    }

    pub fn is_root(&self) -> bool {
        self.name == ROOT_NAME
    }

    pub fn kind_tag(&self) -> KindTag {
        self.kind.tag()
    }

    pub fn collision_box(&self) -> Option<&CollisionBox> {
        match &self.kind {
            ComponentKind::Plain => None,
            ComponentKind::Structure(b) => Some(b),
            ComponentKind::Axis(a) => Some(&a.collision_box),
        }
    }

    pub fn axis_identifier(&self) -> Option<i64> {
        match &self.kind {
            ComponentKind::Axis(a) => Some(a.axis_identifier),
            ComponentKind::Plain | ComponentKind::Structure(_) => None,
        }
    }

    /// Direction of travel for axes that declare one.
    pub fn axis_direction(&self) -> Option<Point3> {
        match &self.kind {
            ComponentKind::Axis(a) => a.axis_vector.map(|v| v.direction()),
            ComponentKind::Plain | ComponentKind::Structure(_) => None,
        }
    }
}

impl Default for Component {
    fn default() -> Self {
        Self::root()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn homogeneous_axis_vector_drops_w() {
        let v = AxisVector::Xyzw([0.0, 1.0, 0.0, 1.0]);
        assert_eq!(v.direction(), [0.0, 1.0, 0.0]);
        assert_eq!(v.components().len(), 4);
    }

    #[test]
    fn kind_accessors_match_variant() {
        let plain = Component::plain("p");
        assert!(plain.collision_box().is_none());
        assert!(plain.axis_identifier().is_none());

        let axis = Component::axis("x", 3, Some(AxisVector::Xyz([1.0, 0.0, 0.0])));
        assert_eq!(axis.axis_identifier(), Some(3));
        assert_eq!(axis.axis_direction(), Some([1.0, 0.0, 0.0]));
        assert!(axis.collision_box().is_some());
        assert_eq!(axis.kind_tag().to_string(), "Axis");
    }
}
