use crate::types::{Direction, ScalarKind};
use serde::Serialize;

///
/// PropertyList
///

#[derive(Clone, Debug, Serialize)]
pub struct PropertyList {
    pub properties: Vec<Property>,
}

impl PropertyList {
    // get
    #[must_use]
    pub fn get(&self, ident: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.ident == ident)
    }

    /// First property flagged as the persistent identifier, if any.
    #[must_use]
    pub fn identifier(&self) -> Option<&Property> {
        self.properties.iter().find(|p| p.identifier)
    }

    /// First property flagged as the optimistic-lock version, if any.
    #[must_use]
    pub fn version(&self) -> Option<&Property> {
        self.properties.iter().find(|p| p.version)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Property> {
        self.properties.iter()
    }
}

impl<'a> IntoIterator for &'a PropertyList {
    type Item = &'a Property;
    type IntoIter = std::slice::Iter<'a, Property>;

    fn into_iter(self) -> Self::IntoIter {
        self.properties.iter()
    }
}

///
/// Property
///

#[derive(Clone, Debug, Serialize)]
pub struct Property {
    pub ident: &'static str,
    pub kind: PropertyKind,

    /// Persistent identifier field; never touched by merge.
    pub identifier: bool,

    /// Optimistic-lock version field; never touched by merge.
    pub version: bool,

    /// Declared read-only; never touched by merge.
    pub read_only: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub association: Option<Association>,
}

impl Property {
    #[must_use]
    pub const fn new(ident: &'static str, kind: PropertyKind) -> Self {
        Self {
            ident,
            kind,
            identifier: false,
            version: false,
            read_only: false,
            association: None,
        }
    }

    #[must_use]
    pub const fn scalar(ident: &'static str, kind: ScalarKind) -> Self {
        Self::new(ident, PropertyKind::Scalar(kind))
    }

    #[must_use]
    pub const fn identifier(ident: &'static str, kind: ScalarKind) -> Self {
        let mut p = Self::scalar(ident, kind);
        p.identifier = true;
        p
    }

    #[must_use]
    pub const fn version(ident: &'static str, kind: ScalarKind) -> Self {
        let mut p = Self::scalar(ident, kind);
        p.version = true;
        p
    }

    #[must_use]
    pub const fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    #[must_use]
    pub fn with_association(mut self, association: Association) -> Self {
        self.association = Some(association);
        self
    }

    /// Writable from the merge engine's point of view.
    #[must_use]
    pub const fn is_writable(&self) -> bool {
        !(self.identifier || self.version || self.read_only)
    }

    /// True when the property's owning side is the inverse of a
    /// bidirectional association.
    #[must_use]
    pub fn is_bidirectional(&self) -> bool {
        self.association
            .as_ref()
            .is_some_and(|a| a.direction.is_bidirectional())
    }

    /// True when the association is represented by a hypermedia link rather
    /// than an embedded value.
    #[must_use]
    pub fn is_linkable_association(&self) -> bool {
        self.association.as_ref().is_some_and(|a| a.linkable)
    }
}

///
/// PropertyKind
///
/// Tagged variant over the container shapes the merge engine dispatches on.
/// Resolved when the schema is built; no runtime downcasting.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub enum PropertyKind {
    /// Enumerated constant; `path` names the declaring enum type.
    Enum { path: &'static str },

    /// Nested entity reference; `target` is the target entity path.
    Entity { target: &'static str },

    /// Keyed structure with scalar keys and a uniform value shape.
    Mapping {
        key: ScalarKind,
        value: Box<PropertyKind>,
    },

    Scalar(ScalarKind),

    /// Ordered sequence with a uniform component shape.
    Sequence { component: Box<PropertyKind> },
}

impl PropertyKind {
    #[must_use]
    pub fn sequence(component: Self) -> Self {
        Self::Sequence {
            component: Box::new(component),
        }
    }

    #[must_use]
    pub fn mapping(key: ScalarKind, value: Self) -> Self {
        Self::Mapping {
            key,
            value: Box::new(value),
        }
    }

    #[must_use]
    pub const fn is_entity(&self) -> bool {
        matches!(self, Self::Entity { .. })
    }

    #[must_use]
    pub const fn is_map(&self) -> bool {
        matches!(self, Self::Mapping { .. })
    }

    #[must_use]
    pub const fn is_collection_like(&self) -> bool {
        matches!(self, Self::Sequence { .. })
    }

    /// Component shape for sequences, `None` otherwise.
    #[must_use]
    pub fn component(&self) -> Option<&Self> {
        match self {
            Self::Sequence { component } => Some(component),
            _ => None,
        }
    }

    /// Entity target path reachable directly or through one container level.
    #[must_use]
    pub fn entity_target(&self) -> Option<&'static str> {
        match self {
            Self::Entity { target } => Some(target),
            Self::Sequence { component } => component.entity_target(),
            Self::Mapping { value, .. } => value.entity_target(),
            Self::Scalar(_) | Self::Enum { .. } => None,
        }
    }
}

///
/// Association
///

#[derive(Clone, Copy, Debug, Serialize)]
pub struct Association {
    pub direction: Direction,

    /// Rendered as a hypermedia link instead of an embedded value.
    pub linkable: bool,
}

impl Association {
    #[must_use]
    pub const fn unidirectional() -> Self {
        Self {
            direction: Direction::Unidirectional,
            linkable: false,
        }
    }

    #[must_use]
    pub const fn bidirectional(inverse: &'static str) -> Self {
        Self {
            direction: Direction::Bidirectional { inverse },
            linkable: false,
        }
    }

    #[must_use]
    pub const fn linkable(mut self) -> Self {
        self.linkable = true;
        self
    }
}
