use crate::node::{Property, PropertyList};
use serde::Serialize;

///
/// Entity
///
/// Immutable structural description of one domain type. Built once at
/// registration and shared read-only for the process lifetime.
///

#[derive(Clone, Debug, Serialize)]
pub struct Entity {
    /// Stable type path used for dispatch and diagnostics.
    pub path: &'static str,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<&'static str>,

    pub properties: PropertyList,
}

impl Entity {
    #[must_use]
    pub fn new(path: &'static str, properties: Vec<Property>) -> Self {
        Self {
            path,
            name: None,
            properties: PropertyList { properties },
        }
    }

    #[must_use]
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = Some(name);
        self
    }

    /// Resolve the entity name used for schema identity.
    #[must_use]
    pub fn resolved_name(&self) -> &'static str {
        self.name.unwrap_or(self.path)
    }

    /// Return the identifier property if the entity declares one.
    #[must_use]
    pub fn identifier_property(&self) -> Option<&Property> {
        self.properties.identifier()
    }

    /// Return the version property if the entity declares one.
    #[must_use]
    pub fn version_property(&self) -> Option<&Property> {
        self.properties.version()
    }
}
