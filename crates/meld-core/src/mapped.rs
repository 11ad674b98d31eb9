use crate::view::SerializerView;
use meld_schema::node::{Entity, Property};
use std::collections::BTreeMap;

///
/// MappedProperties
///
/// Per-(schema, serializer-view) resolution of which property names the
/// serializer can see. Schema-known names invisible to the serializer are
/// "unmapped": they are copied verbatim on PUT, never merged recursively.
/// Recomputed per merge invocation; never cached across calls.
///

pub struct MappedProperties<'a> {
    mapped: BTreeMap<&'a str, &'a Property>,
    unmapped: Vec<&'a str>,
}

impl<'a> MappedProperties<'a> {
    /// Intersect the schema's property list with the serializer's view.
    #[must_use]
    pub fn resolve(entity: &'a Entity, view: &dyn SerializerView) -> Self {
        let visible = view.mapped_field_names(entity.path);

        let mut mapped = BTreeMap::new();
        let mut unmapped = Vec::new();

        for property in &entity.properties {
            if visible.contains(property.ident) {
                mapped.insert(property.ident, property);
            } else {
                unmapped.push(property.ident);
            }
        }

        Self { mapped, unmapped }
    }

    /// Is this document field name backed by a schema property the
    /// serializer can see?
    #[must_use]
    pub fn has_property_for_field(&self, field: &str) -> bool {
        self.mapped.contains_key(field)
    }

    /// The schema property for a mapped field name, if any.
    #[must_use]
    pub fn property(&self, field: &str) -> Option<&'a Property> {
        self.mapped.get(field).copied()
    }

    /// Schema-known property names invisible to the serializer.
    #[must_use]
    pub fn unmapped_properties(&self) -> &[&'a str] {
        &self.unmapped
    }
}
