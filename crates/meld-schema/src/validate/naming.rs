use crate::{
    MAX_ENTITY_NAME_LEN, MAX_PROPERTY_NAME_LEN, err, error::ErrorTree, node::Entity,
    types::ScalarKind,
};
use std::collections::BTreeMap;

/// Validate one entity's local structural invariants.
pub fn validate_entity(entity: &Entity, errs: &mut ErrorTree) {
    let path = entity.path;

    if path.is_empty() {
        err!(errs, "entity path must be non-empty");
    }
    if entity.resolved_name().len() > MAX_ENTITY_NAME_LEN {
        err!(
            errs,
            "entity name '{0}' exceeds {MAX_ENTITY_NAME_LEN} characters",
            entity.resolved_name()
        );
    }

    let mut seen = BTreeMap::new();
    let mut identifiers = 0usize;
    let mut versions = 0usize;

    for property in &entity.properties {
        let ident = property.ident;

        if ident.is_empty() {
            err!(errs, "entity '{path}' has a property with an empty ident");
        }
        if ident.len() > MAX_PROPERTY_NAME_LEN {
            err!(
                errs,
                "entity '{path}', property '{ident}' exceeds {MAX_PROPERTY_NAME_LEN} characters"
            );
        }
        if seen.insert(ident, ()).is_some() {
            err!(errs, "duplicate property '{ident}' on entity '{path}'");
        }

        if property.identifier {
            identifiers += 1;
        }
        if property.version {
            versions += 1;
        }

        if let Some(key) = map_key_kind(property) {
            if !key.is_keyable() {
                err!(
                    errs,
                    "entity '{path}', property '{ident}' uses non-keyable map key kind {key}"
                );
            }
        }
    }

    if identifiers > 1 {
        err!(errs, "entity '{path}' declares more than one identifier");
    }
    if versions > 1 {
        err!(errs, "entity '{path}' declares more than one version field");
    }
}

/// Reject duplicate entity paths and resolved names across the schema.
pub fn validate_entity_naming(entities: &[Entity], errs: &mut ErrorTree) {
    let mut by_path: BTreeMap<&str, &str> = BTreeMap::new();

    for entity in entities {
        if by_path.insert(entity.path, entity.resolved_name()).is_some() {
            err!(errs, "duplicate entity path '{0}'", entity.path);
        }
    }
}

fn map_key_kind(property: &crate::node::Property) -> Option<ScalarKind> {
    match &property.kind {
        crate::node::PropertyKind::Mapping { key, .. } => Some(*key),
        _ => None,
    }
}
