use crate::{
    err,
    error::ErrorTree,
    node::{Entity, Property},
    types::Direction,
};
use std::collections::BTreeMap;

///
/// AssociationEdge
/// Association occurrence captured during entity property traversal.
///

struct AssociationEdge<'a> {
    source_entity: &'static str,
    property: &'a Property,
    target_entity: &'static str,
}

/// Validate that association targets resolve and bidirectional inverses are
/// well-formed (non-empty, naming a property on the target entity).
pub fn validate_associations(entities: &[Entity], errs: &mut ErrorTree) {
    // Phase 1: collect association edges for each entity.
    let mut edges = Vec::new();
    for entity in entities {
        for property in &entity.properties {
            if let Some(target) = property.kind.entity_target() {
                edges.push(AssociationEdge {
                    source_entity: entity.path,
                    property,
                    target_entity: target,
                });
            } else if property.association.is_some() {
                err!(
                    errs,
                    "entity '{0}', property '{1}' carries association metadata but no entity shape",
                    entity.path,
                    property.ident
                );
            }
        }
    }

    // Phase 2: resolve targets and enforce inverse invariants.
    let by_path: BTreeMap<&str, &Entity> = entities.iter().map(|e| (e.path, e)).collect();

    for edge in edges {
        let Some(target) = by_path.get(edge.target_entity) else {
            err!(
                errs,
                "entity '{0}', property '{1}', references unregistered entity '{2}'",
                edge.source_entity,
                edge.property.ident,
                edge.target_entity
            );
            continue;
        };

        let Some(association) = &edge.property.association else {
            continue;
        };

        if let Direction::Bidirectional { inverse } = association.direction {
            if inverse.is_empty() {
                err!(
                    errs,
                    "entity '{0}', property '{1}', bidirectional association requires a non-empty inverse",
                    edge.source_entity,
                    edge.property.ident
                );
            } else if target.properties.get(inverse).is_none() {
                err!(
                    errs,
                    "entity '{0}', property '{1}', inverse '{inverse}' not found on '{2}'",
                    edge.source_entity,
                    edge.property.ident,
                    edge.target_entity
                );
            }
        }
    }
}
