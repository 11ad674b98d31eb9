//! Schema validation orchestration and shared helpers.

pub mod naming;
pub mod relation;

use crate::{error::ErrorTree, node::Entity};

/// Run full schema validation in a staged, deterministic order.
pub(crate) fn validate_entities(entities: &[Entity]) -> ErrorTree {
    let mut errors = ErrorTree::new();

    // Phase 1: validate each node (structural + local invariants).
    for entity in entities {
        naming::validate_entity(entity, &mut errors);
    }

    // Phase 2: enforce schema-wide invariants.
    naming::validate_entity_naming(entities, &mut errors);
    relation::validate_associations(entities, &mut errors);

    errors
}
