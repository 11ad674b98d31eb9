use crate::{error::ErrorTree, node::Entity, validate};
use std::{collections::BTreeMap, sync::Arc};
use thiserror::Error as ThisError;

///
/// BuildError
///

#[derive(Debug, ThisError)]
pub enum BuildError {
    #[error("schema validation failed:\n{0}")]
    Validation(ErrorTree),
}

///
/// SchemaBuilder
///
/// Registration-time entry point. Entities are collected first, then the
/// whole set is validated in staged, deterministic order so cross-entity
/// checks (association targets, inverse properties) see the full picture.
///

#[derive(Debug, Default)]
pub struct SchemaBuilder {
    entities: Vec<Entity>,
}

impl SchemaBuilder {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entities: Vec::new(),
        }
    }

    #[must_use]
    pub fn entity(mut self, entity: Entity) -> Self {
        self.entities.push(entity);
        self
    }

    /// Validate and freeze the registered entities.
    pub fn build(self) -> Result<SchemaRegistry, BuildError> {
        validate::validate_entities(&self.entities)
            .result()
            .map_err(BuildError::Validation)?;

        let entities = self
            .entities
            .into_iter()
            .map(|e| (e.path, Arc::new(e)))
            .collect();

        Ok(SchemaRegistry { entities })
    }
}

///
/// SchemaRegistry
///
/// Immutable, shareable map from entity path to resolved schema.
///

#[derive(Clone, Debug, Default)]
pub struct SchemaRegistry {
    entities: BTreeMap<&'static str, Arc<Entity>>,
}

impl SchemaRegistry {
    /// Resolve the schema for a type path, if one was registered.
    #[must_use]
    pub fn schema_for(&self, path: &str) -> Option<Arc<Entity>> {
        self.entities.get(path).cloned()
    }

    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.entities.contains_key(path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entities.keys().copied()
    }
}
