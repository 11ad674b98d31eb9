use crate::{
    error::MergeError,
    merge::{self, MergeCx, MergeOutcome},
    obs,
    value::Value,
    view::{JsonView, SerializerView, json_shape},
};
use meld_schema::registry::SchemaRegistry;
use serde_json::Value as Json;
use thiserror::Error as ThisError;

///
/// ShapeError
///
/// Structural precondition failures on an entry point. Both are terminal
/// for the call; the target is untouched when they fire.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ShapeError {
    #[error("document root must be an object, found {found}")]
    NonObjectRoot { found: &'static str },

    #[error("merge target must be an entity, found {found}")]
    NonEntityTarget { found: &'static str },
}

///
/// DomainReader
///
/// Entry points for applying client documents onto live object graphs.
/// Holds the schema resolver and the serializer view; carries no
/// per-invocation state, so one reader serves concurrent merges on
/// distinct targets.
///

pub struct DomainReader {
    registry: SchemaRegistry,
    view: Box<dyn SerializerView>,
}

impl DomainReader {
    /// Reader backed by the default `serde_json` view.
    #[must_use]
    pub fn new(registry: SchemaRegistry) -> Self {
        let view = JsonView::new(registry.clone());

        Self {
            registry,
            view: Box::new(view),
        }
    }

    /// Reader with a caller-supplied serializer view (field hiding,
    /// alternative naming).
    pub fn with_view(registry: SchemaRegistry, view: impl SerializerView + 'static) -> Self {
        Self {
            registry,
            view: Box::new(view),
        }
    }

    fn cx(&self) -> MergeCx<'_> {
        MergeCx {
            registry: &self.registry,
            view: &*self.view,
        }
    }

    /// Parse a raw payload and merge it onto the target (PATCH semantics).
    ///
    /// Malformed bytes fail before the target is touched.
    pub fn read_and_merge(
        &self,
        payload: &[u8],
        target: &mut Value,
    ) -> Result<MergeOutcome, MergeError> {
        let document: Json = serde_json::from_slice(payload).map_err(|err| {
            obs::record(obs::MergeEvent::PayloadRejected);
            MergeError::from(err)
        })?;

        self.merge_partial(&document, target)
    }

    /// Merge a parsed document onto the target (PATCH semantics).
    ///
    /// Fields absent from the document leave the target untouched; nested
    /// objects and collections merge structurally per the declared
    /// property kinds. Returns which top-level fields the structural walk
    /// consumed.
    pub fn merge_partial(
        &self,
        document: &Json,
        target: &mut Value,
    ) -> Result<MergeOutcome, MergeError> {
        let Json::Object(root) = document else {
            obs::record(obs::MergeEvent::PayloadRejected);
            return Err(MergeError::payload(ShapeError::NonObjectRoot {
                found: json_shape(document),
            }));
        };
        let Value::Entity(entity) = target else {
            obs::record(obs::MergeEvent::PayloadRejected);
            return Err(MergeError::payload(ShapeError::NonEntityTarget {
                found: target.variant_name(),
            }));
        };

        let consumed = merge::do_merge(self.cx(), root, entity)?;

        if let Some(schema) = self.registry.schema_for(&entity.path) {
            obs::record(obs::MergeEvent::PatchApplied {
                entity_path: schema.path,
                fields_consumed: consumed.len() as u64,
            });
        }

        Ok(MergeOutcome { consumed })
    }

    /// Merge a whole source graph onto the target (PUT semantics).
    ///
    /// Every mapped writable property adopts the source's value, with
    /// structural merging for collections, maps, and entity references.
    /// Serializer-invisible properties survive from the source when
    /// present. Unresolvable target schemas replace the target wholesale.
    pub fn merge_whole_object(
        &self,
        source: &Value,
        target: &mut Value,
        bidirectional: bool,
    ) -> Result<(), MergeError> {
        let merged = merge::merge_for_put(self.cx(), source.clone(), Some(target), bidirectional)?;

        if let Some(path) = target
            .as_entity()
            .and_then(|e| self.registry.schema_for(&e.path))
            .map(|schema| schema.path)
        {
            obs::record(obs::MergeEvent::PutApplied { entity_path: path });
        }

        *target = merged;

        Ok(())
    }
}
