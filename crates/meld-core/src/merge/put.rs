use crate::{
    accessor::PropertyAccessor,
    error::MergeError,
    mapped::MappedProperties,
    merge::{MergeCx, merge_collections, merge_maps},
    obs,
    value::{EntityValue, Value},
};
use meld_schema::node::Entity;
use std::cmp::Ordering;

/// Scalar/reference merge core.
///
/// Decides per value whether to overwrite, recurse, or replace wholesale:
/// - absent source means nothing to merge; absent target adopts the source;
/// - entity references on the inverse side of a bidirectional association
///   recurse with association handling suppressed (cycle guard);
/// - entity references with both identifiers present and unequal are the
///   client pointing at a different persisted entity: the source replaces
///   the reference verbatim, with no field-level contamination;
/// - everything else recurses (entities) or overwrites (scalars).
pub(crate) fn merge_value(
    cx: MergeCx<'_>,
    source: Value,
    target: Option<&Value>,
    bidirectional: bool,
) -> Result<Value, MergeError> {
    if source.is_null() || target.is_none_or(Value::is_null) {
        return Ok(source);
    }

    let Value::Entity(source_entity) = &source else {
        // non-entity scalars overwrite directly; merge never diffs
        // primitives
        return Ok(source);
    };

    if bidirectional {
        return merge_for_put_no_associations(cx, source, target);
    }

    let source_id = read_identifier(cx, source_entity)?;
    if source_id.is_some() {
        let target_id = target
            .and_then(Value::as_entity)
            .map(|e| read_identifier(cx, e))
            .transpose()?
            .flatten();

        if let (Some(source_id), Some(target_id)) = (&source_id, &target_id) {
            if Value::canonical_cmp_key(source_id, target_id) != Ordering::Equal {
                // different persisted entity: preserve the new association
                // wholesale
                if let Some(schema) = cx.registry.schema_for(&source_entity.path) {
                    obs::record(obs::MergeEvent::IdentifierReplacement {
                        entity_path: schema.path,
                    });
                }

                return Ok(source);
            }
        }
    }

    merge_for_put(cx, source, target, false)
}

/// Whole-object merge preserving PUT semantics.
///
/// Returns the merged value; entities are merged property by property onto
/// a copy of the target, everything else adopts the source.
pub(crate) fn merge_for_put(
    cx: MergeCx<'_>,
    source: Value,
    target: Option<&Value>,
    bidirectional: bool,
) -> Result<Value, MergeError> {
    merge_for_put_inner(cx, source, target, bidirectional, true)
}

/// Property-only merge: association properties are skipped entirely and no
/// unmapped copy runs. Used on the inverse side of bidirectional
/// associations to stop owning/inverse recursion.
fn merge_for_put_no_associations(
    cx: MergeCx<'_>,
    source: Value,
    target: Option<&Value>,
) -> Result<Value, MergeError> {
    merge_for_put_inner(cx, source, target, false, false)
}

fn merge_for_put_inner(
    cx: MergeCx<'_>,
    source: Value,
    target: Option<&Value>,
    bidirectional: bool,
    with_associations: bool,
) -> Result<Value, MergeError> {
    if source.is_null() || target.is_none_or(Value::is_null) {
        return Ok(source);
    }

    let Some(target_entity) = target.and_then(Value::as_entity) else {
        return Ok(source);
    };
    let Value::Entity(source_entity) = &source else {
        return Ok(source);
    };

    // unresolved schema is a policy branch, not an error
    let Some(schema) = cx.registry.schema_for(&target_entity.path) else {
        return Ok(source);
    };

    let mut merged = target_entity.clone();
    merge_entity_put(
        cx,
        &schema,
        source_entity,
        &mut merged,
        bidirectional,
        with_associations,
    )?;

    Ok(Value::Entity(merged))
}

/// Apply PUT semantics onto a live entity, property by property.
///
/// Iterates every mapped, writable schema property (identifier, version and
/// read-only properties are never touched), dispatching to the collection,
/// map, or scalar/reference engines by declared kind. When
/// `with_associations` is set, schema-known properties invisible to the
/// serializer are afterwards copied verbatim so transient state survives a
/// PUT.
fn merge_entity_put(
    cx: MergeCx<'_>,
    schema: &Entity,
    source: &EntityValue,
    target: &mut EntityValue,
    bidirectional: bool,
    with_associations: bool,
) -> Result<(), MergeError> {
    let mapped = MappedProperties::resolve(schema, cx.view);

    for property in &schema.properties {
        let ident = property.ident;

        if !property.is_writable() || !mapped.has_property_for_field(ident) {
            continue;
        }
        if property.kind.entity_target().is_some() && !with_associations {
            continue;
        }

        let source_value = source.get(ident).cloned().unwrap_or(Value::Null);
        let target_value = target.get(ident).cloned();
        let container_bidirectional = property.is_bidirectional();

        let result = if property.kind.is_map() {
            merge_maps(cx, source_value, target_value.as_ref(), container_bidirectional)
                .map_err(|err| err.with_field(ident))?
        } else if property.kind.is_collection_like() {
            merge_collections(cx, source_value, target_value.as_ref(), container_bidirectional)
                .map_err(|err| err.with_field(ident))?
        } else if property.kind.is_entity() {
            merge_value(
                cx,
                source_value,
                target_value.as_ref(),
                bidirectional || container_bidirectional,
            )
            .map_err(|err| err.with_field(ident))?
        } else {
            source_value
        };

        PropertyAccessor::new(target)
            .set(property, result)
            .map_err(|err| MergeError::payload(err).with_field(ident))?;
    }

    if with_associations {
        copy_remaining_properties(&mapped, source, target);
    }

    Ok(())
}

/// Copy serializer-invisible properties verbatim from source to target.
///
/// Absent (or Null) source slots leave the target untouched: transient
/// state the client could not have expressed must survive.
fn copy_remaining_properties(
    mapped: &MappedProperties<'_>,
    source: &EntityValue,
    target: &mut EntityValue,
) {
    for ident in mapped.unmapped_properties() {
        match source.get(ident) {
            Some(value) if !value.is_null() => target.set(*ident, value.clone()),
            _ => {}
        }
    }
}

/// Read the persistent identifier of an entity value, if its schema
/// declares one and the slot holds a value.
///
/// A non-scalar value in the identifier slot is a configuration fault and
/// is raised as a field-access failure.
fn read_identifier(
    cx: MergeCx<'_>,
    entity: &EntityValue,
) -> Result<Option<Value>, MergeError> {
    let Some(schema) = cx.registry.schema_for(&entity.path) else {
        return Ok(None);
    };
    let Some(id_property) = schema.identifier_property() else {
        return Ok(None);
    };

    match entity.get(id_property.ident) {
        None | Some(Value::Null) => Ok(None),
        Some(value) if value.is_scalar() => Ok(Some(value.clone())),
        Some(value) => Err(MergeError::field_access(
            entity.path.clone(),
            id_property.ident,
            format!("identifier slot holds {}", value.variant_name()),
        )),
    }
}
