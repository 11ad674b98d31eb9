use crate::{
    accessor::PropertyAccessor,
    error::MergeError,
    mapped::MappedProperties,
    merge::{MergeCx, handle_array, merge_map_node},
    obs,
    value::{EntityValue, Value},
};
use derive_more::Deref;
use meld_schema::node::PropertyKind;
use serde_json::{Map as JsonMap, Value as Json};
use std::collections::BTreeSet;

///
/// ConsumedFields
///
/// Explicit record of which document fields the structural merge already
/// applied. The document itself stays immutable; the generic pass skips
/// every recorded top-level field. Nested consumption is folded into a
/// separate set of dotted paths kept purely for observability, so a
/// property whose ident happens to contain a dot is never shadowed by a
/// nested merge.
///

#[derive(Clone, Debug, Default, Deref, Eq, PartialEq)]
pub struct ConsumedFields {
    #[deref]
    paths: BTreeSet<String>,
    nested: BTreeSet<String>,
}

impl ConsumedFields {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            paths: BTreeSet::new(),
            nested: BTreeSet::new(),
        }
    }

    pub(crate) fn record(&mut self, field: &str) {
        self.paths.insert(field.to_string());
    }

    /// Fold a nested merge's record under a field prefix.
    pub(crate) fn record_nested(&mut self, field: &str, nested: Self) {
        for path in nested.paths.into_iter().chain(nested.nested) {
            self.nested.insert(format!("{field}.{path}"));
        }
    }

    #[must_use]
    pub fn contains_field(&self, field: &str) -> bool {
        self.paths.contains(field)
    }

    /// Dotted paths consumed by nested entity merges.
    #[must_use]
    pub const fn nested_paths(&self) -> &BTreeSet<String> {
        &self.nested
    }
}

///
/// MergeOutcome
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MergeOutcome {
    pub consumed: ConsumedFields,
}

/// Document-driven tree merge driver (partial-update entry point).
///
/// One pass over the document's top-level entries decides per field whether
/// a structural engine consumes the subtree or the generic pass applies it
/// afterwards:
/// - names outside the mapped-property set are skipped;
/// - arrays delegate to the array engine against a live sequence and are
///   recorded consumed only when a nested-object merge occurred;
/// - objects recurse into the map engine or this driver for nested
///   entities; linkable associations are skipped outright;
/// - scalars are always left to the generic pass.
///
/// An unresolvable target schema degrades the whole operation to the
/// generic pass with no pre-walk.
pub(crate) fn do_merge(
    cx: MergeCx<'_>,
    root: &JsonMap<String, Json>,
    target: &mut EntityValue,
) -> Result<ConsumedFields, MergeError> {
    let Some(schema) = cx.registry.schema_for(&target.path) else {
        obs::record(obs::MergeEvent::DegradedPass);
        apply_loose(cx, root, target);
        return Ok(ConsumedFields::new());
    };

    let mapped = MappedProperties::resolve(&schema, cx.view);
    let mut consumed = ConsumedFields::new();

    for (field, child) in root {
        let Some(property) = mapped.property(field) else {
            continue;
        };

        // identifier, version, and read-only state is never merged into
        if !property.is_writable() {
            continue;
        }

        // nothing live to merge onto: the generic pass decodes wholesale
        if target.get(field).is_none_or(Value::is_null) {
            continue;
        }

        match child {
            Json::Array(array) => {
                let component = property.kind.component();
                let Some(live) = target.get_mut(field) else {
                    continue;
                };

                if handle_array(cx, array, live, component)
                    .map_err(|err| err.with_field(field))?
                {
                    // a nested object was merged in place; the document
                    // node must not be applied again
                    consumed.record(field);
                }
            }

            Json::Object(object) => {
                if property.is_linkable_association() {
                    continue;
                }

                if property.kind.is_map() {
                    // keep the empty object so the generic pass wipes the
                    // map as the client requested
                    if object.is_empty() {
                        continue;
                    }

                    let PropertyKind::Mapping { key, value } = &property.kind else {
                        continue;
                    };
                    let Some(live) = target.get_mut(field) else {
                        continue;
                    };

                    let processed = merge_map_node(cx, object, live, *key, value)
                        .map_err(|err| err.with_field(field))?;
                    if processed.len() == object.len() {
                        consumed.record(field);
                    }

                    continue;
                }

                if property.kind.is_entity() {
                    // always handled here, never by the generic pass
                    consumed.record(field);

                    if let Some(Value::Entity(nested)) = target.get_mut(field) {
                        let nested_consumed =
                            do_merge(cx, object, nested).map_err(|err| err.with_field(field))?;
                        consumed.record_nested(field, nested_consumed);
                    }
                }
            }

            // scalars are simpler to leave to the generic deserializer
            _ => {}
        }
    }

    apply_remaining(cx, root, &consumed, &mapped, target)?;

    Ok(consumed)
}

/// Generic deserialize-onto-existing pass.
///
/// Applies every document field the structural walk did not consume: pure
/// scalar overwrites, wholesale replacement of explicitly-emptied
/// containers, and fields the driver intentionally skipped. Identifier,
/// version, and read-only properties are never written, regardless of
/// their presence in the document.
fn apply_remaining(
    cx: MergeCx<'_>,
    root: &JsonMap<String, Json>,
    consumed: &ConsumedFields,
    mapped: &MappedProperties<'_>,
    target: &mut EntityValue,
) -> Result<(), MergeError> {
    for (field, child) in root {
        if consumed.contains_field(field) {
            continue;
        }

        // unknown fields are ignored per normal deserialization rules
        let Some(property) = mapped.property(field) else {
            continue;
        };
        if !property.is_writable() {
            continue;
        }

        let decoded = cx
            .view
            .decode_tree(child, &property.kind)
            .map_err(|err| MergeError::payload(err).with_field(field))?;

        PropertyAccessor::new(target)
            .set(property, decoded)
            .map_err(|err| MergeError::payload(err).with_field(field))?;
    }

    Ok(())
}

// Schema-less degradation: loose structural decode of every field.
fn apply_loose(cx: MergeCx<'_>, root: &JsonMap<String, Json>, target: &mut EntityValue) {
    for (field, child) in root {
        target.set(field.clone(), cx.view.decode_loose(child));
    }
}
