use crate::{
    error::MergeError,
    merge::{MergeCx, collection::handle_array_node, do_merge, merge_value},
    value::{EnumValue, Value},
};
use meld_schema::{node::PropertyKind, types::ScalarKind};
use serde_json::Value as Json;
use std::cmp::Ordering;

/// Keyed map merge (value-pair path).
///
/// Reconciliation is by decoded key equality, never by position. The result
/// key set follows the source: keys present only in the target are dropped,
/// absent target entries are synthesized from the source.
pub(crate) fn merge_maps(
    cx: MergeCx<'_>,
    source: Value,
    target: Option<&Value>,
    bidirectional: bool,
) -> Result<Value, MergeError> {
    if source.is_null() {
        return Ok(Value::Null);
    }

    let Value::Map(source_entries) = source else {
        // shape drift: adopt the source wholesale
        return Ok(source);
    };

    let target_entries = target.and_then(Value::as_map).unwrap_or_default();

    let mut result = Vec::with_capacity(source_entries.len());
    for (key, source_value) in source_entries {
        let target_value = lookup(target_entries, &key).map(|(_, v)| v);
        let merged = merge_value(cx, source_value, target_value, bidirectional)
            .map_err(|err| err.with_field(key_label(&key)))?;
        result.push((key, merged));
    }

    Value::normalize_map_entries(result)
        .map(Value::Map)
        .map_err(MergeError::payload)
}

/// Document-driven map merge against a live map value.
///
/// Each document entry's key is decoded into the declared key kind before
/// lookup. Nested objects recurse into the tree merge driver, nested arrays
/// into the array engine; everything else decodes directly into the map
/// using the best available concrete kind. Returns the raw keys of every
/// processed entry so the caller can decide whether the whole node was
/// consumed.
pub(crate) fn merge_map_node(
    cx: MergeCx<'_>,
    node: &serde_json::Map<String, Json>,
    live: &mut Value,
    key_kind: ScalarKind,
    value_kind: &PropertyKind,
) -> Result<Vec<String>, MergeError> {
    let Value::Map(entries) = live else {
        return Ok(Vec::new());
    };

    let mut consumed = Vec::with_capacity(node.len());

    for (raw_key, child) in node {
        let key = cx
            .view
            .decode_key(raw_key, key_kind)
            .map_err(|err| MergeError::payload(err).with_field(raw_key))?;
        let position = entries
            .iter()
            .position(|(k, _)| Value::canonical_cmp_key(k, &key) == Ordering::Equal);

        match (child, position) {
            (Json::Object(object), Some(index))
                if matches!(entries[index].1, Value::Entity(_)) =>
            {
                if let Value::Entity(entity) = &mut entries[index].1 {
                    do_merge(cx, object, entity).map_err(|err| err.with_field(raw_key))?;
                }
            }

            (Json::Array(array), Some(index)) if matches!(entries[index].1, Value::List(_)) => {
                let component = value_kind.component();
                if let Value::List(items) = &mut entries[index].1 {
                    handle_array_node(cx, array, items, component)
                        .map_err(|err| err.with_field(raw_key))?;
                }
            }

            (child, position) => {
                let existing = position.map(|index| &entries[index].1);
                let decoded = decode_with_hint(cx, child, existing, value_kind)
                    .map_err(|err| err.with_field(raw_key))?;
                upsert(entries, key, decoded);
            }
        }

        consumed.push(raw_key.clone());
    }

    Ok(consumed)
}

/// Decode a document node using the best available concrete kind: the
/// existing value's runtime kind wins over the declared kind, except for
/// enumerated constants, where the declaring enum kind wins.
fn decode_with_hint(
    cx: MergeCx<'_>,
    node: &Json,
    existing: Option<&Value>,
    declared: &PropertyKind,
) -> Result<Value, MergeError> {
    if let Some(Value::Enum(e)) = existing {
        // the enum's declaring type wins over the declared kind
        if let (Some(path), Json::String(s)) = (&e.path, node) {
            return Ok(Value::Enum(EnumValue::strict(path, s)));
        }
        return cx
            .view
            .decode_tree(node, declared)
            .map_err(MergeError::payload);
    }

    let kind = existing
        .and_then(runtime_scalar_kind)
        .map_or_else(|| declared.clone(), PropertyKind::Scalar);

    cx.view.decode_tree(node, &kind).map_err(MergeError::payload)
}

// Runtime scalar shape of a live value, if it has one.
const fn runtime_scalar_kind(value: &Value) -> Option<ScalarKind> {
    match value {
        Value::Bool(_) => Some(ScalarKind::Bool),
        Value::Float(_) => Some(ScalarKind::Float),
        Value::Int(_) => Some(ScalarKind::Int),
        Value::Text(_) => Some(ScalarKind::Text),
        Value::Uint(_) => Some(ScalarKind::Uint),
        _ => None,
    }
}

fn lookup<'a>(entries: &'a [(Value, Value)], key: &Value) -> Option<&'a (Value, Value)> {
    entries
        .iter()
        .find(|(k, _)| Value::canonical_cmp_key(k, key) == Ordering::Equal)
}

// Replace in place or insert at the canonical position.
fn upsert(entries: &mut Vec<(Value, Value)>, key: Value, value: Value) {
    match entries.binary_search_by(|(k, _)| Value::canonical_cmp_key(k, &key)) {
        Ok(index) => entries[index].1 = value,
        Err(index) => entries.insert(index, (key, value)),
    }
}

fn key_label(key: &Value) -> String {
    match key {
        Value::Text(s) => s.clone(),
        other => format!("{other:?}"),
    }
}
