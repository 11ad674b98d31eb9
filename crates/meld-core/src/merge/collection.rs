use crate::{
    error::MergeError,
    merge::{MergeCx, do_merge, map::merge_map_node, merge_value},
    value::Value,
};
use meld_schema::node::PropertyKind;
use serde_json::Value as Json;

/// Positional collection merge (value-pair path).
///
/// Source and target are walked as parallel ordered sequences: index `i` of
/// source merges against index `i` of target through the scalar/reference
/// core. Excess source elements are adopted and appended; excess target
/// elements are dropped, clamping the result to the source's length.
pub(crate) fn merge_collections(
    cx: MergeCx<'_>,
    source: Value,
    target: Option<&Value>,
    bidirectional: bool,
) -> Result<Value, MergeError> {
    if source.is_null() {
        return Ok(Value::Null);
    }

    let source_items = as_collection(source);
    let target_items = target.and_then(Value::as_list).unwrap_or_default();

    let mut result = Vec::with_capacity(source_items.len());
    for (index, item) in source_items.into_iter().enumerate() {
        let merged = merge_value(cx, item, target_items.get(index), bidirectional)
            .map_err(|err| err.with_index(index))?;
        result.push(merged);
    }

    Ok(Value::List(result))
}

// Non-list sources merge as a single-element sequence.
fn as_collection(source: Value) -> Vec<Value> {
    match source {
        Value::List(items) => items,
        other => vec![other],
    }
}

/// Document-driven array merge against a live value.
///
/// Returns false without touching anything when the live value is not a
/// sequence; the document node is then left for the generic pass.
pub(crate) fn handle_array(
    cx: MergeCx<'_>,
    array: &[Json],
    live: &mut Value,
    component: Option<&PropertyKind>,
) -> Result<bool, MergeError> {
    let Value::List(items) = live else {
        return Ok(false);
    };

    handle_array_node(cx, array, items, component)
}

/// Applies the diff handling to a document array, recursing into nested
/// objects and nested arrays found in matching positions.
///
/// Trailing document elements beyond the live sequence's size are decoded
/// and appended; trailing live elements beyond the document's length are
/// removed directly. Returns whether a nested-object merge was applied
/// anywhere in the subtree, which is what obliges the caller to record the
/// document node consumed.
pub(crate) fn handle_array_node(
    cx: MergeCx<'_>,
    array: &[Json],
    items: &mut Vec<Value>,
    component: Option<&PropertyKind>,
) -> Result<bool, MergeError> {
    let mut nested_object_found = false;

    for (index, node) in array.iter().enumerate() {
        if index >= items.len() {
            // brand-new element: decode and append
            let decoded = match component {
                Some(kind) => cx
                    .view
                    .decode_tree(node, kind)
                    .map_err(|err| MergeError::payload(err).with_index(index))?,
                None => cx.view.decode_loose(node),
            };
            items.push(decoded);
            continue;
        }

        match node {
            Json::Array(nested) => {
                // array-of-array: recurse with the component type of the
                // current level, at every position
                let child_component = component.and_then(PropertyKind::component);
                if let Value::List(child_items) = &mut items[index] {
                    nested_object_found |=
                        handle_array_node(cx, nested, child_items, child_component)
                            .map_err(|err| err.with_index(index))?;
                }
            }

            Json::Object(object) => match &mut items[index] {
                Value::Entity(entity) => {
                    do_merge(cx, object, entity).map_err(|err| err.with_index(index))?;
                    nested_object_found = true;
                }
                live @ Value::Map(_) => {
                    if let Some(PropertyKind::Mapping { key, value }) = component {
                        merge_map_node(cx, object, live, *key, value)
                            .map_err(|err| err.with_index(index))?;
                        nested_object_found = true;
                    }
                }
                slot => {
                    // shape drift: overwrite in place so a pruned node
                    // loses nothing
                    if let Some(kind) = component {
                        *slot = cx
                            .view
                            .decode_tree(node, kind)
                            .map_err(|err| MergeError::payload(err).with_index(index))?;
                    }
                }
            },

            scalar => {
                // positional scalar overwrite so mixed arrays survive the
                // node being recorded consumed
                let decoded = match component {
                    Some(kind) => cx
                        .view
                        .decode_scalar(scalar, kind)
                        .map_err(|err| MergeError::payload(err).with_index(index))?,
                    None => cx.view.decode_loose(scalar),
                };
                items[index] = decoded;
            }
        }
    }

    // more items in the live sequence than in the document: remove them
    items.truncate(array.len());

    Ok(nested_object_found)
}
