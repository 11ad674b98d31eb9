//! The merge engines: scalar/reference core, positional collection merge,
//! keyed map merge, and the document-driven tree merge driver.

mod collection;
mod document;
mod map;
mod put;

#[cfg(test)]
mod tests;

pub use document::{ConsumedFields, MergeOutcome};

pub(crate) use collection::{handle_array, merge_collections};
pub(crate) use document::do_merge;
pub(crate) use map::{merge_map_node, merge_maps};
pub(crate) use put::{merge_for_put, merge_value};

use crate::view::SerializerView;
use meld_schema::registry::SchemaRegistry;

///
/// MergeCx
///
/// Per-invocation collaborator bundle threaded through the engines. Holds
/// no working state; everything mutable lives on the target graph and the
/// consumed-field sets.
///

#[derive(Clone, Copy)]
pub(crate) struct MergeCx<'a> {
    pub registry: &'a SchemaRegistry,
    pub view: &'a dyn SerializerView,
}
