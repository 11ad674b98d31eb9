//! Meld — schema-aware deep merge of documents onto typed object graphs
//!
//! This is the public meta-crate. Downstream users depend on **meld** only.
//!
//! It re-exports the stable public API from:
//!   - `meld-core`   (runtime value model, merge engines, `DomainReader`)
//!   - `meld-schema` (entity/property descriptors, registry, validation)

pub use meld_core as core;
pub use meld_schema as schema;

/// Workspace version of the public API.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use meld_core::{
    error::MergeError,
    merge::{ConsumedFields, MergeOutcome},
    obs,
    reader::DomainReader,
    value::{EntityValue, EnumValue, Value},
    view::{JsonView, SerializerView},
};
pub use meld_schema::{
    node::{Association, Entity, Property, PropertyKind},
    registry::{SchemaBuilder, SchemaRegistry},
    types::ScalarKind,
};

//
// Prelude
//

pub mod prelude {
    pub use meld_core::prelude::*;
}
