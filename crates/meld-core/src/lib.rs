//! Core runtime for meld: the tagged object-graph value model, property
//! accessors, mapped-property resolution, the merge engines, and the
//! document-driven tree merge driver behind `DomainReader`.

pub mod accessor;
pub mod error;
pub mod mapped;
pub mod merge;
pub mod obs;
pub mod reader;
pub mod value;
pub mod view;

// test
#[cfg(test)]
pub(crate) mod test_fixtures;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No engines, sinks, or helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        error::MergeError,
        reader::DomainReader,
        value::{EntityValue, EnumValue, Value},
        view::{JsonView, SerializerView},
    };
    pub use meld_schema::prelude::*;
}
