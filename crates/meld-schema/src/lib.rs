//! Schema AST for the meld merge engine: entity nodes, tagged property
//! kinds, association metadata, and the registration-time registry with
//! staged validation.

pub mod error;
pub mod node;
pub mod registry;
pub mod types;
pub mod validate;

use crate::registry::BuildError;
use thiserror::Error as ThisError;

/// Maximum length for entity schema identifiers.
pub const MAX_ENTITY_NAME_LEN: usize = 64;

/// Maximum length for property schema identifiers.
pub const MAX_PROPERTY_NAME_LEN: usize = 64;

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        err,
        error::ErrorTree,
        node::{Association, Direction, Entity, Property, PropertyKind, PropertyList},
        registry::{SchemaBuilder, SchemaRegistry},
        types::ScalarKind,
    };
    pub use serde::{Deserialize, Serialize};
}

///
/// Error
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    BuildError(#[from] BuildError),
}
