mod entity;
mod property;

pub use entity::Entity;
pub use property::{Association, Property, PropertyKind, PropertyList};

// re-export so node consumers see one vocabulary
pub use crate::types::Direction;
