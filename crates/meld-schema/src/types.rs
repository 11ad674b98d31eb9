use derive_more::{Display, FromStr};
use serde::{Deserialize, Serialize};

///
/// ScalarKind
///
/// Primitive value shapes carried by scalar properties and map keys.
/// Resolved once when a schema is built; merge-time code matches on this
/// instead of downcasting runtime values.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, FromStr, PartialEq, Serialize)]
#[remain::sorted]
pub enum ScalarKind {
    Bool,
    Float,
    Int,
    Text,
    Uint,
}

impl ScalarKind {
    /// Returns true when values of this kind may serve as map keys.
    ///
    /// Floats are excluded: key equality must be total and exact.
    #[must_use]
    pub const fn is_keyable(self) -> bool {
        !matches!(self, Self::Float)
    }
}

///
/// Direction
///
/// Association directionality. The inverse side of a bidirectional
/// association must not independently drive association replacement, so the
/// inverse property name is carried explicitly and validated non-empty at
/// registration.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Direction {
    Unidirectional,
    Bidirectional { inverse: &'static str },
}

impl Direction {
    #[must_use]
    pub const fn is_bidirectional(&self) -> bool {
        matches!(self, Self::Bidirectional { .. })
    }
}
