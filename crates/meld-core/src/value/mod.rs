mod entity;


use serde::Serialize;
use std::cmp::Ordering;
use thiserror::Error as ThisError;

// re-exports
pub use entity::EntityValue;

///
/// MapValueError
///
/// Invariant violations for `Value::Map` construction/normalization.
///

#[derive(Clone, Debug, PartialEq, ThisError)]
pub enum MapValueError {
    #[error("map key at index {index} must be non-null")]
    EmptyKey { index: usize },

    #[error("map key at index {index} is not keyable: {key:?}")]
    NonKeyableKey { index: usize, key: Value },

    #[error("map contains duplicate keys at normalized positions {left_index} and {right_index}")]
    DuplicateKey {
        left_index: usize,
        right_index: usize,
    },
}

///
/// Value
///
/// Tagged object-graph node. The merge engine dispatches on the schema's
/// `PropertyKind`, never on this enum's runtime shape, but diagnostics and
/// coercion read the concrete variant.
///
/// Null → the field's value is absent (nothing to merge onto/from).
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Value {
    Bool(bool),
    Entity(EntityValue),
    Enum(EnumValue),
    Float(f64),
    Int(i64),
    /// Ordered list of values; order is significant for positional merge.
    List(Vec<Self>),
    /// Canonical deterministic map representation.
    ///
    /// - Entries are always sorted by canonical key order and keys are unique.
    /// - Keys are scalar, non-null, and non-float.
    Map(Vec<(Self, Self)>),
    Null,
    Text(String),
    Uint(u64),
}

impl Value {
    ///
    /// CONSTRUCTION
    ///

    /// Build a `Value::List` from owned items.
    pub fn from_list<T>(items: Vec<T>) -> Self
    where
        T: Into<Self>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Build a canonical `Value::Map` from owned key/value entries.
    ///
    /// Invariants are validated and entries are normalized:
    /// - keys must be keyable scalars and non-null
    /// - entries are sorted by canonical key order
    /// - duplicate keys are rejected
    pub fn from_map(entries: Vec<(Self, Self)>) -> Result<Self, MapValueError> {
        let normalized = Self::normalize_map_entries(entries)?;
        Ok(Self::Map(normalized))
    }

    /// Validate map entry invariants without changing order.
    pub fn validate_map_entries(entries: &[(Self, Self)]) -> Result<(), MapValueError> {
        for (index, (key, _)) in entries.iter().enumerate() {
            if matches!(key, Self::Null) {
                return Err(MapValueError::EmptyKey { index });
            }
            if !key.is_keyable() {
                return Err(MapValueError::NonKeyableKey {
                    index,
                    key: key.clone(),
                });
            }
        }

        Ok(())
    }

    /// Normalize map entries into canonical deterministic order.
    pub fn normalize_map_entries(
        mut entries: Vec<(Self, Self)>,
    ) -> Result<Vec<(Self, Self)>, MapValueError> {
        Self::validate_map_entries(&entries)?;
        entries
            .sort_by(|(left_key, _), (right_key, _)| Self::canonical_cmp_key(left_key, right_key));

        for i in 1..entries.len() {
            let (left_key, _) = &entries[i - 1];
            let (right_key, _) = &entries[i];
            if Self::canonical_cmp_key(left_key, right_key) == Ordering::Equal {
                return Err(MapValueError::DuplicateKey {
                    left_index: i - 1,
                    right_index: i,
                });
            }
        }

        Ok(entries)
    }

    ///
    /// TYPES
    ///

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        match self {
            // definitely not scalar:
            Self::Entity(_) | Self::List(_) | Self::Map(_) | Self::Null => false,
            _ => true,
        }
    }

    /// Returns true when the value may serve as a map key.
    ///
    /// Floats are excluded: key equality must be total and exact.
    #[must_use]
    pub const fn is_keyable(&self) -> bool {
        match self {
            Self::Float(_) => false,
            other => other.is_scalar(),
        }
    }

    /// Stable canonical rank used for cross-variant key ordering.
    const fn key_rank(&self) -> u8 {
        match self {
            Self::Bool(_) => 0,
            Self::Int(_) => 1,
            Self::Uint(_) => 2,
            Self::Text(_) => 3,
            Self::Enum(_) => 4,
            _ => u8::MAX,
        }
    }

    /// Total canonical comparator used for map-key normalization.
    #[must_use]
    pub fn canonical_cmp_key(left: &Self, right: &Self) -> Ordering {
        match (left, right) {
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Uint(a), Self::Uint(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Enum(a), Self::Enum(b)) => {
                a.path.cmp(&b.path).then_with(|| a.variant.cmp(&b.variant))
            }

            // Mixed signedness compares numerically so 1i64 and 1u64 collide.
            (Self::Int(a), Self::Uint(b)) => cmp_int_uint(*a, *b),
            (Self::Uint(a), Self::Int(b)) => cmp_int_uint(*b, *a).reverse(),

            _ => left.key_rank().cmp(&right.key_rank()),
        }
    }

    ///
    /// CONVERSION
    ///

    #[must_use]
    pub const fn as_text(&self) -> Option<&str> {
        if let Self::Text(s) = self {
            Some(s.as_str())
        } else {
            None
        }
    }

    #[must_use]
    pub const fn as_list(&self) -> Option<&[Self]> {
        if let Self::List(xs) = self {
            Some(xs.as_slice())
        } else {
            None
        }
    }

    #[must_use]
    pub const fn as_map(&self) -> Option<&[(Self, Self)]> {
        if let Self::Map(entries) = self {
            Some(entries.as_slice())
        } else {
            None
        }
    }

    #[must_use]
    pub const fn as_entity(&self) -> Option<&EntityValue> {
        if let Self::Entity(e) = self {
            Some(e)
        } else {
            None
        }
    }

    #[must_use]
    pub const fn as_entity_mut(&mut self) -> Option<&mut EntityValue> {
        if let Self::Entity(e) = self {
            Some(e)
        } else {
            None
        }
    }

    ///
    /// EMPTY
    ///

    #[must_use]
    pub const fn is_empty(&self) -> Option<bool> {
        match self {
            Self::List(xs) => Some(xs.is_empty()),
            Self::Map(entries) => Some(entries.is_empty()),
            Self::Text(s) => Some(s.is_empty()),

            // absent fields are represented as Value::Null:
            Self::Null => Some(true),

            _ => None,
        }
    }
}

// Mixed-sign numeric key comparison; negative ints sort below all uints.
fn cmp_int_uint(a: i64, b: u64) -> Ordering {
    u64::try_from(a).map_or(Ordering::Less, |a| a.cmp(&b))
}

#[macro_export]
macro_rules! impl_from_for {
    ( $( $type:ty => $variant:ident ),* $(,)? ) => {
        $(
            impl From<$type> for Value {
                fn from(v: $type) -> Self {
                    Self::$variant(v.into())
                }
            }
        )*
    };
}

impl_from_for! {
    bool        => Bool,
    f32         => Float,
    f64         => Float,
    i8          => Int,
    i16         => Int,
    i32         => Int,
    i64         => Int,
    &str        => Text,
    String      => Text,
    u8          => Uint,
    u16         => Uint,
    u32         => Uint,
    u64         => Uint,
    EntityValue => Entity,
    EnumValue   => Enum,
}

impl From<Vec<Self>> for Value {
    fn from(vec: Vec<Self>) -> Self {
        Self::List(vec)
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Self::Null
    }
}

///
/// EnumValue
/// handles enumerated constants; `path` is optional to allow strict (typed)
/// or loose matching.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct EnumValue {
    pub variant: String,
    pub path: Option<String>,
}

impl EnumValue {
    #[must_use]
    /// Build a strict enum value matching the provided variant and path.
    pub fn new(variant: &str, path: Option<&str>) -> Self {
        Self {
            variant: variant.to_string(),
            path: path.map(ToString::to_string),
        }
    }

    #[must_use]
    /// Build a strict enum value bound to its declaring type path.
    pub fn strict(path: &str, variant: &str) -> Self {
        Self::new(variant, Some(path))
    }

    #[must_use]
    /// Build an enum value that ignores the path for loose matching.
    pub fn loose(variant: &str) -> Self {
        Self::new(variant, None)
    }
}
