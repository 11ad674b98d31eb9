use crate::value::{EntityValue, EnumValue, Value};
use meld_schema::node::{Property, PropertyKind};
use meld_schema::types::ScalarKind;
use thiserror::Error as ThisError;

///
/// CoercionError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("cannot coerce {found} into {expected}")]
pub struct CoercionError {
    pub expected: String,
    pub found: &'static str,
}

impl CoercionError {
    fn new(expected: impl Into<String>, found: &Value) -> Self {
        Self {
            expected: expected.into(),
            found: found.variant_name(),
        }
    }
}

impl Value {
    /// Diagnostic name of the concrete variant.
    #[must_use]
    pub const fn variant_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "Bool",
            Self::Entity(_) => "Entity",
            Self::Enum(_) => "Enum",
            Self::Float(_) => "Float",
            Self::Int(_) => "Int",
            Self::List(_) => "List",
            Self::Map(_) => "Map",
            Self::Null => "Null",
            Self::Text(_) => "Text",
            Self::Uint(_) => "Uint",
        }
    }
}

///
/// PropertyAccessor
///
/// Named get/set over one `EntityValue` with value-kind coercion on write.
/// Allocated per invocation; holds no state beyond the borrow.
///

pub struct PropertyAccessor<'a> {
    entity: &'a mut EntityValue,
}

impl<'a> PropertyAccessor<'a> {
    pub const fn new(entity: &'a mut EntityValue) -> Self {
        Self { entity }
    }

    /// Current value for a property; absent fields read as `None`.
    #[must_use]
    pub fn get(&self, property: &Property) -> Option<&Value> {
        self.entity.get(property.ident)
    }

    /// Write a value into the property's field slot, coercing it to the
    /// declared shape first.
    pub fn set(&mut self, property: &Property, value: Value) -> Result<(), CoercionError> {
        let coerced = coerce(value, &property.kind)?;
        self.entity.set(property.ident, coerced);

        Ok(())
    }
}

/// Coerce a value into a declared property shape.
///
/// Nulls pass through every shape (a Null write is an explicit wipe).
/// Numeric widenings are applied; anything else must match exactly.
pub fn coerce(value: Value, kind: &PropertyKind) -> Result<Value, CoercionError> {
    if value.is_null() {
        return Ok(value);
    }

    match kind {
        PropertyKind::Scalar(scalar) => coerce_scalar(value, *scalar),

        PropertyKind::Enum { path } => match value {
            Value::Enum(e) => {
                if e.path.is_none() {
                    Ok(Value::Enum(EnumValue::strict(path, &e.variant)))
                } else if e.path.as_deref() == Some(*path) {
                    Ok(Value::Enum(e))
                } else {
                    Err(CoercionError::new(format!("Enum<{path}>"), &Value::Enum(e)))
                }
            }
            Value::Text(s) => Ok(Value::Enum(EnumValue::strict(path, &s))),
            other => Err(CoercionError::new(format!("Enum<{path}>"), &other)),
        },

        PropertyKind::Sequence { component } => match value {
            Value::List(items) => {
                let items = items
                    .into_iter()
                    .map(|item| coerce(item, component))
                    .collect::<Result<_, _>>()?;
                Ok(Value::List(items))
            }
            other => Err(CoercionError::new("List", &other)),
        },

        PropertyKind::Mapping { .. } => match value {
            map @ Value::Map(_) => Ok(map),
            other => Err(CoercionError::new("Map", &other)),
        },

        PropertyKind::Entity { target } => match value {
            entity @ Value::Entity(_) => Ok(entity),
            other => Err(CoercionError::new(format!("Entity<{target}>"), &other)),
        },
    }
}

#[expect(clippy::cast_precision_loss)]
fn coerce_scalar(value: Value, kind: ScalarKind) -> Result<Value, CoercionError> {
    match (kind, value) {
        (ScalarKind::Bool, v @ Value::Bool(_))
        | (ScalarKind::Int, v @ Value::Int(_))
        | (ScalarKind::Uint, v @ Value::Uint(_))
        | (ScalarKind::Float, v @ Value::Float(_))
        | (ScalarKind::Text, v @ Value::Text(_)) => Ok(v),

        // widenings
        (ScalarKind::Int, Value::Uint(u)) => i64::try_from(u)
            .map(Value::Int)
            .map_err(|_| CoercionError::new("Int", &Value::Uint(u))),
        (ScalarKind::Uint, Value::Int(i)) => u64::try_from(i)
            .map(Value::Uint)
            .map_err(|_| CoercionError::new("Uint", &Value::Int(i))),
        (ScalarKind::Float, Value::Int(i)) => Ok(Value::Float(i as f64)),
        (ScalarKind::Float, Value::Uint(u)) => Ok(Value::Float(u as f64)),

        (kind, other) => Err(CoercionError::new(kind.to_string(), &other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_widening_coerces_signedness_and_floats() {
        assert_eq!(
            coerce(Value::Uint(7), &PropertyKind::Scalar(ScalarKind::Int)).unwrap(),
            Value::Int(7)
        );
        assert_eq!(
            coerce(Value::Int(7), &PropertyKind::Scalar(ScalarKind::Float)).unwrap(),
            Value::Float(7.0)
        );
        assert!(coerce(Value::Int(-1), &PropertyKind::Scalar(ScalarKind::Uint)).is_err());
    }

    #[test]
    fn null_passes_through_every_shape() {
        let kinds = [
            PropertyKind::Scalar(ScalarKind::Text),
            PropertyKind::sequence(PropertyKind::Scalar(ScalarKind::Int)),
            PropertyKind::Entity { target: "demo::X" },
        ];
        for kind in kinds {
            assert_eq!(coerce(Value::Null, &kind).unwrap(), Value::Null);
        }
    }

    #[test]
    fn text_coerces_into_declared_enum() {
        let kind = PropertyKind::Enum {
            path: "demo::Color",
        };
        assert_eq!(
            coerce(Value::Text("Red".into()), &kind).unwrap(),
            Value::Enum(EnumValue::strict("demo::Color", "Red"))
        );

        let loose = Value::Enum(EnumValue::loose("Blue"));
        assert_eq!(
            coerce(loose, &kind).unwrap(),
            Value::Enum(EnumValue::strict("demo::Color", "Blue"))
        );
    }

    #[test]
    fn sequence_coerces_each_component() {
        let kind = PropertyKind::sequence(PropertyKind::Scalar(ScalarKind::Uint));
        let coerced = coerce(Value::from_list(vec![1i64, 2i64]), &kind).unwrap();
        assert_eq!(coerced, Value::List(vec![Value::Uint(1), Value::Uint(2)]));
    }
}
