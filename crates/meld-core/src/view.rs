use crate::value::{EntityValue, EnumValue, Value};
use meld_schema::{
    node::PropertyKind,
    registry::SchemaRegistry,
    types::ScalarKind,
};
use serde_json::Value as Json;
use std::{
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet},
};
use thiserror::Error as ThisError;

///
/// DecodeError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum DecodeError {
    #[error("expected {expected}, found {found}")]
    Mismatch {
        expected: String,
        found: &'static str,
    },

    #[error("number out of range for {kind}: {value}")]
    OutOfRange { kind: ScalarKind, value: String },

    #[error("invalid map key '{key}': {reason}")]
    Key { key: String, reason: String },

    #[error("no schema registered for entity '{path}'")]
    UnknownEntity { path: String },
}

impl DecodeError {
    fn mismatch(expected: impl Into<String>, node: &Json) -> Self {
        Self::Mismatch {
            expected: expected.into(),
            found: json_shape(node),
        }
    }
}

pub(crate) const fn json_shape(node: &Json) -> &'static str {
    match node {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

///
/// SerializerView
///
/// The serializer's view of the schema: which property names it exposes for
/// a type, plus generic decoding of document nodes into declared shapes.
/// This is the merge engine's only seam to the serialization layer.
///

pub trait SerializerView {
    /// Writable property names the serializer exposes for a type path.
    fn mapped_field_names(&self, path: &str) -> BTreeSet<String>;

    /// Decode a raw scalar document node into the given shape.
    fn decode_scalar(&self, node: &Json, kind: &PropertyKind) -> Result<Value, DecodeError>;

    /// Decode a whole document subtree into the given shape.
    fn decode_tree(&self, node: &Json, kind: &PropertyKind) -> Result<Value, DecodeError>;

    /// Decode a raw map key into the declared key kind.
    fn decode_key(&self, raw: &str, kind: ScalarKind) -> Result<Value, DecodeError>;

    /// Loose structural decode with no declared shape.
    ///
    /// Used when the target's schema cannot be resolved and the whole
    /// operation degrades to a generic pass.
    fn decode_loose(&self, node: &Json) -> Value {
        match node {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => {
                if let Some(u) = n.as_u64() {
                    Value::Uint(u)
                } else if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Json::String(s) => Value::Text(s.clone()),
            Json::Array(items) => Value::List(items.iter().map(|i| self.decode_loose(i)).collect()),
            Json::Object(fields) => {
                let entries = fields
                    .iter()
                    .map(|(k, v)| (Value::Text(k.clone()), self.decode_loose(v)))
                    .collect();
                // object keys are unique strings, already canonical-sortable
                Value::Map(Value::normalize_map_entries(entries).unwrap_or_default())
            }
        }
    }
}

///
/// JsonView
///
/// Default `serde_json`-backed serializer view. Exposes every schema
/// property unless explicitly hidden; hidden names become unmapped and are
/// copied verbatim on PUT instead of being merged.
///

#[derive(Clone, Debug)]
pub struct JsonView {
    registry: SchemaRegistry,
    hidden: BTreeMap<String, BTreeSet<String>>,
}

impl JsonView {
    #[must_use]
    pub const fn new(registry: SchemaRegistry) -> Self {
        Self {
            registry,
            hidden: BTreeMap::new(),
        }
    }

    /// Hide a property name from the serializer's view of `path`.
    #[must_use]
    pub fn hide(mut self, path: &str, field: &str) -> Self {
        self.hidden
            .entry(path.to_string())
            .or_default()
            .insert(field.to_string());
        self
    }

    fn is_hidden(&self, path: &str, field: &str) -> bool {
        self.hidden.get(path).is_some_and(|set| set.contains(field))
    }
}

impl SerializerView for JsonView {
    fn mapped_field_names(&self, path: &str) -> BTreeSet<String> {
        let Some(entity) = self.registry.schema_for(path) else {
            return BTreeSet::new();
        };

        entity
            .properties
            .iter()
            .map(|p| p.ident)
            .filter(|ident| !self.is_hidden(path, ident))
            .map(ToString::to_string)
            .collect()
    }

    fn decode_scalar(&self, node: &Json, kind: &PropertyKind) -> Result<Value, DecodeError> {
        if node.is_null() {
            return Ok(Value::Null);
        }

        match kind {
            PropertyKind::Scalar(scalar) => decode_json_scalar(node, *scalar),

            PropertyKind::Enum { path } => match node {
                Json::String(s) => Ok(Value::Enum(EnumValue::strict(path, s))),
                other => Err(DecodeError::mismatch(format!("Enum<{path}>"), other)),
            },

            other => Err(DecodeError::Mismatch {
                expected: "scalar shape".to_string(),
                found: kind_shape(other),
            }),
        }
    }

    fn decode_tree(&self, node: &Json, kind: &PropertyKind) -> Result<Value, DecodeError> {
        if node.is_null() {
            return Ok(Value::Null);
        }

        match kind {
            PropertyKind::Scalar(_) | PropertyKind::Enum { .. } => self.decode_scalar(node, kind),

            PropertyKind::Sequence { component } => match node {
                Json::Array(items) => {
                    let items = items
                        .iter()
                        .map(|item| self.decode_tree(item, component))
                        .collect::<Result<_, _>>()?;
                    Ok(Value::List(items))
                }
                other => Err(DecodeError::mismatch("array", other)),
            },

            PropertyKind::Mapping { key, value } => match node {
                Json::Object(fields) => {
                    let mut entries: Vec<(Value, Value)> = Vec::with_capacity(fields.len());
                    for (raw_key, child) in fields {
                        let decoded_key = self.decode_key(raw_key, *key)?;

                        // distinct raw keys can decode to the same canonical
                        // key ('1' and '+1' both parse to Int(1))
                        let duplicate = entries.iter().any(|(existing, _)| {
                            Value::canonical_cmp_key(existing, &decoded_key) == Ordering::Equal
                        });
                        if duplicate {
                            return Err(DecodeError::Key {
                                key: raw_key.clone(),
                                reason: "decodes to a key already present in the map".to_string(),
                            });
                        }

                        entries.push((decoded_key, self.decode_tree(child, value)?));
                    }

                    entries.sort_by(|(left, _), (right, _)| Value::canonical_cmp_key(left, right));
                    Ok(Value::Map(entries))
                }
                other => Err(DecodeError::mismatch("object", other)),
            },

            PropertyKind::Entity { target } => match node {
                Json::Object(fields) => {
                    let Some(schema) = self.registry.schema_for(target) else {
                        return Err(DecodeError::UnknownEntity {
                            path: (*target).to_string(),
                        });
                    };

                    let mut entity = EntityValue::new(*target);
                    for (field, child) in fields {
                        // unknown fields are ignored, as the generic
                        // deserializer would
                        if let Some(property) = schema.properties.get(field) {
                            entity.set(field.clone(), self.decode_tree(child, &property.kind)?);
                        }
                    }
                    Ok(Value::Entity(entity))
                }
                other => Err(DecodeError::mismatch(format!("Entity<{target}>"), other)),
            },
        }
    }

    fn decode_key(&self, raw: &str, kind: ScalarKind) -> Result<Value, DecodeError> {
        let parse_err = |reason: &str| DecodeError::Key {
            key: raw.to_string(),
            reason: reason.to_string(),
        };

        match kind {
            ScalarKind::Text => Ok(Value::Text(raw.to_string())),
            ScalarKind::Bool => match raw {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(parse_err("expected 'true' or 'false'")),
            },
            ScalarKind::Int => raw
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| parse_err("expected a signed integer")),
            ScalarKind::Uint => raw
                .parse::<u64>()
                .map(Value::Uint)
                .map_err(|_| parse_err("expected an unsigned integer")),
            // rejected at schema registration; unreachable through a built
            // registry
            ScalarKind::Float => Err(parse_err("float keys are not keyable")),
        }
    }
}

fn decode_json_scalar(node: &Json, kind: ScalarKind) -> Result<Value, DecodeError> {
    let out_of_range = |value: &Json| DecodeError::OutOfRange {
        kind,
        value: value.to_string(),
    };

    match (kind, node) {
        (ScalarKind::Bool, Json::Bool(b)) => Ok(Value::Bool(*b)),
        (ScalarKind::Text, Json::String(s)) => Ok(Value::Text(s.clone())),
        (ScalarKind::Int, n @ Json::Number(number)) => {
            number.as_i64().map(Value::Int).ok_or_else(|| out_of_range(n))
        }
        (ScalarKind::Uint, n @ Json::Number(number)) => {
            number.as_u64().map(Value::Uint).ok_or_else(|| out_of_range(n))
        }
        (ScalarKind::Float, n @ Json::Number(number)) => number
            .as_f64()
            .map(Value::Float)
            .ok_or_else(|| out_of_range(n)),
        (kind, other) => Err(DecodeError::mismatch(kind.to_string(), other)),
    }
}

const fn kind_shape(kind: &PropertyKind) -> &'static str {
    match kind {
        PropertyKind::Scalar(_) => "scalar",
        PropertyKind::Enum { .. } => "enum",
        PropertyKind::Sequence { .. } => "sequence",
        PropertyKind::Mapping { .. } => "mapping",
        PropertyKind::Entity { .. } => "entity",
    }
}
