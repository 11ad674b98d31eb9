use crate::value::Value;
use serde::Serialize;
use std::collections::BTreeMap;

///
/// EntityValue
///
/// Live instance of one domain type: the schema path it was resolved
/// against plus a field map. Merge mutates the field map in place and never
/// swaps the instance itself for the entity currently being merged.
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EntityValue {
    /// Schema path of the declaring entity.
    pub path: String,

    /// Field storage; absent fields are simply missing keys.
    pub fields: BTreeMap<String, Value>,
}

impl EntityValue {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            fields: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_field(mut self, ident: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(ident.into(), value.into());
        self
    }

    /// Current value for a field; absent fields read as `None`.
    #[must_use]
    pub fn get(&self, ident: &str) -> Option<&Value> {
        self.fields.get(ident)
    }

    #[must_use]
    pub fn get_mut(&mut self, ident: &str) -> Option<&mut Value> {
        self.fields.get_mut(ident)
    }

    /// Overwrite a field's storage directly, without coercion.
    pub fn set(&mut self, ident: impl Into<String>, value: Value) {
        self.fields.insert(ident.into(), value);
    }

    pub fn remove(&mut self, ident: &str) -> Option<Value> {
        self.fields.remove(ident)
    }

    #[must_use]
    pub fn contains(&self, ident: &str) -> bool {
        self.fields.contains_key(ident)
    }
}
