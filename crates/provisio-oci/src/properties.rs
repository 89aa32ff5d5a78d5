//! Typed access to resource property payloads
//!
//! Properties arrive as JSON objects. Fields that reference another resource
//! are objects of the form `{"$ref": ..., "$value": ...}`; a reference with no
//! `$value` yet is unresolved and reads as absent.

use provisio_core::{CoreError, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Borrowed view over a property object
#[derive(Debug, Clone, Copy)]
pub struct Properties<'a> {
    map: &'a Map<String, Value>,
}

impl<'a> Properties<'a> {
    pub fn new(map: &'a Map<String, Value>) -> Self {
        Self { map }
    }

    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key)
    }

    /// A non-empty string, or a resolved reference's value
    pub fn string(&self, key: &str) -> Option<String> {
        self.get(key).and_then(resolve_string)
    }

    /// Like [`Properties::string`], but absence is an error
    pub fn require_string(&self, key: &str) -> Result<String> {
        self.string(key)
            .ok_or_else(|| CoreError::InvalidRequest(format!("{} is required", key)))
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// A non-empty list whose elements are all strings or resolved references
    pub fn strings(&self, key: &str) -> Option<Vec<String>> {
        let items = self.get(key)?.as_array()?;
        if items.is_empty() {
            return None;
        }
        items.iter().map(resolve_string).collect()
    }

    /// A nested object
    pub fn object(&self, key: &str) -> Option<Properties<'a>> {
        self.get(key).and_then(Value::as_object).map(Properties::new)
    }

    /// Freeform tags; non-string values are rendered as text
    pub fn tags(&self, key: &str) -> Option<BTreeMap<String, String>> {
        let tags = self.get(key)?.as_object()?;
        if tags.is_empty() {
            return None;
        }
        Some(
            tags.iter()
                .map(|(k, v)| {
                    let value = match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    (k.clone(), value)
                })
                .collect(),
        )
    }

    /// Defined tags: namespace to key/value object; non-object namespaces are dropped
    pub fn defined_tags(&self, key: &str) -> Option<BTreeMap<String, Map<String, Value>>> {
        let namespaces = self.get(key)?.as_object()?;
        let tags: BTreeMap<_, _> = namespaces
            .iter()
            .filter_map(|(ns, v)| v.as_object().map(|m| (ns.clone(), m.clone())))
            .collect();
        (!tags.is_empty()).then_some(tags)
    }
}

fn resolve_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(reference) => reference
            .get("$value")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(String::from),
        _ => None,
    }
}
