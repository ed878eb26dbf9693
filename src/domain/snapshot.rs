use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Current field values of one form instance, keyed by field name.
///
/// Only the form controller holds a mutable snapshot; validators,
/// predicates and render callbacks receive `&FormSnapshot`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormSnapshot {
    values: HashMap<String, Value>,
}

impl FormSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Value as display text; `None` when the field is absent or null
    pub fn get_str(&self, name: &str) -> Option<String> {
        self.values.get(name).and_then(value_to_text)
    }

    /// Truthiness of a field the way a checkbox or flag reads it
    pub fn is_truthy(&self, name: &str) -> bool {
        self.values.get(name).map(is_truthy).unwrap_or(false)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(name.into(), value)
    }

    pub(crate) fn entry_or_insert(&mut self, name: &str, value: Value) {
        self.values.entry(name.to_string()).or_insert(value);
    }

    /// JSON object view of the snapshot, keys sorted
    pub fn to_json(&self) -> Value {
        let mut keys: Vec<&String> = self.values.keys().collect();
        keys.sort();
        let map: Map<String, Value> = keys
            .into_iter()
            .map(|k| (k.clone(), self.values[k].clone()))
            .collect();
        Value::Object(map)
    }
}

impl FromIterator<(String, Value)> for FormSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Extra state visible to visibility/disabled predicates besides the snapshot.
///
/// Pages put flags here (e.g. edit vs create mode) instead of capturing
/// outer variables in their predicates. The cascade orchestrator writes its
/// "manual entry unlocked" flags here too.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormContext {
    values: HashMap<String, Value>,
}

impl FormContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn flag(&self, key: &str) -> bool {
        self.values.get(key).map(is_truthy).unwrap_or(false)
    }
}

/// Emptiness as the required-rule sees it: null, blank string, empty
/// array/object and `false` are empty; numbers never are.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Number(_) => false,
    }
}

pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Text form of a scalar value; `None` for null
pub fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}
