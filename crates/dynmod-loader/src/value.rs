//! Module export values.
//!
//! The loader treats exports as opaque; `Value` is the common currency passed
//! between the loader, script engines and component compilers.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

/// A module export value.
///
/// Cloning is cheap: strings and lists are reference counted and objects are
/// shared handles (see [`Exports`]).
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absent value; a legal module export
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Number
    Number(f64),
    /// Immutable string
    String(Arc<str>),
    /// Immutable list
    List(Arc<[Value]>),
    /// Shared mutable object
    Object(Exports),
}

impl Value {
    /// Create an empty object value
    pub fn object() -> Self {
        Value::Object(Exports::new())
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the boolean, if this is one
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the number, if this is one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the string, if this is one
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the list items, if this is a list
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Get the object handle, if this is an object
    pub fn as_object(&self) -> Option<&Exports> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Property lookup on an object value.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.as_object().and_then(|obj| obj.get(key))
    }

    /// Identity comparison: objects are the same if they share storage,
    /// everything else compares by value.
    pub fn same(a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(x), Value::Bool(y)) => x == y,
            (Value::Number(x), Value::Number(y)) => x == y,
            (Value::String(x), Value::String(y)) => x == y,
            (Value::List(x), Value::List(y)) => Arc::ptr_eq(x, y),
            (Value::Object(x), Value::Object(y)) => Exports::ptr_eq(x, y),
            _ => false,
        }
    }

    /// Convert to JSON for display. Objects reachable from themselves are
    /// rendered as `"[Circular]"`.
    pub fn to_json(&self) -> serde_json::Value {
        let mut visiting = HashSet::new();
        self.to_json_inner(&mut visiting)
    }

    fn to_json_inner(&self, visiting: &mut HashSet<usize>) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.to_string()),
            Value::List(items) => serde_json::Value::Array(
                items.iter().map(|item| item.to_json_inner(visiting)).collect(),
            ),
            Value::Object(obj) => {
                let addr = obj.addr();
                if !visiting.insert(addr) {
                    return serde_json::Value::String("[Circular]".to_string());
                }
                let mut map = serde_json::Map::new();
                for (key, value) in obj.entries() {
                    map.insert(key, value.to_json_inner(visiting));
                }
                visiting.remove(&addr);
                serde_json::Value::Object(map)
            }
        }
    }

    /// Build a value from JSON. Objects become fresh [`Exports`].
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Null),
            serde_json::Value::String(s) => Value::from(s.as_str()),
            serde_json::Value::Array(items) => {
                Value::List(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => {
                let obj = Exports::new();
                for (key, value) in map {
                    obj.set(key.clone(), Value::from_json(value));
                }
                Value::Object(obj)
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items.into())
    }
}

impl From<Exports> for Value {
    fn from(obj: Exports) -> Self {
        Value::Object(obj)
    }
}

/// Shared, interior-mutable object used as a module's exports container.
///
/// Clones are handles to the same storage; use [`Exports::ptr_eq`] to test identity.
#[derive(Clone, Default)]
pub struct Exports(Arc<RwLock<BTreeMap<String, Value>>>);

impl Exports {
    /// Create an empty object
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a property
    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.read().get(key).cloned()
    }

    /// Set a property, returning the previous value
    pub fn set(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.write().insert(key.into(), value)
    }

    /// Remove a property
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.0.write().remove(key)
    }

    /// Check if a property exists
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.read().contains_key(key)
    }

    /// Property names in sorted order
    pub fn keys(&self) -> Vec<String> {
        self.0.read().keys().cloned().collect()
    }

    /// Snapshot of all properties in sorted order
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.0
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Number of properties
    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    /// Check if there are no properties
    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    /// Check whether two handles point at the same object
    pub fn ptr_eq(a: &Exports, b: &Exports) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

// Only keys are printed: exports may contain themselves.
impl fmt::Debug for Exports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exports")
            .field("keys", &self.keys())
            .finish()
    }
}
