//! Shared envelope building blocks
//!
//! - [`Id`]: scalar request identifier; `null` or absent means notification
//! - [`Version`]: protocol generation of an envelope (1.0 or 2.0)
//! - [`Params`]: ordered parameter collection keyed by position or by name

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Request identifier
///
/// JSON-RPC 1.0 peers send numbers, strings and the occasional boolean as
/// ids, so all three scalar kinds are accepted. A missing or `null` id is
/// not an `Id` at all: the request is a notification and is modelled as
/// `Option<Id>::None`.
///
/// # Examples
///
/// ```rust
/// use smdrpc_core::Id;
///
/// let id: Id = 42i64.into();
/// assert_eq!(id.to_string(), "42");
///
/// let id: Id = "req-1".into();
/// assert_eq!(id.to_string(), "\"req-1\"");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    String(String),
    Number(serde_json::Number),
    Bool(bool),
}

impl Id {
    /// Read an id from a decoded JSON value
    ///
    /// Returns `None` for `null` and for arrays/objects, which are not
    /// usable identifiers.
    pub fn from_value(value: &Value) -> Option<Id> {
        match value {
            Value::String(s) => Some(Id::String(s.clone())),
            Value::Number(n) => Some(Id::Number(n.clone())),
            Value::Bool(b) => Some(Id::Bool(*b)),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Id::String(s) => Value::String(s.clone()),
            Id::Number(n) => Value::Number(n.clone()),
            Id::Bool(b) => Value::Bool(*b),
        }
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::String(s) => write!(f, "\"{}\"", s),
            Id::Number(n) => write!(f, "{}", n),
            Id::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Id::String(s)
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id::String(s.to_string())
    }
}

impl From<i64> for Id {
    fn from(n: i64) -> Self {
        Id::Number(n.into())
    }
}

impl From<u64> for Id {
    fn from(n: u64) -> Self {
        Id::Number(n.into())
    }
}

impl From<i32> for Id {
    fn from(n: i32) -> Self {
        Id::Number(n.into())
    }
}

impl From<bool> for Id {
    fn from(b: bool) -> Self {
        Id::Bool(b)
    }
}

/// Protocol generation of an envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Version {
    #[default]
    V1,
    V2,
}

impl Version {
    /// Lossy parse: only the literal `"2.0"` selects [`Version::V2`]
    pub fn parse(version: &str) -> Self {
        if version == "2.0" {
            Version::V2
        } else {
            Version::V1
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Version::V1 => "1.0",
            Version::V2 => "2.0",
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key of a single parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamKey {
    Index(usize),
    Name(String),
}

impl From<usize> for ParamKey {
    fn from(index: usize) -> Self {
        ParamKey::Index(index)
    }
}

impl From<&str> for ParamKey {
    fn from(name: &str) -> Self {
        ParamKey::Name(name.to_string())
    }
}

impl From<String> for ParamKey {
    fn from(name: String) -> Self {
        ParamKey::Name(name)
    }
}

/// Ordered request parameters
///
/// Entries keep insertion order and are keyed either by position or by
/// name. A collection whose keys are exactly `0..len` is positional and
/// serializes as a JSON array; anything else is associative and serializes
/// as an object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    entries: Vec<(ParamKey, Value)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a decoded `params` member
    ///
    /// Arrays give positional entries, objects named ones. Any other JSON
    /// value is not a parameter collection and yields `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Array(items) => Some(items.iter().cloned().collect()),
            Value::Object(map) => Some(map.clone().into()),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Store `value` under `key`, replacing an existing entry in place
    pub fn set(&mut self, key: ParamKey, value: Value) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Append at the next integer index (the current length)
    pub fn push(&mut self, value: Value) {
        let index = self.entries.len();
        self.set(ParamKey::Index(index), value);
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.set(ParamKey::Name(name.into()), value);
    }

    pub fn get(&self, key: &ParamKey) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.get(&ParamKey::Index(index))
    }

    pub fn get_named(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| matches!(k, ParamKey::Name(n) if n == name))
            .map(|(_, v)| v)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.get_named(name).is_some()
    }

    /// True unless the keys are exactly `0, 1, .., len - 1` in order
    pub fn is_associative(&self) -> bool {
        self.entries
            .iter()
            .enumerate()
            .any(|(i, (k, _))| *k != ParamKey::Index(i))
    }

    /// True when the first entry is keyed by name
    pub fn first_is_named(&self) -> bool {
        matches!(self.entries.first(), Some((ParamKey::Name(_), _)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ParamKey, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// JSON form: array when positional, object otherwise
    pub fn to_value(&self) -> Value {
        if !self.is_associative() {
            return Value::Array(self.entries.iter().map(|(_, v)| v.clone()).collect());
        }
        let map: Map<String, Value> = self
            .entries
            .iter()
            .map(|(k, v)| {
                let key = match k {
                    ParamKey::Index(i) => i.to_string(),
                    ParamKey::Name(n) => n.clone(),
                };
                (key, v.clone())
            })
            .collect();
        Value::Object(map)
    }
}

impl FromIterator<Value> for Params {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        let mut params = Params::new();
        for value in iter {
            params.push(value);
        }
        params
    }
}

impl From<Vec<Value>> for Params {
    fn from(values: Vec<Value>) -> Self {
        values.into_iter().collect()
    }
}

/// Object keys written as canonical decimal integers (`"0"`, `"12"`, not
/// `"01"`) are positions, not names
impl From<Map<String, Value>> for Params {
    fn from(map: Map<String, Value>) -> Self {
        let mut params = Params::new();
        for (name, value) in map {
            match index_key(&name) {
                Some(index) => params.set(ParamKey::Index(index), value),
                None => params.insert(name, value),
            }
        }
        params
    }
}

impl Serialize for Params {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

fn index_key(name: &str) -> Option<usize> {
    let canonical = name == "0"
        || (!name.starts_with('0') && !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()));
    if canonical {
        name.parse().ok()
    } else {
        None
    }
}
