//! JSON-RPC request envelope
//!
//! A `Request` is tolerant by construction: loading malformed JSON or
//! setting a malformed method name never fails, it flags the request
//! instead. The dispatcher inspects [`Request::is_parse_error`] and
//! [`Request::is_method_error`] to pick the fault it answers with.
//!
//! # Examples
//!
//! ```rust
//! use smdrpc_core::{Request, Version};
//! use serde_json::json;
//!
//! let mut request = Request::new();
//! request.set_method("math.add").add_param(json!(1)).add_param(json!(2));
//! request.set_id(Some(7i64.into())).set_version("2.0");
//! assert_eq!(
//!     serde_json::from_str::<serde_json::Value>(&request.to_json()).unwrap(),
//!     json!({"method": "math.add", "params": [1, 2], "id": 7, "jsonrpc": "2.0"})
//! );
//!
//! let bad = Request::from_json("{not json");
//! assert!(bad.is_parse_error());
//! ```

use crate::codec;
use crate::types::{Id, ParamKey, Params, Version};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Map, Value};
use std::fmt;

lazy_static! {
    static ref METHOD_RE: Regex =
        Regex::new(r"^[A-Za-z][A-Za-z0-9\\_.]*$").expect("method pattern is valid");
}

/// Inbound or outbound call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Request {
    id: Option<Id>,
    method: String,
    params: Params,
    version: Version,
    is_method_error: bool,
    is_parse_error: bool,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a request from wire text, flagging parse errors
    pub fn from_json(json: &str) -> Self {
        let mut request = Self::new();
        request.load_json(json);
        request
    }

    /// Request for a body that could not be decoded at all, such as bytes
    /// that are not UTF-8
    pub fn parse_failed() -> Self {
        Self {
            is_parse_error: true,
            ..Self::default()
        }
    }

    /// Load members from wire text
    ///
    /// Malformed JSON sets the parse-error flag and leaves everything else
    /// as it was. Valid JSON that is not an object carries no members and
    /// leaves the request untouched.
    pub fn load_json(&mut self, json: &str) -> &mut Self {
        match codec::decode(json) {
            Ok(Value::Object(map)) => {
                self.set_options(&map);
            }
            Ok(_) => {
                tracing::debug!("request body is not a JSON object");
            }
            Err(_) => {
                self.is_parse_error = true;
            }
        }
        self
    }

    /// Assign members from a decoded object
    ///
    /// `method`, `id`, `params`, `version` and `jsonrpc` (alias of
    /// `version`) are read; other keys are ignored. A non-string method is
    /// treated like a malformed one.
    pub fn set_options(&mut self, options: &Map<String, Value>) -> &mut Self {
        for (key, value) in options {
            match key.as_str() {
                "method" => match value.as_str() {
                    Some(method) => {
                        self.set_method(method);
                    }
                    None => self.is_method_error = true,
                },
                "id" => {
                    self.id = Id::from_value(value);
                }
                "params" => {
                    if let Some(params) = Params::from_value(value) {
                        self.set_params(params);
                    }
                }
                "version" | "jsonrpc" => {
                    if let Some(version) = value.as_str() {
                        self.set_version(version);
                    }
                }
                _ => {}
            }
        }
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Set the method name
    ///
    /// A name outside `^[A-Za-z][A-Za-z0-9\._]*$` is not stored; the
    /// method-error flag is raised instead.
    pub fn set_method(&mut self, name: &str) -> &mut Self {
        if METHOD_RE.is_match(name) {
            self.method = name.to_string();
        } else {
            self.is_method_error = true;
        }
        self
    }

    pub fn is_method_error(&self) -> bool {
        self.is_method_error
    }

    pub fn is_parse_error(&self) -> bool {
        self.is_parse_error
    }

    pub fn id(&self) -> Option<&Id> {
        self.id.as_ref()
    }

    pub fn set_id(&mut self, id: Option<Id>) -> &mut Self {
        self.id = id;
        self
    }

    /// A request without id expects no response body
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Only `"2.0"` selects 2.0; anything else means 1.0
    pub fn set_version(&mut self, version: &str) -> &mut Self {
        self.version = Version::parse(version);
        self
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn param(&self, key: impl Into<ParamKey>) -> Option<&Value> {
        self.params.get(&key.into())
    }

    /// Append at the next integer index
    pub fn add_param(&mut self, value: Value) -> &mut Self {
        self.params.push(value);
        self
    }

    /// Insert under `name`; an empty name appends positionally
    pub fn add_named_param(&mut self, name: &str, value: Value) -> &mut Self {
        if name.is_empty() {
            self.params.push(value);
        } else {
            self.params.insert(name, value);
        }
        self
    }

    /// Add with a dynamically typed key
    ///
    /// A string key goes through [`Request::add_named_param`], `null` appends.
    /// Numbers, booleans, arrays and objects are not usable as keys: the
    /// value is dropped and `false` is returned.
    pub fn add_keyed_param(&mut self, value: Value, key: &Value) -> bool {
        match key {
            Value::Null => {
                self.params.push(value);
                true
            }
            Value::String(name) => {
                self.add_named_param(name, value);
                true
            }
            _ => false,
        }
    }

    /// Add every entry, keeping keys
    pub fn add_params(&mut self, params: Params) -> &mut Self {
        for (key, value) in params.iter() {
            match key {
                ParamKey::Index(_) => {
                    self.params.push(value.clone());
                }
                ParamKey::Name(name) => {
                    self.add_named_param(name, value.clone());
                }
            }
        }
        self
    }

    /// Replace all params
    pub fn set_params(&mut self, params: impl Into<Params>) -> &mut Self {
        self.params.clear();
        self.add_params(params.into())
    }

    /// `{method, id?, params?, jsonrpc?}`
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("method".into(), json!(self.method));
        if let Some(id) = &self.id {
            map.insert("id".into(), id.to_value());
        }
        if !self.params.is_empty() {
            map.insert("params".into(), self.params.to_value());
        }
        if self.version == Version::V2 {
            map.insert("jsonrpc".into(), json!("2.0"));
        }
        Value::Object(map)
    }

    pub fn to_json(&self) -> String {
        self.to_value().to_string()
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}
