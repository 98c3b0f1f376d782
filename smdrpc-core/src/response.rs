//! JSON-RPC response envelope
//!
//! A response carries either a result or a [`Fault`]. When both are set the
//! fault wins: serialization writes `error` and drops `result`. The `id`
//! member is always written, `null` when the originating request had none.
//!
//! The dispatcher attaches its [`ServiceMap`] to every response it builds so
//! the HTTP layer can pick the configured content type.

use crate::codec;
use crate::error::{Error, Fault, Result};
use crate::smd::ServiceMap;
use crate::types::{Id, Version};
use serde_json::{json, Map, Value};
use std::fmt;
use std::sync::Arc;

/// Reply to a request
#[derive(Debug, Clone, Default)]
pub struct Response {
    id: Option<Id>,
    result: Option<Value>,
    error: Option<Fault>,
    version: Option<Version>,
    service_map: Option<Arc<ServiceMap>>,
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse wire text into a response
    ///
    /// # Errors
    ///
    /// Malformed JSON yields the parse fault; valid JSON that is not an object
    /// (`true`, `3`, `"invalid"`, `null`, arrays) yields
    /// `Error::InvalidResponse`.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut response = Self::new();
        response.load_json(json)?;
        Ok(response)
    }

    /// Load members from wire text, see [`Response::from_json`]
    pub fn load_json(&mut self, json: &str) -> Result<&mut Self> {
        let map = codec::decode_object(json).map_err(|err| match err {
            Error::Fault(_) => Error::InvalidResponse(format!("malformed JSON: {}", json)),
            other => other,
        })?;
        Ok(self.set_options(&map))
    }

    /// Assign members from a decoded object
    ///
    /// An `error` object is turned into a [`Fault`] first: `code` defaults to
    /// `OTHER` (as does 0), `message` to the empty string, `data` is optional.
    /// Keys other than `id`, `result`, `error`, `jsonrpc` and `version` are
    /// ignored, including numeric-looking ones such as `"0"`.
    pub fn set_options(&mut self, options: &Map<String, Value>) -> &mut Self {
        for (key, value) in options {
            match key.as_str() {
                "error" => match value {
                    Value::Object(error) => {
                        self.error = Some(fault_from_map(error));
                    }
                    Value::Null => self.error = None,
                    _ => {}
                },
                "result" => {
                    self.result = Some(value.clone());
                }
                "id" => {
                    self.id = Id::from_value(value);
                }
                "jsonrpc" | "version" => {
                    if let Some(version) = value.as_str() {
                        self.set_version(version);
                    }
                }
                _ => {}
            }
        }
        self
    }

    pub fn id(&self) -> Option<&Id> {
        self.id.as_ref()
    }

    pub fn set_id(&mut self, id: Option<Id>) -> &mut Self {
        self.id = id;
        self
    }

    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    pub fn set_result(&mut self, result: Value) -> &mut Self {
        self.result = Some(result);
        self
    }

    /// Take the result out, leaving `None`
    pub fn take_result(&mut self) -> Option<Value> {
        self.result.take()
    }

    pub fn error(&self) -> Option<&Fault> {
        self.error.as_ref()
    }

    pub fn set_error(&mut self, error: Option<Fault>) -> &mut Self {
        self.error = error;
        self
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Record a fault on this response and return it
    ///
    /// A later call replaces the earlier fault.
    pub fn fault(&mut self, message: impl Into<String>, code: i32, data: Option<Value>) -> Fault {
        let fault = Fault::new(message, code, data);
        self.error = Some(fault.clone());
        fault
    }

    /// `Some(Version::V2)` only when set from the literal `"2.0"`
    pub fn version(&self) -> Option<Version> {
        self.version
    }

    pub fn set_version(&mut self, version: &str) -> &mut Self {
        self.version = match Version::parse(version) {
            Version::V2 => Some(Version::V2),
            Version::V1 => None,
        };
        self
    }

    pub fn service_map(&self) -> Option<&ServiceMap> {
        self.service_map.as_deref()
    }

    pub fn set_service_map(&mut self, service_map: Option<Arc<ServiceMap>>) -> &mut Self {
        self.service_map = service_map;
        self
    }

    /// `{id, result | error, jsonrpc?}`
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert(
            "id".into(),
            self.id.as_ref().map(Id::to_value).unwrap_or(Value::Null),
        );
        match &self.error {
            Some(error) => {
                map.insert("error".into(), error.to_value());
            }
            None => {
                map.insert("result".into(), self.result.clone().unwrap_or(Value::Null));
            }
        }
        if self.version == Some(Version::V2) {
            map.insert("jsonrpc".into(), json!("2.0"));
        }
        Value::Object(map)
    }

    pub fn to_json(&self) -> String {
        self.to_value().to_string()
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}

fn fault_from_map(error: &Map<String, Value>) -> Fault {
    let code = error
        .get("code")
        .and_then(Value::as_i64)
        .and_then(|c| i32::try_from(c).ok())
        .unwrap_or(Fault::OTHER);
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let data = error.get("data").filter(|d| !d.is_null()).cloned();
    Fault::new(message, code, data)
}
