//! One callable entry of a service map

use super::Envelope;
use crate::error::{Error, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

lazy_static! {
    // Identifier-like names; characters from U+007F up are accepted. The
    // `rpc.` prefix is checked separately.
    static ref NAME_RE: Regex =
        Regex::new(r"^[a-zA-Z_\x{7f}-\x{10FFFF}][a-zA-Z0-9_.\\\x{7f}-\x{10FFFF}]*$")
            .expect("service name pattern is valid");
}

const RESERVED_PREFIX: &str = "rpc.";

/// The only transport a service may use
pub const TRANSPORT_POST: &str = "POST";

/// Normalize a declared type name
///
/// Unknown names collapse to `object`.
pub fn normalize_type(name: &str) -> &'static str {
    match name {
        "any" | "mixed" => "any",
        "arr" | "array" => "array",
        "assoc" | "hash" | "object" | "struct" => "object",
        "bool" | "boolean" | "true" | "false" => "boolean",
        "dbl" | "double" | "float" => "float",
        "int" | "integer" => "integer",
        "nil" | "null" | "void" => "null",
        "str" | "string" => "string",
        _ => "object",
    }
}

/// A single type or a union of types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeSpec {
    Single(String),
    Union(Vec<String>),
}

impl TypeSpec {
    pub fn names(&self) -> Vec<&str> {
        match self {
            TypeSpec::Single(name) => vec![name.as_str()],
            TypeSpec::Union(names) => names.iter().map(String::as_str).collect(),
        }
    }

    /// Collapse a list of type names, dropping repeats
    ///
    /// One distinct name gives [`TypeSpec::Single`], more give a union in
    /// first-seen order. An empty list yields `None`.
    pub fn from_names<I, S>(names: I) -> Option<TypeSpec>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if !unique.contains(&name) {
                unique.push(name);
            }
        }
        match unique.len() {
            0 => None,
            1 => unique.pop().map(TypeSpec::Single),
            _ => Some(TypeSpec::Union(unique)),
        }
    }

    fn from_value(value: &Value) -> Option<TypeSpec> {
        match value {
            Value::String(name) => Some(TypeSpec::Single(name.clone())),
            Value::Array(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .map(TypeSpec::Union),
            _ => None,
        }
    }

    fn normalized(&self, is_return: bool) -> Result<TypeSpec> {
        let check = |name: &str| -> Result<String> {
            let normalized = normalize_type(name);
            if !is_return && normalized == "null" {
                return Err(Error::InvalidArgument(format!(
                    "Invalid param type '{}': params may not be null",
                    name
                )));
            }
            Ok(normalized.to_string())
        };
        Ok(match self {
            TypeSpec::Single(name) => TypeSpec::Single(check(name)?),
            TypeSpec::Union(names) => {
                TypeSpec::Union(names.iter().map(|n| check(n)).collect::<Result<_>>()?)
            }
        })
    }
}

impl From<&str> for TypeSpec {
    fn from(name: &str) -> Self {
        TypeSpec::Single(name.to_string())
    }
}

impl From<String> for TypeSpec {
    fn from(name: String) -> Self {
        TypeSpec::Single(name)
    }
}

impl From<Vec<&str>> for TypeSpec {
    fn from(names: Vec<&str>) -> Self {
        TypeSpec::Union(names.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for TypeSpec {
    fn from(names: Vec<String>) -> Self {
        TypeSpec::Union(names)
    }
}

/// Parameter description of a service
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceParam {
    #[serde(rename = "type")]
    types: TypeSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    optional: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl ServiceParam {
    pub fn new(types: impl Into<TypeSpec>) -> Self {
        Self {
            types: types.into(),
            name: None,
            optional: None,
            default: None,
            description: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = Some(optional);
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn types(&self) -> &TypeSpec {
        &self.types
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_optional(&self) -> bool {
        self.optional.unwrap_or(false)
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Read a parameter description; `None` when `type` is missing
    ///
    /// Options of the wrong JSON type are skipped.
    pub fn from_value(value: &Value) -> Option<ServiceParam> {
        let map = value.as_object()?;
        let mut param = ServiceParam::new(TypeSpec::from_value(map.get("type")?)?);
        if let Some(name) = map.get("name").and_then(Value::as_str) {
            param.name = Some(name.to_string());
        }
        if let Some(optional) = map.get("optional").and_then(Value::as_bool) {
            param.optional = Some(optional);
        }
        if let Some(default) = map.get("default") {
            param.default = Some(default.clone());
        }
        if let Some(description) = map.get("description").and_then(Value::as_str) {
            param.description = Some(description.to_string());
        }
        Some(param)
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// A callable service: name, parameters and return type
///
/// Parameters may carry an explicit position. [`Service::params`] places
/// explicitly ordered parameters first and lets the rest fill the lowest
/// free positions in the order they were added.
#[derive(Debug, Clone, PartialEq)]
pub struct Service {
    name: String,
    transport: String,
    envelope: Envelope,
    target: Option<String>,
    params: Vec<(ServiceParam, Option<usize>)>,
    returns: Option<TypeSpec>,
}

impl Service {
    /// Create a service with a validated name
    ///
    /// # Errors
    ///
    /// `Error::InvalidArgument` if the name is empty, not identifier-like, or
    /// starts with the reserved `rpc.` prefix.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let mut service = Self {
            name: String::new(),
            transport: TRANSPORT_POST.to_string(),
            envelope: Envelope::default(),
            target: None,
            params: Vec::new(),
            returns: None,
        };
        service.set_name(name)?;
        Ok(service)
    }

    pub fn is_valid_name(name: &str) -> bool {
        !name.starts_with(RESERVED_PREFIX) && NAME_RE.is_match(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<&mut Self> {
        let name = name.into();
        if !Self::is_valid_name(&name) {
            return Err(Error::InvalidArgument(format!(
                "Invalid name '{}' provided for service; must be an identifier, optionally dotted",
                name
            )));
        }
        self.name = name;
        Ok(self)
    }

    pub fn transport(&self) -> &str {
        &self.transport
    }

    pub fn set_transport(&mut self, transport: &str) -> Result<&mut Self> {
        if transport != TRANSPORT_POST {
            return Err(Error::InvalidArgument(format!(
                "Invalid transport '{}'; please select one of ({})",
                transport, TRANSPORT_POST
            )));
        }
        self.transport = transport.to_string();
        Ok(self)
    }

    pub fn envelope(&self) -> Envelope {
        self.envelope
    }

    pub fn set_envelope(&mut self, envelope: Envelope) -> &mut Self {
        self.envelope = envelope;
        self
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn set_target(&mut self, target: impl Into<String>) -> &mut Self {
        self.target = Some(target.into());
        self
    }

    /// Add a parameter, optionally pinned to a position
    ///
    /// # Errors
    ///
    /// `Error::InvalidArgument` when a type normalizes to `null`.
    pub fn add_param(&mut self, param: ServiceParam, order: Option<usize>) -> Result<&mut Self> {
        let mut param = param;
        param.types = param.types.normalized(false)?;
        self.params.push((param, order));
        Ok(self)
    }

    /// Add parameters from a JSON description
    ///
    /// Accepts an array of parameter objects or an object of them (visited in
    /// key order). Entries that are not objects, or have no `type`, are
    /// skipped. An entry's `order` member pins its position.
    pub fn add_params(&mut self, params: &Value) -> Result<&mut Self> {
        let entries: Vec<&Value> = match params {
            Value::Array(items) => items.iter().collect(),
            Value::Object(map) => {
                let mut keyed: Vec<(&String, &Value)> = map.iter().collect();
                keyed.sort_by(|(a, _), (b, _)| match (a.parse::<usize>(), b.parse::<usize>()) {
                    (Ok(x), Ok(y)) => x.cmp(&y),
                    _ => a.cmp(b),
                });
                keyed.into_iter().map(|(_, v)| v).collect()
            }
            _ => Vec::new(),
        };
        for entry in entries {
            let Some(param) = ServiceParam::from_value(entry) else {
                continue;
            };
            let order = entry
                .get("order")
                .and_then(Value::as_u64)
                .map(|o| o as usize);
            self.add_param(param, order)?;
        }
        Ok(self)
    }

    /// Replace all parameters
    pub fn set_params(&mut self, params: &Value) -> Result<&mut Self> {
        self.params.clear();
        self.add_params(params)
    }

    pub fn clear_params(&mut self) -> &mut Self {
        self.params.clear();
        self
    }

    /// Parameters in call order
    pub fn params(&self) -> Vec<ServiceParam> {
        let mut slots: BTreeMap<usize, &ServiceParam> = BTreeMap::new();
        let mut unordered = Vec::new();
        for (param, order) in &self.params {
            match order {
                Some(order) if !slots.contains_key(order) => {
                    slots.insert(*order, param);
                }
                _ => unordered.push(param),
            }
        }
        let mut next = 0;
        for param in unordered {
            while slots.contains_key(&next) {
                next += 1;
            }
            slots.insert(next, param);
        }
        slots.into_values().cloned().collect()
    }

    pub fn returns(&self) -> Option<&TypeSpec> {
        self.returns.as_ref()
    }

    /// Set the return type; `null`/`void` are allowed here
    pub fn set_return(&mut self, returns: impl Into<TypeSpec>) -> Result<&mut Self> {
        self.returns = Some(returns.into().normalized(true)?);
        Ok(self)
    }

    /// Build a service from its JSON description
    ///
    /// Both `params`/`parameters` and `return`/`returns` are understood, so
    /// the output of [`Service::to_value`] can be read back.
    pub fn from_value(value: &Value) -> Result<Service> {
        let map = value
            .as_object()
            .ok_or_else(|| Error::InvalidArgument("service description must be an object".into()))?;
        let name = map
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::InvalidArgument("service description has no name".into()))?;
        let mut service = Service::new(name)?;
        service.apply_options(map)?;
        Ok(service)
    }

    pub(crate) fn apply_options(&mut self, map: &Map<String, Value>) -> Result<()> {
        if let Some(transport) = map.get("transport").and_then(Value::as_str) {
            self.set_transport(transport)?;
        }
        if let Some(envelope) = map.get("envelope").and_then(Value::as_str) {
            self.set_envelope(envelope.parse()?);
        }
        if let Some(target) = map.get("target").and_then(Value::as_str) {
            self.set_target(target);
        }
        if let Some(params) = map.get("params").or_else(|| map.get("parameters")) {
            self.set_params(params)?;
        }
        if let Some(returns) = map
            .get("return")
            .or_else(|| map.get("returns"))
            .and_then(TypeSpec::from_value)
        {
            self.set_return(returns)?;
        }
        Ok(())
    }

    /// `{envelope, target?, transport, name, parameters, returns}`
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("envelope".into(), json!(self.envelope.as_str()));
        if let Some(target) = self.target.as_deref().filter(|t| !t.is_empty()) {
            map.insert("target".into(), json!(target));
        }
        map.insert("transport".into(), json!(self.transport));
        map.insert("name".into(), json!(self.name));
        map.insert(
            "parameters".into(),
            Value::Array(self.params().iter().map(ServiceParam::to_value).collect()),
        );
        map.insert(
            "returns".into(),
            self.returns
                .as_ref()
                .map(|r| serde_json::to_value(r).unwrap_or(Value::Null))
                .unwrap_or(Value::Null),
        );
        Value::Object(map)
    }

    /// `{name: to_value()}`
    pub fn to_json(&self) -> String {
        let mut map = Map::new();
        map.insert(self.name.clone(), self.to_value());
        Value::Object(map).to_string()
    }
}
