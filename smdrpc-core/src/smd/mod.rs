//! Service Mapping Description
//!
//! A [`ServiceMap`] describes everything a server exposes: where to send
//! calls (`target`), how to frame them (`envelope`, `contentType`,
//! `transport`) and the callable [`Service`]s with their parameter and return
//! types. It serializes to the SMD 2.0 document served for discovery, or to
//! the older Dojo `.1` form when dojo compatibility is switched on.
//!
//! # Examples
//!
//! ```rust
//! use smdrpc_core::smd::{Envelope, Service, ServiceMap, ServiceParam};
//!
//! let mut smd = ServiceMap::new();
//! smd.set_target("/rpc").set_envelope(Envelope::JsonRpc2);
//!
//! let mut add = Service::new("add").unwrap();
//! add.add_param(ServiceParam::new("int").with_name("a"), None).unwrap();
//! add.add_param(ServiceParam::new("int").with_name("b"), None).unwrap();
//! add.set_return("int").unwrap();
//! smd.add_service(add).unwrap();
//!
//! let doc = smd.to_value();
//! assert_eq!(doc["SMDVersion"], "2.0");
//! assert_eq!(doc["services"]["add"]["returns"], "integer");
//! ```

mod service;

pub use service::{normalize_type, Service, ServiceParam, TypeSpec, TRANSPORT_POST};

use crate::error::{Error, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;

lazy_static! {
    static ref CONTENT_TYPE_RE: Regex =
        Regex::new(r"^(?i)[a-z]+/[a-z][a-z0-9.+-]*(\s*;.*)?$").expect("content type pattern is valid");
}

/// Version tag written into standard documents
pub const SMD_VERSION: &str = "2.0";

/// Default `contentType`
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// JSON-RPC framing advertised by a service map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Envelope {
    #[default]
    #[serde(rename = "JSON-RPC-1.0")]
    JsonRpc1,
    #[serde(rename = "JSON-RPC-2.0")]
    JsonRpc2,
}

impl Envelope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Envelope::JsonRpc1 => "JSON-RPC-1.0",
            Envelope::JsonRpc2 => "JSON-RPC-2.0",
        }
    }
}

impl FromStr for Envelope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "JSON-RPC-1.0" => Ok(Envelope::JsonRpc1),
            "JSON-RPC-2.0" => Ok(Envelope::JsonRpc2),
            other => Err(Error::InvalidArgument(format!(
                "Invalid envelope '{}'; please specify one of (JSON-RPC-1.0, JSON-RPC-2.0)",
                other
            ))),
        }
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registry of services plus the document-level SMD settings
///
/// Service names are unique: [`ServiceMap::add_service`] refuses a name
/// that is already present. Services keep the order they were added in.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceMap {
    transport: String,
    envelope: Envelope,
    content_type: String,
    description: String,
    target: String,
    id: String,
    dojo_compatible: bool,
    services: Vec<Service>,
}

impl Default for ServiceMap {
    fn default() -> Self {
        Self {
            transport: TRANSPORT_POST.to_string(),
            envelope: Envelope::default(),
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            description: String::new(),
            target: String::new(),
            id: String::new(),
            dojo_compatible: false,
            services: Vec::new(),
        }
    }
}

impl ServiceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply settings from a JSON object
    ///
    /// Understood keys: `transport`, `envelope`, `contentType`,
    /// `description`, `target`, `id`, `dojoCompatible` and `services`
    /// (object or array of service descriptions, replacing the current
    /// set). Unknown keys and values of the wrong JSON type are ignored.
    ///
    /// # Errors
    ///
    /// `Error::InvalidArgument` when `options` is not an object or a value is
    /// out of range (unknown envelope, non-POST transport, malformed content
    /// type, bad service description); `Error::DuplicateService` for repeated
    /// service names.
    pub fn set_options(&mut self, options: &Value) -> Result<&mut Self> {
        let map = options
            .as_object()
            .ok_or_else(|| Error::InvalidArgument("SMD options must be an object".into()))?;

        for (key, value) in map {
            match (key.as_str(), value) {
                ("transport", Value::String(v)) => {
                    self.set_transport(v)?;
                }
                ("envelope", Value::String(v)) => {
                    self.set_envelope(v.parse()?);
                }
                ("contentType", Value::String(v)) => {
                    self.set_content_type(v)?;
                }
                ("description", Value::String(v)) => {
                    self.set_description(v.as_str());
                }
                ("target", Value::String(v)) => {
                    self.set_target(v.as_str());
                }
                ("id", Value::String(v)) => {
                    self.set_id(v.as_str());
                }
                ("dojoCompatible", Value::Bool(v)) => {
                    self.set_dojo_compatible(*v);
                }
                ("services", Value::Object(services)) => {
                    let services = services
                        .iter()
                        .map(|(name, spec)| Self::service_from_entry(Some(name), spec))
                        .collect::<Result<Vec<_>>>()?;
                    self.set_services(services)?;
                }
                ("services", Value::Array(services)) => {
                    let services = services
                        .iter()
                        .map(|spec| Self::service_from_entry(None, spec))
                        .collect::<Result<Vec<_>>>()?;
                    self.set_services(services)?;
                }
                _ => {}
            }
        }
        Ok(self)
    }

    fn service_from_entry(key: Option<&str>, spec: &Value) -> Result<Service> {
        match (spec.get("name"), key) {
            (Some(_), _) | (None, None) => Service::from_value(spec),
            (None, Some(name)) => {
                let mut service = Service::new(name)?;
                if let Some(map) = spec.as_object() {
                    service.apply_options(map)?;
                }
                Ok(service)
            }
        }
    }

    pub fn transport(&self) -> &str {
        &self.transport
    }

    /// Only `POST` is accepted
    pub fn set_transport(&mut self, transport: &str) -> Result<&mut Self> {
        if transport != TRANSPORT_POST {
            return Err(Error::InvalidArgument(format!(
                "Invalid transport '{}' specified",
                transport
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

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Must look like `type/subtype`, optionally followed by parameters
    pub fn set_content_type(&mut self, content_type: &str) -> Result<&mut Self> {
        if !CONTENT_TYPE_RE.is_match(content_type) {
            return Err(Error::InvalidArgument(format!(
                "Invalid content type '{}' specified",
                content_type
            )));
        }
        self.content_type = content_type.to_string();
        Ok(self)
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = description.into();
        self
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn set_target(&mut self, target: impl Into<String>) -> &mut Self {
        self.target = target.into();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) -> &mut Self {
        self.id = id.into();
        self
    }

    pub fn is_dojo_compatible(&self) -> bool {
        self.dojo_compatible
    }

    pub fn set_dojo_compatible(&mut self, flag: bool) -> &mut Self {
        self.dojo_compatible = flag;
        self
    }

    /// Attach a service
    ///
    /// # Errors
    ///
    /// `Error::DuplicateService` if the name is taken; remove the existing
    /// service first to replace it.
    pub fn add_service(&mut self, service: Service) -> Result<&mut Self> {
        if self.service(service.name()).is_some() {
            return Err(Error::DuplicateService(service.name().to_string()));
        }
        self.services.push(service);
        Ok(self)
    }

    pub fn add_services(&mut self, services: impl IntoIterator<Item = Service>) -> Result<&mut Self> {
        for service in services {
            self.add_service(service)?;
        }
        Ok(self)
    }

    /// Replace every service
    pub fn set_services(&mut self, services: impl IntoIterator<Item = Service>) -> Result<&mut Self> {
        self.services.clear();
        self.add_services(services)
    }

    pub fn service(&self, name: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.name() == name)
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    /// Returns false when no service has that name
    pub fn remove_service(&mut self, name: &str) -> bool {
        let before = self.services.len();
        self.services.retain(|s| s.name() != name);
        self.services.len() != before
    }

    /// Document form; the Dojo form when dojo compatibility is on
    pub fn to_value(&self) -> Value {
        if self.dojo_compatible {
            return self.to_dojo_value();
        }

        let mut doc = Map::new();
        doc.insert("transport".into(), json!(self.transport));
        doc.insert("envelope".into(), json!(self.envelope.as_str()));
        doc.insert("contentType".into(), json!(self.content_type));
        doc.insert("SMDVersion".into(), json!(SMD_VERSION));
        doc.insert("description".into(), json!(self.description));
        doc.insert("target".into(), json!(self.target));
        doc.insert("id".into(), json!(self.id));

        if !self.services.is_empty() {
            let services: Map<String, Value> = self
                .services
                .iter()
                .map(|service| {
                    // every service is advertised with the document's envelope
                    let mut service = service.clone();
                    service.set_envelope(self.envelope);
                    (service.name().to_string(), service.to_value())
                })
                .collect();
            doc.insert("services".into(), Value::Object(services.clone()));
            doc.insert("methods".into(), Value::Object(services));
        }

        Value::Object(doc)
    }

    /// Dojo `.1` form
    pub fn to_dojo_value(&self) -> Value {
        let mut doc = Map::new();
        doc.insert("SMDVersion".into(), json!(".1"));
        doc.insert("serviceType".into(), json!("JSON-RPC"));

        if self.services.is_empty() {
            return Value::Object(doc);
        }

        let methods: Vec<Value> = self
            .services
            .iter()
            .map(|service| {
                let mut method = Map::new();
                method.insert("name".into(), json!(service.name()));
                method.insert("serviceURL".into(), json!(self.target));

                let params: Vec<Value> = service
                    .params()
                    .iter()
                    .map(|param| {
                        let types = serde_json::to_value(param.types()).unwrap_or(Value::Null);
                        let name = match param.name() {
                            Some(name) => json!(name),
                            None => types.clone(),
                        };
                        json!({"name": name, "type": types})
                    })
                    .collect();
                if !params.is_empty() {
                    method.insert("parameters".into(), Value::Array(params));
                }
                Value::Object(method)
            })
            .collect();
        doc.insert("methods".into(), Value::Array(methods));

        Value::Object(doc)
    }

    pub fn to_json(&self) -> String {
        self.to_value().to_string()
    }
}

impl fmt::Display for ServiceMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_service(name: &str) -> Service {
        let mut service = Service::new(name).unwrap();
        service
            .add_param(ServiceParam::new("int").with_name("a"), None)
            .unwrap();
        service
            .add_param(ServiceParam::new("string").with_optional(true), None)
            .unwrap();
        service.set_return("bool").unwrap();
        service
    }

    #[test]
    fn test_defaults() {
        let smd = ServiceMap::new();
        assert_eq!(smd.transport(), "POST");
        assert_eq!(smd.envelope(), Envelope::JsonRpc1);
        assert_eq!(smd.content_type(), "application/json");
        assert_eq!(smd.description(), "");
        assert_eq!(smd.target(), "");
        assert_eq!(smd.id(), "");
        assert!(!smd.is_dojo_compatible());
        assert!(smd.services().is_empty());
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let mut smd = ServiceMap::new();
        assert!(smd.set_transport("GET").is_err());
        assert!(smd.set_content_type("bogus").is_err());
        assert!(smd.set_content_type("text/javascript").is_ok());
        assert!(smd.set_content_type("application/json-rpc; charset=utf-8").is_ok());
        assert!("JSON-RPC-3.0".parse::<Envelope>().is_err());
    }

    #[test]
    fn test_duplicate_service_rejected() {
        let mut smd = ServiceMap::new();
        smd.add_service(sample_service("foo")).unwrap();
        let err = smd.add_service(sample_service("foo")).unwrap_err();
        assert!(matches!(err, Error::DuplicateService(name) if name == "foo"));
        assert_eq!(smd.services().len(), 1);
    }

    #[test]
    fn test_remove_service() {
        let mut smd = ServiceMap::new();
        smd.add_services(vec![sample_service("foo"), sample_service("bar")])
            .unwrap();
        assert!(smd.remove_service("foo"));
        assert!(!smd.remove_service("foo"));
        assert!(smd.service("foo").is_none());
        assert!(smd.service("bar").is_some());
    }

    #[test]
    fn test_set_services_replaces() {
        let mut smd = ServiceMap::new();
        smd.add_service(sample_service("foo")).unwrap();
        smd.set_services(vec![sample_service("bar"), sample_service("baz")])
            .unwrap();
        let names: Vec<_> = smd.services().iter().map(Service::name).collect();
        assert_eq!(names, vec!["bar", "baz"]);
    }

    #[test]
    fn test_to_value_uses_document_envelope() {
        let mut smd = ServiceMap::new();
        smd.set_envelope(Envelope::JsonRpc2).set_target("/rpc").set_id("/rpc");
        smd.add_service(sample_service("foo")).unwrap();

        let doc = smd.to_value();
        assert_eq!(doc["SMDVersion"], json!("2.0"));
        assert_eq!(doc["envelope"], json!("JSON-RPC-2.0"));
        assert_eq!(doc["services"]["foo"]["envelope"], json!("JSON-RPC-2.0"));
        assert_eq!(doc["methods"], doc["services"]);
        assert_eq!(
            doc["services"]["foo"]["parameters"],
            json!([{"type": "integer", "name": "a"}, {"type": "string", "optional": true}])
        );
    }

    #[test]
    fn test_to_value_without_services() {
        let doc = ServiceMap::new().to_value();
        assert!(doc.get("services").is_none());
        assert!(doc.get("methods").is_none());
    }

    #[test]
    fn test_dojo_form() {
        let mut smd = ServiceMap::new();
        smd.set_target("/rpc").set_dojo_compatible(true);
        assert_eq!(
            smd.to_value(),
            json!({"SMDVersion": ".1", "serviceType": "JSON-RPC"})
        );

        smd.add_service(sample_service("foo")).unwrap();
        smd.add_service(Service::new("bar").unwrap()).unwrap();
        assert_eq!(
            smd.to_value(),
            json!({
                "SMDVersion": ".1",
                "serviceType": "JSON-RPC",
                "methods": [
                    {
                        "name": "foo",
                        "serviceURL": "/rpc",
                        "parameters": [
                            {"name": "a", "type": "integer"},
                            {"name": "string", "type": "string"}
                        ]
                    },
                    {"name": "bar", "serviceURL": "/rpc"}
                ]
            })
        );
    }

    #[test]
    fn test_options_round_trip() {
        let mut smd = ServiceMap::new();
        smd.set_options(&json!({
            "target": "/foo",
            "id": "/foo",
            "transport": "POST",
            "envelope": "JSON-RPC-2.0",
            "contentType": "application/json-rpc",
            "description": "test service",
            "bogus": 1,
            "services": {
                "foo": {"parameters": [{"type": "int", "name": "a"}], "returns": "string"},
                "bar": {"name": "bar"}
            }
        }))
        .unwrap();

        let mut copy = ServiceMap::new();
        copy.set_options(&smd.to_value()).unwrap();

        assert_eq!(copy.target(), "/foo");
        assert_eq!(copy.id(), "/foo");
        assert_eq!(copy.transport(), "POST");
        assert_eq!(copy.envelope(), Envelope::JsonRpc2);
        assert_eq!(copy.content_type(), "application/json-rpc");
        assert_eq!(copy.description(), "test service");

        let mut names: Vec<_> = copy.services().iter().map(Service::name).collect();
        names.sort();
        assert_eq!(names, vec!["bar", "foo"]);
        assert_eq!(copy.service("foo").unwrap().params().len(), 1);
    }

    #[test]
    fn test_set_options_rejects_non_object() {
        let mut smd = ServiceMap::new();
        assert!(smd.set_options(&json!(["target"])).is_err());
        assert!(smd.set_options(&json!({"envelope": "JSON-RPC-9"})).is_err());
    }
}
