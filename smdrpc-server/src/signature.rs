//! Declared shape of a registered method
//!
//! A [`MethodSignature`] plays the role reflection plays in dynamic
//! languages: it names the method, lists its parameters in call order with
//! their types, optionality and defaults, and states what it returns. The
//! dispatcher binds incoming params against it, and [`MethodSignature::to_service`]
//! derives the SMD entry published for discovery.
//!
//! ```rust
//! use smdrpc_server::{MethodSignature, ParamSignature};
//! use serde_json::json;
//!
//! let signature = MethodSignature::new("bar")
//!     .description("Bar method")
//!     .param(ParamSignature::new("one", "boolean"))
//!     .param(ParamSignature::new("two", "string").with_default(json!("two")))
//!     .param(ParamSignature::new("three", "any").optional())
//!     .returns("array");
//!
//! let service = signature.to_service().unwrap();
//! assert_eq!(service.params().len(), 3);
//! ```

use serde_json::Value;
use smdrpc_core::smd::normalize_type;
use smdrpc_core::{Error, Result, Service, ServiceParam, TypeSpec};
use std::collections::HashSet;

/// Type used when a parameter declares none
const ANY_TYPE: &str = "any";
/// Return type used when none is declared
const VOID_TYPE: &str = "void";

/// One declared parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSignature {
    name: String,
    types: Vec<String>,
    optional: bool,
    default: Option<Value>,
    description: String,
}

impl ParamSignature {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            types: vec![type_name.into()],
            optional: false,
            default: None,
            description: String::new(),
        }
    }

    /// Accept an additional type, published as a union
    pub fn or_type(mut self, type_name: impl Into<String>) -> Self {
        self.types.push(type_name.into());
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Default used when the caller omits the parameter; implies optional
    pub fn with_default(mut self, default: Value) -> Self {
        self.optional = true;
        self.default = Some(default);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn types(&self) -> &[String] {
        &self.types
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    fn to_service_param(&self) -> ServiceParam {
        let types = TypeSpec::from_names(self.types.iter().map(|t| normalize_type(t)))
            .unwrap_or_else(|| TypeSpec::from(ANY_TYPE));

        let mut param = ServiceParam::new(types)
            .with_name(self.name.clone())
            .with_optional(self.optional);
        if let Some(default) = self.default.as_ref().filter(|d| !d.is_null()) {
            param = param.with_default(default.clone());
        }
        if !self.description.is_empty() {
            param = param.with_description(self.description.clone());
        }
        param
    }
}

/// Name, parameters and return type of a callable
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MethodSignature {
    name: String,
    description: String,
    params: Vec<ParamSignature>,
    returns: Vec<String>,
}

impl MethodSignature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Append a parameter; call order follows declaration order
    pub fn param(mut self, param: ParamSignature) -> Self {
        self.params.push(param);
        self
    }

    /// Add a return type; several calls publish a union
    pub fn returns(mut self, type_name: impl Into<String>) -> Self {
        self.returns.push(type_name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description_text(&self) -> &str {
        &self.description
    }

    pub fn params(&self) -> &[ParamSignature] {
        &self.params
    }

    pub fn return_types(&self) -> &[String] {
        &self.returns
    }

    /// Check the name and the parameter list
    ///
    /// # Errors
    ///
    /// `Error::InvalidArgument` for an invalid or reserved method name, an
    /// empty parameter name, or a parameter name used twice.
    pub fn validate(&self) -> Result<()> {
        if !Service::is_valid_name(&self.name) {
            return Err(Error::InvalidArgument(format!(
                "Invalid method name '{}'",
                self.name
            )));
        }

        let mut seen = HashSet::new();
        for param in &self.params {
            if param.name.is_empty() {
                return Err(Error::InvalidArgument(format!(
                    "Method '{}' declares a parameter without a name",
                    self.name
                )));
            }
            if !seen.insert(param.name.as_str()) {
                return Err(Error::InvalidArgument(format!(
                    "Method '{}' declares parameter '{}' twice",
                    self.name, param.name
                )));
            }
        }
        Ok(())
    }

    /// Derive the SMD entry describing this method
    ///
    /// Every parameter records `optional`; defaults are recorded only when
    /// non-null and descriptions only when non-empty. Without declared
    /// return types the service returns `null`.
    ///
    /// # Errors
    ///
    /// Anything [`MethodSignature::validate`] rejects, and parameter types
    /// that normalize to `null`.
    pub fn to_service(&self) -> Result<Service> {
        self.validate()?;

        let mut service = Service::new(self.name.clone())?;
        for param in &self.params {
            service.add_param(param.to_service_param(), None)?;
        }

        let returns = TypeSpec::from_names(self.returns.iter().map(|t| normalize_type(t)))
            .unwrap_or_else(|| TypeSpec::from(VOID_TYPE));
        service.set_return(returns)?;

        Ok(service)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bar() -> MethodSignature {
        MethodSignature::new("bar")
            .param(ParamSignature::new("one", "bool"))
            .param(ParamSignature::new("two", "string").with_default(json!("two")))
            .param(ParamSignature::new("three", "mixed").optional())
            .returns("array")
    }

    #[test]
    fn test_to_service_params() {
        let service = bar().to_service().unwrap();
        assert_eq!(service.name(), "bar");

        let params = service.params();
        assert_eq!(params.len(), 3);
        assert_eq!(params[0].name(), Some("one"));
        assert_eq!(params[0].types(), &TypeSpec::from("boolean"));
        assert!(!params[0].is_optional());
        assert_eq!(params[1].default_value(), Some(&json!("two")));
        assert!(params[1].is_optional());
        assert_eq!(params[2].types(), &TypeSpec::from("any"));
        assert!(params[2].is_optional());
        assert!(params[2].default_value().is_none());
        assert_eq!(service.returns(), Some(&TypeSpec::from("array")));
    }

    #[test]
    fn test_null_default_not_recorded() {
        let service = MethodSignature::new("m")
            .param(ParamSignature::new("a", "string").with_default(Value::Null))
            .to_service()
            .unwrap();
        let params = service.params();
        assert!(params[0].is_optional());
        assert!(params[0].default_value().is_none());
    }

    #[test]
    fn test_missing_return_is_null() {
        let service = MethodSignature::new("ping").to_service().unwrap();
        assert_eq!(service.returns(), Some(&TypeSpec::from("null")));
    }

    #[test]
    fn test_union_types_deduplicated() {
        let service = MethodSignature::new("m")
            .param(ParamSignature::new("a", "int").or_type("integer").or_type("string"))
            .returns("string")
            .returns("str")
            .returns("null")
            .to_service()
            .unwrap();
        assert_eq!(
            service.params()[0].types(),
            &TypeSpec::Union(vec!["integer".into(), "string".into()])
        );
        assert_eq!(
            service.returns(),
            Some(&TypeSpec::Union(vec!["string".into(), "null".into()]))
        );
    }

    #[test]
    fn test_description_kept_only_when_set() {
        let service = MethodSignature::new("m")
            .param(ParamSignature::new("a", "string").with_description("first"))
            .param(ParamSignature::new("b", "string"))
            .to_service()
            .unwrap();
        let params = service.params();
        assert_eq!(params[0].description(), Some("first"));
        assert!(params[1].description().is_none());
    }

    #[test]
    fn test_validate_rejects_bad_names() {
        assert!(MethodSignature::new("rpc.hidden").validate().is_err());
        assert!(MethodSignature::new("1abc").validate().is_err());
        assert!(MethodSignature::new("").validate().is_err());
        assert!(MethodSignature::new("ns.method").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_duplicate_params() {
        let signature = MethodSignature::new("m")
            .param(ParamSignature::new("a", "int"))
            .param(ParamSignature::new("a", "string"));
        assert!(matches!(signature.validate(), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_null_param_type_rejected() {
        let signature = MethodSignature::new("m").param(ParamSignature::new("a", "void"));
        assert!(signature.to_service().is_err());
    }
}
