//! Helpers called by code the `smdrpc-macros` attributes generate

pub use serde_json;
pub use smdrpc_core::{Error, Result};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Decode one bound argument; a missing value decodes from `null`
pub fn arg<T: DeserializeOwned>(value: Option<Value>, name: &str) -> Result<T> {
    serde_json::from_value(value.unwrap_or(Value::Null))
        .map_err(|e| Error::InvalidParams(format!("{}: {}", name, e)))
}

/// Serialize a plain return value
pub fn into_value<T: Serialize>(value: T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| Error::Serialization(e.to_string()))
}

/// Serialize a fallible return value, forwarding the error
pub fn from_result<T, E>(result: std::result::Result<T, E>) -> Result<Value>
where
    T: Serialize,
    E: Into<Error>,
{
    into_value(result.map_err(Into::into)?)
}
