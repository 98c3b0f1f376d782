//! Thin JSON encoding/decoding layer
//!
//! Envelopes decode in two steps: the text is parsed into a generic
//! `serde_json::Value` here, and the envelope types then pick the members
//! they understand from the resulting object. Keeping the first step in one
//! place gives every caller the same error mapping:
//!
//! - malformed JSON → `Error::Fault` carrying a `-32700 Parse error`
//! - valid JSON that is not an object where one is required →
//!   `Error::InvalidResponse` (responses) or an empty envelope (requests)
//!
//! # Examples
//!
//! ```rust
//! use smdrpc_core::codec;
//!
//! let map = codec::decode_object(r#"{"id": 1, "result": true}"#).unwrap();
//! assert_eq!(map["result"], serde_json::json!(true));
//!
//! assert!(codec::decode_object("3").is_err());
//! assert!(codec::decode("{oops").is_err());
//! ```

use crate::error::{Error, Fault, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// Encode any serializable value to a JSON string
pub fn encode<T: Serialize>(msg: &T) -> Result<String> {
    serde_json::to_string(msg).map_err(|e| Error::Serialization(e.to_string()))
}

/// Decode text into a generic JSON value
///
/// # Errors
///
/// `Error::Fault` with a parse-error fault when the text is not JSON.
pub fn decode(data: &str) -> Result<Value> {
    serde_json::from_str(data).map_err(|_| Error::Fault(Fault::parse_error()))
}

/// Decode text that must hold a JSON object
///
/// Scalars and arrays at the top level (`true`, `3`, `"invalid"`, `[]`) are
/// rejected, as is the empty string.
pub fn decode_object(data: &str) -> Result<Map<String, Value>> {
    match decode(data)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::InvalidResponse(format!(
            "expected a JSON object, got {}",
            kind_of(&other)
        ))),
    }
}

/// Decode text straight into a typed value
pub fn decode_as<T: DeserializeOwned>(data: &str) -> Result<T> {
    serde_json::from_str(data).map_err(|e| Error::Serialization(e.to_string()))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_invalid_json_is_parse_fault() {
        match decode("{\"method\": ") {
            Err(Error::Fault(fault)) => assert_eq!(fault.code(), Fault::PARSE),
            other => panic!("expected parse fault, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_empty_string() {
        assert!(decode("").is_err());
        assert!(decode_object("").is_err());
    }

    #[test]
    fn test_decode_object_rejects_scalars() {
        for text in ["true", "null", "3", "\"invalid\"", "[1, 2]"] {
            assert!(
                matches!(decode_object(text), Err(Error::InvalidResponse(_))),
                "{} should be rejected",
                text
            );
        }
    }

    #[test]
    fn test_decode_object() {
        let map = decode_object(r#"{"a": [1, 2], "b": null}"#).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["a"], json!([1, 2]));
    }

    #[test]
    fn test_encode_and_decode_as() {
        let json = encode(&json!({"x": 1})).unwrap();
        assert_eq!(json, r#"{"x":1}"#);
        let back: Map<String, Value> = decode_as(&json).unwrap();
        assert_eq!(back["x"], json!(1));
    }
}
