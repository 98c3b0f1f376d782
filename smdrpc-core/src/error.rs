//! Error types for smdrpc
//!
//! Two kinds of error live here:
//!
//! - **Fault**: the JSON-RPC error object `{code, message, data}` as it travels
//!   on the wire, shared by the 1.0 and 2.0 envelopes
//! - **Error**: crate-level failures (registration mistakes, transport problems,
//!   remote faults surfaced on the client) built with thiserror
//!
//! # Fault codes
//!
//! - `-32700`: Parse error
//! - `-32600`: Invalid Request
//! - `-32601`: Method not found
//! - `-32602`: Invalid params
//! - `-32603`: Internal error
//! - `-32000`: Server/application error, also the default code
//!
//! # Examples
//!
//! ```rust
//! use smdrpc_core::Fault;
//!
//! let fault = Fault::new("Method not found", Fault::INVALID_METHOD, None);
//! assert_eq!(fault.to_string(), "[-32601] Method not found");
//!
//! // A zero code is never stored
//! let fault = Fault::new("boom", 0, None);
//! assert_eq!(fault.code(), Fault::OTHER);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Result type for smdrpc operations
pub type Result<T> = std::result::Result<T, Error>;

/// Crate-level error type
///
/// Server-side request handling never returns these; every per-request
/// failure is turned into a [`Fault`] on the response. They surface at
/// registration time (bad names, duplicate services) and on the client.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// A JSON-RPC fault, either raised by a handler or returned by a remote peer
    #[error("JSON-RPC fault: {0}")]
    Fault(#[from] Fault),

    /// The transport answered with a non-success HTTP status
    #[error("HTTP error {status}: {reason}")]
    Http {
        /// Status code of the failed exchange
        status: u16,
        /// Reason phrase for the status
        reason: String,
    },

    /// The transport could not complete the exchange at all
    #[error("Transport error: {0}")]
    Transport(String),

    /// A response body that is not a JSON-RPC response object
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Serialization or deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Rejected value while building a request, service or service map
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A service with the same name is already attached to the service map
    #[error("Service already registered: {0}")]
    DuplicateService(String),

    /// Arguments could not be converted to what a handler expects
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// Unexpected failure inside a handler
    #[error("Internal error: {0}")]
    Internal(String),

    /// Input/output error
    #[error("IO error: {0}")]
    Io(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<Error> for Fault {
    /// Convert a handler error into the fault reported to the caller
    ///
    /// Faults pass through untouched, so a handler keeps control over the
    /// code, message and data it reports. Everything else maps onto the
    /// closest standard code, falling back to `OTHER`.
    fn from(err: Error) -> Self {
        match err {
            Error::Fault(fault) => fault,
            Error::InvalidParams(msg) => Fault::new(msg, Fault::INVALID_PARAMS, None),
            Error::Internal(msg) => Fault::new(msg, Fault::INTERNAL, None),
            other => Fault::new(other.to_string(), Fault::OTHER, None),
        }
    }
}

/// JSON-RPC error object
///
/// The code is never zero: a zero code, whether passed to [`Fault::new`],
/// [`Fault::set_code`] or decoded from the wire, becomes [`Fault::OTHER`].
/// Serialization always writes all three members, `data` as `null` when
/// there is none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "FaultRepr")]
pub struct Fault {
    code: i32,
    message: String,
    data: Option<Value>,
}

#[derive(Deserialize)]
struct FaultRepr {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

impl From<FaultRepr> for Fault {
    fn from(repr: FaultRepr) -> Self {
        Fault::new(repr.message, repr.code, repr.data)
    }
}

impl Default for Fault {
    fn default() -> Self {
        Self::new("", Self::OTHER, None)
    }
}

impl Fault {
    /// Invalid JSON was received
    pub const PARSE: i32 = -32700;
    /// The JSON is not a valid request object
    pub const INVALID_REQUEST: i32 = -32600;
    /// The method does not exist
    pub const INVALID_METHOD: i32 = -32601;
    /// Invalid method parameters
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal JSON-RPC error
    pub const INTERNAL: i32 = -32603;
    /// Application error, used whenever no better code is known
    pub const OTHER: i32 = -32000;

    /// Create a fault
    ///
    /// # Arguments
    ///
    /// * `message` - Human-readable description
    /// * `code` - Any integer; 0 is replaced with [`Fault::OTHER`]
    /// * `data` - Optional structured detail
    pub fn new(message: impl Into<String>, code: i32, data: Option<Value>) -> Self {
        let mut fault = Self {
            code: Self::OTHER,
            message: message.into(),
            data,
        };
        fault.set_code(code);
        fault
    }

    /// `-32700 Parse error`
    pub fn parse_error() -> Self {
        Self::new("Parse error", Self::PARSE, None)
    }

    /// `-32600 Invalid Request`
    pub fn invalid_request() -> Self {
        Self::new("Invalid Request", Self::INVALID_REQUEST, None)
    }

    /// `-32601 Method not found`
    pub fn method_not_found() -> Self {
        Self::new("Method not found", Self::INVALID_METHOD, None)
    }

    /// `-32602 Invalid params`
    pub fn invalid_params() -> Self {
        Self::new("Invalid params", Self::INVALID_PARAMS, None)
    }

    /// `-32603` with a custom message
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(message, Self::INTERNAL, None)
    }

    /// Application error (`-32000`) with a custom message
    pub fn other(message: impl Into<String>) -> Self {
        Self::new(message, Self::OTHER, None)
    }

    pub fn code(&self) -> i32 {
        self.code
    }

    /// Set the code, normalizing 0 to [`Fault::OTHER`]
    pub fn set_code(&mut self, code: i32) -> &mut Self {
        self.code = if code == 0 { Self::OTHER } else { code };
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn set_message(&mut self, message: impl Into<String>) -> &mut Self {
        self.message = message.into();
        self
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn set_data(&mut self, data: Option<Value>) -> &mut Self {
        self.data = data;
        self
    }

    /// Wire representation: `{"code": .., "message": .., "data": ..}`
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "code": self.code,
            "message": self.message,
            "data": self.data.clone().unwrap_or(Value::Null),
        })
    }

    pub fn to_json(&self) -> String {
        self.to_value().to_string()
    }
}

impl std::fmt::Display for Fault {
    /// Formats as "[code] message", e.g. "[-32601] Method not found"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for Fault {}
