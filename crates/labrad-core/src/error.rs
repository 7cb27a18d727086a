//! Error types for the LabRAD core.
//!
//! Dispatch failures (no overload matched, argument extraction failed) are kept
//! apart from business failures raised by a setting's own code so callers can
//! tell "the setting said no" from "the dispatcher could not route the call".

use crate::data::TaggedValue;
use thiserror::Error;

/// Main error type for the LabRAD core.
#[derive(Debug, Error)]
pub enum LabradError {
    // Dispatch errors
    #[error("No matching overload for setting '{setting}' and value of type {type_tag}")]
    NoMatchingOverload { setting: String, type_tag: String },

    #[error(
        "Failed to unpack {type_tag} for setting '{setting}' (signature {signature}): {reason}"
    )]
    ArgumentUnpack {
        setting: String,
        signature: String,
        type_tag: String,
        reason: String,
    },

    #[error("Unknown setting ID {0}")]
    UnknownSetting(u32),

    /// Failure raised by a setting's implementation. Travels unchanged.
    #[error("Error {code}: {message}")]
    Business {
        code: i32,
        message: String,
        payload: Option<TaggedValue>,
    },

    // Directory errors
    #[error("Unknown server: {name}")]
    UnknownServer { name: String },

    #[error("Unknown setting '{setting}' on server {server}")]
    UnknownSettingName { server: u32, setting: String },

    #[error("Server already registered: {name}")]
    ServerAlreadyRegistered { name: String },

    #[error("Name resolution failed: {message}")]
    Resolution { message: String },

    // Transport errors
    /// Error reported by the peer. `data` holds the encoded business
    /// payload, if the peer sent one.
    #[error("Remote error {code}: {message}")]
    Remote {
        code: i32,
        message: String,
        data: Option<serde_json::Value>,
    },

    #[error("Lost connection to directory at {addr}")]
    InstanceLost { addr: String },

    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Validation errors
    #[error("Validation error for {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Invalid params: {message}")]
    InvalidParams { message: String },

    #[error("{0}")]
    Other(String),
}

/// Result type alias for LabRAD operations.
pub type Result<T> = std::result::Result<T, LabradError>;

impl From<std::io::Error> for LabradError {
    fn from(err: std::io::Error) -> Self {
        LabradError::Io {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for LabradError {
    fn from(err: serde_json::Error) -> Self {
        LabradError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl LabradError {
    /// Create a business failure with a code and message.
    pub fn business(code: i32, message: impl Into<String>) -> Self {
        LabradError::Business {
            code,
            message: message.into(),
            payload: None,
        }
    }

    /// Create a business failure that carries a tagged payload.
    pub fn business_with_payload(code: i32, message: impl Into<String>, payload: TaggedValue) -> Self {
        LabradError::Business {
            code,
            message: message.into(),
            payload: Some(payload),
        }
    }

    /// Business payload carried by this error, decoded from the wire for
    /// remote failures.
    pub fn payload(&self) -> Option<TaggedValue> {
        match self {
            LabradError::Business { payload, .. } => payload.clone(),
            LabradError::Remote {
                data: Some(data), ..
            } => serde_json::from_value(data.clone()).ok(),
            _ => None,
        }
    }

    /// True for failures produced by the dispatch machinery itself rather
    /// than by a setting's implementation.
    pub fn is_dispatch_error(&self) -> bool {
        matches!(
            self,
            LabradError::NoMatchingOverload { .. }
                | LabradError::ArgumentUnpack { .. }
                | LabradError::UnknownSetting(_)
        )
    }

    /// Convert to a JSON-RPC error code.
    ///
    /// Standard codes:
    /// - -32601: Method (setting) not found
    /// - -32602: Invalid params (no overload matched, unpack failed)
    /// - -32603: Internal error
    ///
    /// Application codes:
    /// - -32000: Transport/connectivity error
    /// - -32001: Unknown server
    /// - -32002: Unknown setting name
    /// - -32003: Server already registered
    /// - -32005: Validation error
    ///
    /// Business failures keep their own code.
    pub fn to_rpc_error_code(&self) -> i32 {
        match self {
            LabradError::Business { code, .. } | LabradError::Remote { code, .. } => *code,

            LabradError::UnknownSetting(_) => -32601,

            LabradError::NoMatchingOverload { .. }
            | LabradError::ArgumentUnpack { .. }
            | LabradError::InvalidParams { .. } => -32602,

            LabradError::InstanceLost { .. } | LabradError::Io { .. } => -32000,

            LabradError::UnknownServer { .. } => -32001,

            LabradError::UnknownSettingName { .. } => -32002,

            LabradError::ServerAlreadyRegistered { .. } => -32003,

            LabradError::Validation { .. } => -32005,

            _ => -32603,
        }
    }
}
