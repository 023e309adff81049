//! Recoverable error types for the marshaling layer
//!
//! This module defines [`MarshalError`], covering the failures a caller is
//! expected to handle: value conversion problems while building a block, and
//! failures reported by the engine through its error handle.
//!
//! Programming errors (access after close, a typed accessor used on a field of
//! another kind, an out-of-bounds read) are not represented here. They panic
//! with the offending index and the expected vs actual kind or size.

use thiserror::Error;

/// Errors surfaced by descriptor construction, the value builder and the engine adapter
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarshalError {
    /// A type descriptor could not be constructed
    #[error("Invalid type: {message}")]
    InvalidType { message: String },

    /// A value at the given position cannot be encoded
    #[error("Unsupported value[{index}]: {kind}")]
    UnsupportedValue { index: usize, kind: String },

    /// Elements of one vector do not share a single type
    #[error("Type mismatch at element {index}: expected {expected}, got {got}")]
    TypeMismatch {
        index: usize,
        expected: String,
        got: String,
    },

    /// A size or element width argument is zero or inconsistent
    #[error("Invalid {what}: {size}")]
    InvalidSize { what: &'static str, size: usize },

    /// The native allocator refused a request
    #[error("Out of memory: requested {requested} bytes")]
    OutOfMemory { requested: usize },

    /// Text cannot be passed across the C boundary (interior NUL)
    #[error("Invalid string: {message}")]
    InvalidString { message: String },

    /// Unknown engine log level name
    #[error("Invalid log level '{level}'")]
    InvalidLogLevel { level: String },

    /// The engine reported a non-zero error code
    #[error("{message} (code {code})")]
    Engine { code: i32, message: String },
}

impl MarshalError {
    /// Engine error code, if this error came from the engine
    pub fn code(&self) -> Option<i32> {
        match self {
            MarshalError::Engine { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub(crate) fn invalid_type(message: impl Into<String>) -> Self {
        MarshalError::InvalidType {
            message: message.into(),
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, MarshalError>;
