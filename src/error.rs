//! Error types for the ATWS client.
//!
//! Transport and structural failures abort a fetch and surface as
//! [`AtwsError`]. Single-field parse failures are not errors: they are
//! collected as [`FieldParseError`] warnings next to the decoded records.

use serde::Serialize;
use thiserror::Error;

use crate::kind::RecordKind;

/// Validation errors raised while building a query document.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The entity kind was blank.
    #[error("Entity kind cannot be empty")]
    EmptyEntityKind,
}

/// Errors loading client configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Required environment variable '{name}' is not set")]
    MissingVar {
        /// Variable name.
        name: String,
    },
}

/// Transport errors for the HTTP round trip.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be sent or the response could not be read.
    #[error("Connection failed: {message}")]
    ConnectionFailed {
        /// Underlying client error text.
        message: String,
    },

    /// Credentials were rejected (401 or 403).
    #[error("Authentication rejected (HTTP {status})")]
    Unauthorized {
        /// HTTP status code.
        status: u16,
    },

    /// Any other non-200 status.
    #[error("HTTP request failed with status {status}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
    },
}

/// The response envelope did not carry a result node.
#[derive(Debug, Error)]
pub enum ResponseError {
    /// No `<EntityResults>` node was found.
    #[error("Malformed response: {reason}")]
    MalformedResponse {
        /// What was wrong, including any server fault text.
        reason: String,
    },
}

/// Structural errors decoding an extracted result fragment.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The fragment is not well-formed.
    #[error("Invalid XML: {message}")]
    Xml {
        /// Parser message.
        message: String,
    },

    /// The fragment root is not `<EntityResults>`.
    #[error("Expected <EntityResults> root, found <{found}>")]
    UnexpectedRoot {
        /// Local name of the root found.
        found: String,
    },

    /// Input ended inside the root element.
    #[error("Result fragment ended before the root element was closed")]
    UnexpectedEof,
}

/// A single field that could not be parsed.
///
/// The field keeps its default value and the record is still returned.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{kind} record #{record_index}: cannot parse <{element}> value '{value}': {reason}")]
pub struct FieldParseError {
    /// Kind of the record being decoded.
    pub kind: RecordKind,
    /// Position of the record within the result set.
    pub record_index: usize,
    /// Wire element name.
    pub element: String,
    /// Raw element text.
    pub value: String,
    /// Parser message.
    pub reason: String,
}

/// An auxiliary lookup fetch that failed while the main fetch succeeded.
///
/// Fields derived from the lookup stay empty; this entry tells the caller
/// why, so a rejected or unreachable lookup is not mistaken for a miss.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{kind} lookup failed: {message}")]
pub struct LookupFailure {
    /// Kind that was being fetched.
    pub kind: RecordKind,
    /// Display text of the underlying error.
    pub message: String,
    /// Whether the underlying error was a transport error.
    pub transport: bool,
    /// Whether retrying the lookup could succeed.
    pub retryable: bool,
}

impl LookupFailure {
    /// Records a failed lookup of `kind`.
    #[must_use]
    pub fn new(kind: RecordKind, error: &AtwsError) -> Self {
        Self {
            kind,
            message: error.to_string(),
            transport: error.is_transport(),
            retryable: error.is_retryable(),
        }
    }
}

/// Top-level error type for the client.
#[derive(Debug, Error)]
pub enum AtwsError {
    /// Query document validation failed.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The round trip failed.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The response carried no result node.
    #[error(transparent)]
    Response(#[from] ResponseError),

    /// The result fragment was structurally invalid.
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Unexpected internal failure.
    #[error("Internal error: {message}")]
    Internal {
        /// Description.
        message: String,
    },
}

impl AtwsError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Shorthand for a [`ResponseError::MalformedResponse`].
    #[must_use]
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Response(ResponseError::MalformedResponse {
            reason: reason.into(),
        })
    }

    /// Returns true if this is a transport error.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns true if the server answered without a result node.
    #[must_use]
    pub const fn is_malformed_response(&self) -> bool {
        matches!(self, Self::Response(ResponseError::MalformedResponse { .. }))
    }

    /// Returns true if this is a decode error.
    #[must_use]
    pub const fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(e) => match e {
                TransportError::ConnectionFailed { .. } => true,
                TransportError::HttpStatus { status } => *status >= 500,
                TransportError::Unauthorized { .. } => false,
            },
            Self::Validation(_)
            | Self::Config(_)
            | Self::Response(_)
            | Self::Decode(_)
            | Self::Internal { .. } => false,
        }
    }
}

/// Result type alias for client operations.
pub type AtwsResult<T> = Result<T, AtwsError>;
