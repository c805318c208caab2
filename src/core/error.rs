//! Typed error handling for the invoice ledger
//!
//! Every operation in the crate returns a [`LedgerError`] rather than a
//! generic `anyhow::Error`, so callers can match on the failure they care
//! about (a missing record, a lost compare-and-swap race, a bad argument).
//!
//! # Error Categories
//!
//! - [`LedgerError`]: errors surfaced by the record service and dispatcher
//! - [`StoreError`]: errors raised by a [`StateStore`](crate::core::store::StateStore) backend
//!
//! # Example
//!
//! ```rust,ignore
//! match dispatcher.dispatch("markGoodsReceived", &["INV-7", "Yes"]).await {
//!     Ok(_) => {}
//!     Err(LedgerError::RecordNotFound { key, .. }) => eprintln!("no invoice {key}"),
//!     Err(e) if e.is_conflict() => eprintln!("concurrent update, try again"),
//!     Err(e) => eprintln!("{}: {}", e.error_code(), e),
//! }
//! ```

use crate::core::store::Version;
use crate::dispatch::Arity;
use serde::Serialize;
use thiserror::Error;

/// Result alias used across the crate
pub type LedgerResult<T> = Result<T, LedgerError>;

/// The main error type for the invoice ledger
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Wrong number of positional arguments for an operation
    #[error("Incorrect number of arguments for '{operation}': expected {expected}, got {actual}")]
    Arity {
        operation: String,
        expected: Arity,
        actual: usize,
    },

    /// Stored or supplied bytes do not match the document schema
    #[error("Malformed {document_type} record{}: {message}", key_suffix(.key))]
    MalformedRecord {
        document_type: String,
        key: Option<String>,
        message: String,
    },

    /// The dispatcher has no operation registered under this name
    #[error("Unknown operation: {name}")]
    UnknownOperation { name: String },

    /// No record is stored at the key
    #[error("{document_type} '{key}' not found")]
    RecordNotFound { document_type: String, key: String },

    /// A record is already stored at the key
    #[error("{document_type} '{key}' already exists")]
    RecordAlreadyExists { document_type: String, key: String },

    /// A positional argument could not be interpreted
    #[error("Invalid argument '{argument}': {message}")]
    InvalidArgument { argument: String, message: String },

    /// A field-level update named an unknown or immutable field, or the wrong type
    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    /// Configuration could not be loaded or is inconsistent
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Failure reported by the state store
    #[error(transparent)]
    Store(#[from] StoreError),
}

fn key_suffix(key: &Option<String>) -> String {
    key.as_ref()
        .map(|k| format!(" at '{}'", k))
        .unwrap_or_default()
}

/// Error response structure, suitable for returning to a remote caller
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl LedgerError {
    /// Build a malformed-record error from a decoder message
    pub fn malformed(document_type: impl Into<String>, message: impl Into<String>) -> Self {
        LedgerError::MalformedRecord {
            document_type: document_type.into(),
            key: None,
            message: message.into(),
        }
    }

    /// Attach the storage key to a malformed-record error
    ///
    /// Other variants are returned unchanged.
    pub fn at_key(self, at: &str) -> Self {
        match self {
            LedgerError::MalformedRecord {
                document_type,
                key: None,
                message,
            } => LedgerError::MalformedRecord {
                document_type,
                key: Some(at.to_string()),
                message,
            },
            other => other,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            LedgerError::Arity { .. } => "ARITY_ERROR",
            LedgerError::MalformedRecord { .. } => "MALFORMED_RECORD",
            LedgerError::UnknownOperation { .. } => "UNKNOWN_OPERATION",
            LedgerError::RecordNotFound { .. } => "RECORD_NOT_FOUND",
            LedgerError::RecordAlreadyExists { .. } => "RECORD_ALREADY_EXISTS",
            LedgerError::InvalidArgument { .. } => "INVALID_ARGUMENT",
            LedgerError::InvalidField { .. } => "INVALID_FIELD",
            LedgerError::Config { .. } => "CONFIG_ERROR",
            LedgerError::Store(e) => e.error_code(),
        }
    }

    /// True when the failure was a lost compare-and-swap race
    pub fn is_conflict(&self) -> bool {
        matches!(self, LedgerError::Store(StoreError::VersionConflict { .. }))
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
        }
    }
}

/// Errors related to state store backends
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend itself failed (I/O, lock poisoning, task join)
    #[error("{backend} backend error: {message}")]
    Backend {
        backend: &'static str,
        message: String,
    },

    /// A compare-and-swap put found a different version than expected
    #[error(
        "Version conflict on '{key}': expected {}, found {}",
        describe_version(.expected),
        describe_version(.actual)
    )]
    VersionConflict {
        key: String,
        expected: Option<Version>,
        actual: Option<Version>,
    },

    /// Stored bytes do not carry a valid version frame
    #[error("Corrupted entry at '{key}': {message}")]
    Corrupted { key: String, message: String },
}

fn describe_version(version: &Option<Version>) -> String {
    match version {
        Some(v) => format!("version {}", v),
        None => "no entry".to_string(),
    }
}

impl StoreError {
    /// Build a backend error from any displayable failure
    pub fn backend(backend: &'static str, err: impl std::fmt::Display) -> Self {
        StoreError::Backend {
            backend,
            message: err.to_string(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            StoreError::Backend { .. } => "STORE_ERROR",
            StoreError::VersionConflict { .. } => "VERSION_CONFLICT",
            StoreError::Corrupted { .. } => "STORE_CORRUPTED",
        }
    }
}
