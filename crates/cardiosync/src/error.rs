//! Error types for cardiosync.
//!
//! This module defines all error types used throughout the cardiosync crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

use crate::remote::RemoteOperation;

/// The main error type for cardiosync operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Dataset Errors ===
    /// Existing tabular content on disk or in the remote store could not be decoded.
    #[error("malformed dataset at {origin}: {source}")]
    MalformedDataset {
        /// Where the content came from (a path or a remote id).
        origin: String,
        /// The underlying decoder error.
        #[source]
        source: arrow_schema::ArrowError,
    },

    /// The header row of existing content does not match the record schema.
    #[error("column mismatch at {origin}: expected [{expected}], found [{found}]")]
    ColumnMismatch {
        /// Where the content came from.
        origin: String,
        /// Expected column names, comma separated.
        expected: String,
        /// Column names actually found.
        found: String,
    },

    /// Building or encoding an in-memory table failed.
    #[error("dataset encoding failed: {0}")]
    Encode(#[from] arrow_schema::ArrowError),

    // === Remote Errors ===
    /// A remote store operation failed.
    #[error("remote {operation} failed: {message}")]
    Remote {
        /// The operation that failed.
        operation: RemoteOperation,
        /// Description of what went wrong.
        message: String,
    },

    /// An HTTP request to the remote store failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// A credential needed before the operation can run is not configured.
    #[error("missing credential: {name}")]
    MissingCredential {
        /// Configuration key of the missing credential.
        name: String,
    },

    // === Authentication Errors ===
    /// Operator verification rejected the supplied credentials.
    #[error("authentication failed for operator '{operator}'")]
    AuthenticationFailed {
        /// The operator name that was supplied.
        operator: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for cardiosync operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new remote operation error.
    #[must_use]
    pub fn remote(operation: RemoteOperation, message: impl Into<String>) -> Self {
        Self::Remote {
            operation,
            message: message.into(),
        }
    }

    /// Create a malformed dataset error for content from `origin`.
    #[must_use]
    pub fn malformed(origin: impl Into<String>, source: arrow_schema::ArrowError) -> Self {
        Self::MalformedDataset {
            origin: origin.into(),
            source,
        }
    }

    /// Create a missing credential error.
    #[must_use]
    pub fn missing_credential(name: impl Into<String>) -> Self {
        Self::MissingCredential { name: name.into() }
    }

    /// Check if this error came from talking to the remote store.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. } | Self::Http(_))
    }

    /// Check if this error means existing data could not be read back.
    #[must_use]
    pub fn is_malformed_data(&self) -> bool {
        matches!(
            self,
            Self::MalformedDataset { .. } | Self::ColumnMismatch { .. }
        )
    }
}
