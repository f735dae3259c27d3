//! Error types for nrts-seed.
//!
//! This module defines all error types used throughout the crate, separating
//! store reachability failures from write failures so the initialization
//! harness can tell them apart.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for nrts-seed operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Store Errors ===
    /// The document store could not be reached.
    #[error("document store '{store}' is unavailable: {message}")]
    StoreUnavailable {
        /// Name of the store backend.
        store: &'static str,
        /// Description of what went wrong.
        message: String,
    },

    /// An insert failed for a reason other than a duplicate identifier.
    #[error("write to collection '{collection}' failed: {message}")]
    WriteFailure {
        /// Collection the write targeted.
        collection: String,
        /// Description of what went wrong.
        message: String,
    },

    /// A document with the same identifier already exists.
    #[error("document '{id}' already exists in collection '{collection}'")]
    DuplicateKeyConflict {
        /// Collection the write targeted.
        collection: String,
        /// Identifier that collided.
        id: String,
    },

    /// A stored document could not be decoded into a record.
    #[error("stored document '{id}' is malformed: {message}")]
    MalformedDocument {
        /// Identifier of the offending document.
        id: String,
        /// Description of the decoding failure.
        message: String,
    },

    /// An embedded `SQLite` query failed.
    #[error("database query failed: {0}")]
    Database(#[from] rusqlite::Error),

    /// The database file was written with an unsupported layout.
    #[error("unsupported database layout: {message}")]
    UnsupportedSchema {
        /// Description of what went wrong.
        message: String,
    },

    // === Record Errors ===
    /// The seed record failed validation.
    #[error("invalid seed record: {message}")]
    InvalidRecord {
        /// Description of the validation failure.
        message: String,
    },

    /// A record identifier is not a 24-character hex object id.
    #[error("invalid record id '{0}': expected 24 hexadecimal characters")]
    InvalidRecordId(String),

    /// Failed to read a seed record file.
    #[error("failed to read seed record from {path}: {source}")]
    RecordFile {
        /// Path of the record file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

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

/// A specialized Result type for nrts-seed operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a store unavailable error.
    #[must_use]
    pub fn store_unavailable(store: &'static str, message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            store,
            message: message.into(),
        }
    }

    /// Create a write failure error.
    #[must_use]
    pub fn write_failure(collection: impl Into<String>, message: impl Into<String>) -> Self {
        Self::WriteFailure {
            collection: collection.into(),
            message: message.into(),
        }
    }

    /// Create a duplicate key conflict error.
    #[must_use]
    pub fn duplicate_key(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::DuplicateKeyConflict {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Create an invalid record error.
    #[must_use]
    pub fn invalid_record(message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            message: message.into(),
        }
    }

    /// Check if this error means the store could not be reached.
    #[must_use]
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, Self::StoreUnavailable { .. })
    }

    /// Check if this error is a duplicate identifier conflict.
    #[must_use]
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::DuplicateKeyConflict { .. })
    }
}
