//! # Impress Core Storage System Errors
//!
//! Defines [`StorageSystemError`], covering schema validation, opening the
//! local store, schema version conflicts on reopen, and per-record failures
//! raised by table operations.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageSystemError {
    #[error("I/O error during operation '{operation}' on path '{path}': {source}")]
    Io {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to open store at '{path}': {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Invalid schema{}: {reason}", .table.as_ref().map(|t| format!(" for table '{t}'")).unwrap_or_default())]
    InvalidSchema { table: Option<String>, reason: String },

    #[error("Schema of store '{store}' conflicts with the stored version {version}: {reason}")]
    SchemaConflict {
        store: String,
        version: u32,
        reason: String,
    },

    #[error("Store '{store}' is at version {stored}, newer than the declared version {declared}")]
    VersionDowngrade {
        store: String,
        stored: u32,
        declared: u32,
    },

    #[error("Table '{0}' is not declared in the store schema")]
    TableNotFound(String),

    #[error("Field '{field}' of table '{table}' is not indexed")]
    NotIndexed { table: String, field: String },

    #[error("Invalid key for table '{table}': {reason}")]
    InvalidKey { table: String, reason: String },

    #[error("A record with key {key} already exists in table '{table}'")]
    KeyExists { table: String, key: String },

    #[error("Record for table '{table}' must be a JSON object")]
    InvalidRecord { table: String },

    #[error("Serialization to '{format}' failed: {source}")]
    SerializationError {
        format: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("Deserialization from '{format}' failed: {source}")]
    DeserializationError {
        format: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("Storage operation '{operation}' failed: {source}")]
    Engine {
        operation: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Failed to acquire the store connection during '{0}'")]
    LockPoisoned(String),
}

impl StorageSystemError {
    pub fn io(source: std::io::Error, operation: impl Into<String>, path: PathBuf) -> Self {
        StorageSystemError::Io {
            source,
            operation: operation.into(),
            path,
        }
    }

    pub fn engine(source: rusqlite::Error, operation: impl Into<String>) -> Self {
        StorageSystemError::Engine {
            operation: operation.into(),
            source,
        }
    }
}
