//! Domain error types
//!
//! This module defines the error hierarchy for Cartage. All errors are
//! domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main Cartage error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Source transfer errors (Extract stage)
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Relational store errors (Load/Join stages)
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Task graph construction or execution errors
    #[error("Graph error: {0}")]
    Graph(String),

    /// Staging directory file-operation errors
    #[error("Staging error: {0}")]
    Staging(String),

    /// Export process errors
    #[error("Export error: {0}")]
    Export(String),

    /// Run state machine violations
    #[error("Run state error: {0}")]
    RunState(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Source-transfer errors
///
/// Errors that occur while fetching a source file into the staging
/// directory. These errors don't expose the HTTP client's types.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Failed to reach the source host
    #[error("Failed to connect to source: {0}")]
    ConnectionFailed(String),

    /// Source returned a non-success status
    #[error("Source returned HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    /// Request timed out
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Source locator is not a valid URL
    #[error("Invalid source URL: {0}")]
    InvalidUrl(String),

    /// Failed writing the fetched body to the staging path
    #[error("Failed to write staged file: {0}")]
    StagingWrite(String),
}

/// Relational-store errors
///
/// Errors raised by the store adapters (connection pooling, DDL, bulk
/// load, cross-store linkage). These errors don't expose driver types.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to connect to the store
    #[error("Failed to connect to store: {0}")]
    ConnectionFailed(String),

    /// Failed to obtain a pooled connection
    #[error("Connection pool error: {0}")]
    Pool(String),

    /// DDL statement failed
    #[error("DDL failed: {0}")]
    DdlFailed(String),

    /// Bulk load (COPY) failed
    #[error("Bulk load failed: {0}")]
    CopyFailed(String),

    /// Primary-key uniqueness rejected a row
    #[error("Duplicate key in table {table}: {detail}")]
    DuplicateKey { table: String, detail: String },

    /// Query failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Cross-store linkage (foreign table / user mapping) failed
    #[error("Linkage failed: {0}")]
    LinkageFailed(String),

    /// Transaction could not be started or committed
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for PipelineError {
    fn from(err: toml::de::Error) -> Self {
        PipelineError::Configuration(format!("TOML parse error: {err}"))
    }
}
