//! Domain models and types for Cartage.
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`DatasetName`], [`TableName`])
//! - **Dataset descriptors and records** ([`DatasetDescriptor`],
//!   [`CustomerRecord`], [`OrderRecord`], [`JoinedRecord`])
//! - **Run context and state machine** ([`RunContext`], [`RunState`])
//! - **Error types** ([`PipelineError`], [`SourceError`], [`StoreError`])
//! - **Result type alias** ([`Result`])
//!
//! Identifiers use the newtype pattern so a dataset name can never stand
//! in for a table name, and table names are validated before they reach
//! DDL rendering.

pub mod dataset;
pub mod errors;
pub mod ids;
pub mod result;
pub mod run;

// Re-export commonly used types for convenience
pub use dataset::{
    ColumnSpec, CustomerRecord, DatasetDescriptor, JoinedRecord, OrderRecord, TableSpec,
    JOINED_CSV_HEADER,
};
pub use errors::{PipelineError, SourceError, StoreError};
pub use ids::{DatasetName, TableName};
pub use result::Result;
pub use run::{Milestone, MetricsSnapshot, RunContext, RunMetrics, RunState};
