//! Store abstraction traits
//!
//! This module defines the capability seams between the task graph and
//! the relational stores. The graph never assumes a concrete store
//! mechanism: Load depends on a [`BulkLoader`], Join on a
//! [`JoinProvider`], Export on a [`JoinedSource`]. The postgres adapter
//! provides the production implementations; tests substitute in-memory
//! fakes.

use crate::domain::dataset::JoinedRecord;
use crate::domain::ids::TableName;
use crate::domain::result::Result;
use async_trait::async_trait;
use std::path::Path;

/// Reference to a materialized table produced by a join provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    /// Table name inside the store that owns the materialization
    pub table: TableName,
}

impl TableRef {
    pub fn new(table: TableName) -> Self {
        Self { table }
    }
}

/// Capability: bulk-load one staged CSV file into one table
///
/// One instance per dataset; the instance owns its table identity and
/// target store.
#[async_trait]
pub trait BulkLoader: Send + Sync {
    /// Creates the target table if it does not exist
    async fn ensure_table(&self) -> Result<()>;

    /// Loads the staged file, skipping its header row
    ///
    /// Returns the number of rows committed. A duplicate primary key is
    /// an error ([`crate::domain::StoreError::DuplicateKey`]); re-loading
    /// an already-consumed file must fail, not silently duplicate rows.
    async fn load(&self, staged: &Path) -> Result<u64>;
}

/// Capability: materialize the cross-store inner join
///
/// `materialize` replaces any prior materialization; it must never leave
/// both an old and a partial new version queryable under the same name.
#[async_trait]
pub trait JoinProvider: Send + Sync {
    /// Computes the inner join on `join_key` and persists the result
    async fn materialize(&self, join_key: &str) -> Result<TableRef>;
}

/// Capability: read the materialized joined table for export
#[async_trait]
pub trait JoinedSource: Send + Sync {
    /// Opens one live, closable connection to the store holding the join
    async fn connect(&self) -> Result<Box<dyn JoinedConnection>>;
}

/// One live store connection held by the Export stage
///
/// Export calls [`JoinedConnection::close`] on every exit path; `close`
/// is idempotent.
#[async_trait]
pub trait JoinedConnection: Send {
    /// Reads the full materialized table, in store-returned order
    async fn fetch_joined(&mut self) -> Result<Vec<JoinedRecord>>;

    /// Releases the connection
    async fn close(&mut self) -> Result<()>;
}
