//! PostgreSQL store adapters
//!
//! Production implementations of the store capabilities: pooled client,
//! COPY-based bulk loader, the two join providers, and the dedicated
//! export connection source.

pub mod client;
pub mod join;
pub mod loader;
pub mod reader;

pub use client::StoreClient;
pub use join::{ForeignTableJoin, MergeJoin};
pub use loader::PostgresBulkLoader;
pub use reader::PostgresJoinedSource;
