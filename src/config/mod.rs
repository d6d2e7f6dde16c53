//! Configuration management for Cartage.
//!
//! TOML-based configuration loading, parsing, and validation. The
//! configuration is resolved once per invocation and injected into the
//! pipeline; stages never read paths or credentials from anywhere else.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use cartage::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("cartage.toml")?;
//! println!("Customers source: {}", config.sources.customers.url);
//! println!("Output directory: {}", config.export.output_dir);
//! # Ok(())
//! # }
//! ```
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [sources.customers]
//! url = "https://example.com/data/customers.csv"
//! filename = "customers.csv"
//!
//! [sources.orders]
//! url = "https://example.com/data/orders.csv"
//! filename = "orders.csv"
//!
//! [staging]
//! intake_dir = "/var/lib/cartage/intake"
//! archive_dir = "/var/lib/cartage/archive"
//!
//! [stores.customers]
//! connection_string = "${CARTAGE_CUSTOMERS_DSN}"
//! table = "customers"
//!
//! [stores.orders]
//! connection_string = "${CARTAGE_ORDERS_DSN}"
//! table = "orders"
//!
//! [join]
//! provider = "foreign_table"
//!
//! [join.linkage]
//! host = "customers-db.internal"
//! dbname = "shop"
//! username = "etl"
//! password = "${CARTAGE_LINKAGE_PASSWORD}"
//!
//! [export]
//! output_dir = "/var/lib/cartage/output"
//! ```
//!
//! Use `${VAR_NAME}` syntax for environment variable substitution, and
//! `CARTAGE_<SECTION>_<KEY>` variables to override individual values.

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::load_config;
pub use schema::{
    ApplicationConfig, Environment, ExportConfig, HttpConfig, JoinConfig, JoinProviderKind,
    LinkageConfig, LoggingConfig, PipelineConfig, SourceConfig, SourcesConfig, StagingConfig,
    StoreConfig, StoresConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
