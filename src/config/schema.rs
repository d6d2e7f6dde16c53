//! Configuration schema types
//!
//! This module defines the configuration structure for Cartage. The task
//! graph depends only on the logical identifiers resolved here; no stage
//! carries a literal path or credential of its own.

use crate::config::SecretString;
use crate::domain::ids::TableName;
use serde::{Deserialize, Serialize};
use url::Url;

/// Runtime environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Development environment
    #[default]
    Development,
    /// Staging environment
    Staging,
    /// Production environment
    Production,
}

/// Cross-store join mechanism selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JoinProviderKind {
    /// Live linkage: foreign table over postgres_fdw (faithful to the
    /// original pipeline)
    #[default]
    ForeignTable,
    /// ETL-then-join: read both stores, join in memory, rewrite the
    /// materialized table
    Merge,
}

/// Main Cartage configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Application-level settings
    pub application: ApplicationConfig,

    /// Runtime environment (development, staging, production)
    #[serde(default)]
    pub environment: Environment,

    /// Source dataset locators
    pub sources: SourcesConfig,

    /// Intake and archive directories
    pub staging: StagingConfig,

    /// Relational store connections, one per dataset
    pub stores: StoresConfig,

    /// Join/materialize settings
    pub join: JoinConfig,

    /// Export artifact settings
    pub export: ExportConfig,

    /// HTTP client settings for the Extract stage
    #[serde(default)]
    pub http: HttpConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl PipelineConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.sources.validate(&self.environment)?;
        self.staging.validate()?;
        self.stores.validate()?;
        self.join.validate()?;
        self.export.validate()?;
        self.http.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

/// Source locators for the two datasets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Customers source file
    pub customers: SourceConfig,

    /// Orders source file
    pub orders: SourceConfig,
}

impl SourcesConfig {
    fn validate(&self, environment: &Environment) -> Result<(), String> {
        self.customers.validate("sources.customers", environment)?;
        self.orders.validate("sources.orders", environment)?;
        Ok(())
    }
}

/// One source dataset locator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// HTTP(S) URL returning a CSV file with a header row
    pub url: String,

    /// File name given to the staged copy in the intake directory
    pub filename: String,
}

impl SourceConfig {
    fn validate(&self, section: &str, environment: &Environment) -> Result<(), String> {
        let url = Url::parse(&self.url)
            .map_err(|e| format!("{section}.url is not a valid URL: {e}"))?;
        match url.scheme() {
            "https" => {}
            "http" => {
                if *environment == Environment::Production {
                    return Err(format!(
                        "{section}.url must use https in the production environment"
                    ));
                }
            }
            other => {
                return Err(format!(
                    "{section}.url has unsupported scheme '{other}'. Expected http or https"
                ));
            }
        }
        if self.filename.trim().is_empty() {
            return Err(format!("{section}.filename cannot be empty"));
        }
        if self.filename.contains('/') || self.filename.contains("..") {
            return Err(format!(
                "{section}.filename must be a bare file name, got '{}'",
                self.filename
            ));
        }
        Ok(())
    }
}

/// Intake and archive directories
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagingConfig {
    /// Directory freshly fetched files are staged into
    pub intake_dir: String,

    /// Directory consumed files are relocated to after both loads succeed
    pub archive_dir: String,
}

impl StagingConfig {
    fn validate(&self) -> Result<(), String> {
        if self.intake_dir.trim().is_empty() {
            return Err("staging.intake_dir cannot be empty".to_string());
        }
        if self.archive_dir.trim().is_empty() {
            return Err("staging.archive_dir cannot be empty".to_string());
        }
        if self.intake_dir == self.archive_dir {
            return Err("staging.archive_dir must differ from staging.intake_dir".to_string());
        }
        Ok(())
    }
}

/// Store connections, one per dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoresConfig {
    /// Store owning the customers table (store A)
    pub customers: StoreConfig,

    /// Store owning the orders table and the materialized join (store B)
    pub orders: StoreConfig,
}

impl StoresConfig {
    fn validate(&self) -> Result<(), String> {
        self.customers.validate("stores.customers")?;
        self.orders.validate("stores.orders")?;
        Ok(())
    }
}

/// One relational store connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// PostgreSQL connection string
    /// Stored securely in memory and automatically zeroized on drop
    pub connection_string: SecretString,

    /// Target table for this dataset's load
    pub table: String,

    /// Connection pool size
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// Pool wait/create timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_seconds: u64,

    /// Per-statement timeout in seconds
    #[serde(default = "default_statement_timeout")]
    pub statement_timeout_seconds: u64,
}

impl StoreConfig {
    fn validate(&self, section: &str) -> Result<(), String> {
        use secrecy::ExposeSecret;
        if self.connection_string.expose_secret().is_empty() {
            return Err(format!("{section}.connection_string cannot be empty"));
        }
        TableName::new(self.table.clone())
            .map_err(|e| format!("{section}.table: {e}"))?;
        if self.max_connections == 0 {
            return Err(format!("{section}.max_connections must be greater than 0"));
        }
        Ok(())
    }
}

/// Join/materialize settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinConfig {
    /// Which join mechanism materializes the combined table
    #[serde(default)]
    pub provider: JoinProviderKind,

    /// Name of the materialized joined table in the orders store
    #[serde(default = "default_materialized_table")]
    pub materialized_table: String,

    /// Name given to the foreign table exposing customers inside the
    /// orders store (foreign_table provider only)
    #[serde(default = "default_foreign_table")]
    pub foreign_table: String,

    /// Name of the foreign server object (foreign_table provider only)
    #[serde(default = "default_server_name")]
    pub server_name: String,

    /// Linkage back to the customers store; required by the
    /// foreign_table provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkage: Option<LinkageConfig>,
}

impl JoinConfig {
    fn validate(&self) -> Result<(), String> {
        for (field, value) in [
            ("join.materialized_table", &self.materialized_table),
            ("join.foreign_table", &self.foreign_table),
            ("join.server_name", &self.server_name),
        ] {
            TableName::new(value.clone()).map_err(|e| format!("{field}: {e}"))?;
        }
        match self.provider {
            JoinProviderKind::ForeignTable => match &self.linkage {
                Some(linkage) => linkage.validate(),
                None => Err(
                    "join.linkage is required when join.provider = 'foreign_table'".to_string(),
                ),
            },
            JoinProviderKind::Merge => Ok(()),
        }
    }
}

/// Connection details the orders store uses to reach the customers store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkageConfig {
    /// Customers store host as seen from the orders store
    pub host: String,

    /// Customers store port
    #[serde(default = "default_postgres_port")]
    pub port: u16,

    /// Customers database name
    pub dbname: String,

    /// User-mapping login
    pub username: String,

    /// User-mapping password
    /// Stored securely in memory and automatically zeroized on drop
    pub password: SecretString,
}

impl LinkageConfig {
    fn validate(&self) -> Result<(), String> {
        if self.host.trim().is_empty() {
            return Err("join.linkage.host cannot be empty".to_string());
        }
        if self.dbname.trim().is_empty() {
            return Err("join.linkage.dbname cannot be empty".to_string());
        }
        if self.username.trim().is_empty() {
            return Err("join.linkage.username cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Export artifact settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory the dated artifact is written into
    pub output_dir: String,

    /// Artifact name prefix; the run date and `.csv` are appended
    #[serde(default = "default_filename_prefix")]
    pub filename_prefix: String,
}

impl ExportConfig {
    fn validate(&self) -> Result<(), String> {
        if self.output_dir.trim().is_empty() {
            return Err("export.output_dir cannot be empty".to_string());
        }
        if self.filename_prefix.trim().is_empty() {
            return Err("export.filename_prefix cannot be empty".to_string());
        }
        Ok(())
    }
}

/// HTTP client settings for the Extract stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Whole-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
}

impl HttpConfig {
    fn validate(&self) -> Result<(), String> {
        if self.request_timeout_seconds == 0 {
            return Err("http.request_timeout_seconds must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_seconds: default_request_timeout(),
            connect_timeout_seconds: default_connect_timeout(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Write JSON logs to a rotating local file in addition to the console
    #[serde(default)]
    pub local_enabled: bool,

    /// Directory for local log files
    #[serde(default = "default_log_path")]
    pub local_path: String,

    /// Rotation policy: daily or hourly
    #[serde(default = "default_log_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled"
                .to_string());
        }
        let valid_rotations = ["daily", "hourly"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_log_path(),
            local_rotation: default_log_rotation(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_connections() -> usize {
    4
}

fn default_connection_timeout() -> u64 {
    30
}

fn default_statement_timeout() -> u64 {
    60
}

fn default_materialized_table() -> String {
    "customers_orders".to_string()
}

fn default_foreign_table() -> String {
    "customers_remote".to_string()
}

fn default_server_name() -> String {
    "customers_server".to_string()
}

fn default_postgres_port() -> u16 {
    5432
}

fn default_filename_prefix() -> String {
    "customers_orders".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_log_path() -> String {
    "logs".to_string()
}

fn default_log_rotation() -> String {
    "daily".to_string()
}
