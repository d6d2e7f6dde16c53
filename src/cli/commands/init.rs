//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "cartage.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Cartage configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2); // Configuration error exit code
        }

        match fs::write(&self.output, Self::sample_config()) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your source URLs and directories", self.output);
                println!("  2. Set store credentials in the environment:");
                println!("     - CARTAGE_CUSTOMERS_DSN and CARTAGE_ORDERS_DSN");
                println!("     - CARTAGE_LINKAGE_PASSWORD (foreign_table provider)");
                println!("  3. Validate configuration: cartage validate-config");
                println!("  4. Inspect the task graph: cartage plan");
                println!("  5. Execute a run: cartage run");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5) // Fatal error exit code
            }
        }
    }

    /// Sample configuration
    fn sample_config() -> &'static str {
        r#"# Cartage Configuration File
# Batch ETL pipeline: flat files -> relational stores -> joined extract

[application]
log_level = "info"

# development | staging | production
environment = "development"

[sources.customers]
url = "https://example.com/data/customers.csv"
filename = "customers.csv"

[sources.orders]
url = "https://example.com/data/orders.csv"
filename = "orders.csv"

[staging]
intake_dir = "/var/lib/cartage/intake"
archive_dir = "/var/lib/cartage/archive"

[stores.customers]
connection_string = "${CARTAGE_CUSTOMERS_DSN}"
table = "customers"

[stores.orders]
connection_string = "${CARTAGE_ORDERS_DSN}"
table = "orders"

[join]
# foreign_table (live linkage via postgres_fdw) | merge (read both stores, join in memory)
provider = "foreign_table"
materialized_table = "customers_orders"
foreign_table = "customers_remote"
server_name = "customers_server"

[join.linkage]
# How the orders store reaches the customers store
host = "customers-db.internal"
port = 5432
dbname = "shop"
username = "etl"
password = "${CARTAGE_LINKAGE_PASSWORD}"

[export]
output_dir = "/var/lib/cartage/output"
filename_prefix = "customers_orders"

[http]
request_timeout_seconds = 30
connect_timeout_seconds = 10

[logging]
local_enabled = false
local_path = "logs"
local_rotation = "daily"
"#
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_config_parses_and_validates() {
        std::env::set_var("CARTAGE_CUSTOMERS_DSN", "postgresql://etl:pw@localhost/a");
        std::env::set_var("CARTAGE_ORDERS_DSN", "postgresql://etl:pw@localhost/b");
        std::env::set_var("CARTAGE_LINKAGE_PASSWORD", "pw");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cartage.toml");
        std::fs::write(&path, InitArgs::sample_config()).unwrap();

        let config = crate::config::load_config(&path).unwrap();
        assert_eq!(config.sources.customers.filename, "customers.csv");

        std::env::remove_var("CARTAGE_CUSTOMERS_DSN");
        std::env::remove_var("CARTAGE_ORDERS_DSN");
        std::env::remove_var("CARTAGE_LINKAGE_PASSWORD");
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cartage.toml");
        std::fs::write(&path, "existing").unwrap();

        let args = InitArgs {
            output: path.to_string_lossy().to_string(),
            force: false,
        };
        let code = args.execute().await.unwrap();
        assert_eq!(code, 2);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "existing");
    }

    #[tokio::test]
    async fn test_init_force_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cartage.toml");
        std::fs::write(&path, "existing").unwrap();

        let args = InitArgs {
            output: path.to_string_lossy().to_string(),
            force: true,
        };
        let code = args.execute().await.unwrap();
        assert_eq!(code, 0);
        assert!(std::fs::read_to_string(&path)
            .unwrap()
            .contains("[sources.customers]"));
    }
}
