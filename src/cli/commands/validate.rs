//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Cartage configuration file.

use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates after parsing
        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration is valid");
                c
            }
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Customers Source: {}", config.sources.customers.url);
        println!("  Orders Source: {}", config.sources.orders.url);
        println!("  Intake Directory: {}", config.staging.intake_dir);
        println!("  Archive Directory: {}", config.staging.archive_dir);

        for (name, store) in [
            ("Customers", &config.stores.customers),
            ("Orders", &config.stores.orders),
        ] {
            use secrecy::ExposeSecret;
            println!(
                "  {} Store: {} (table {})",
                name,
                store
                    .connection_string
                    .expose_secret()
                    .split('@')
                    .next_back()
                    .unwrap_or("***"),
                store.table
            );
        }

        println!("  Join Provider: {:?}", config.join.provider);
        println!("  Materialized Table: {}", config.join.materialized_table);
        println!("  Output Directory: {}", config.export.output_dir);
        println!("  Artifact Prefix: {}", config.export.filename_prefix);
        println!();
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_args_creation() {
        let args = ValidateArgs {};
        let _ = format!("{args:?}");
    }

    #[tokio::test]
    async fn test_missing_file_reports_configuration_error() {
        let args = ValidateArgs {};
        let code = args.execute("does-not-exist.toml").await.unwrap();
        assert_eq!(code, 2);
    }
}
