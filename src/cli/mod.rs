//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Cartage using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Cartage - E-commerce batch ETL pipeline
#[derive(Parser, Debug)]
#[command(name = "cartage")]
#[command(version, about, long_about = None)]
#[command(author = "Cartage Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "cartage.toml", env = "CARTAGE_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "CARTAGE_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute one pipeline run for a logical date
    Run(commands::run::RunArgs),

    /// Print the task graph without executing it
    Plan(commands::plan::PlanArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_run() {
        let cli = Cli::parse_from(["cartage", "run"]);
        assert_eq!(cli.config, "cartage.toml");
        assert!(matches!(cli.command, Commands::Run(_)));
    }

    #[test]
    fn test_cli_parse_run_with_date() {
        let cli = Cli::parse_from(["cartage", "run", "--date", "2025-02-09"]);
        match cli.command {
            Commands::Run(args) => assert_eq!(args.date.as_deref(), Some("2025-02-09")),
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["cartage", "--config", "custom.toml", "plan"]);
        assert_eq!(cli.config, "custom.toml");
        assert!(matches!(cli.command, Commands::Plan(_)));
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["cartage", "--log-level", "debug", "run"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cli_parse_validate_config() {
        let cli = Cli::parse_from(["cartage", "validate-config"]);
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["cartage", "init", "--force"]);
        match cli.command {
            Commands::Init(args) => assert!(args.force),
            _ => panic!("expected init command"),
        }
    }
}
