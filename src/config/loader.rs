//! Configuration loader with TOML parsing and environment variable overrides
//!
//! Loading order: read the TOML file, substitute `${VAR}` placeholders,
//! parse, apply `CARTAGE_*` overrides, validate.

use super::schema::PipelineConfig;
use crate::config::secret_string;
use crate::domain::errors::PipelineError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use cartage::config::load_config;
///
/// let config = load_config("cartage.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<PipelineConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(PipelineError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        PipelineError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: PipelineConfig = toml::from_str(&contents)
        .map_err(|e| PipelineError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        PipelineError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are passed through untouched. Referencing an unset
/// variable is an error, reported with every missing name at once.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    for line in input.lines() {
        let trimmed = line.trim_start();

        if trimmed.starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(PipelineError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using the CARTAGE_* prefix
///
/// Environment variables follow the pattern: CARTAGE_<SECTION>_<KEY>
/// For example: CARTAGE_EXPORT_OUTPUT_DIR, CARTAGE_SOURCES_ORDERS_URL
fn apply_env_overrides(config: &mut PipelineConfig) {
    // Application overrides
    if let Ok(val) = std::env::var("CARTAGE_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Source overrides
    if let Ok(val) = std::env::var("CARTAGE_SOURCES_CUSTOMERS_URL") {
        config.sources.customers.url = val;
    }
    if let Ok(val) = std::env::var("CARTAGE_SOURCES_ORDERS_URL") {
        config.sources.orders.url = val;
    }

    // Staging overrides
    if let Ok(val) = std::env::var("CARTAGE_STAGING_INTAKE_DIR") {
        config.staging.intake_dir = val;
    }
    if let Ok(val) = std::env::var("CARTAGE_STAGING_ARCHIVE_DIR") {
        config.staging.archive_dir = val;
    }

    // Store overrides
    if let Ok(val) = std::env::var("CARTAGE_STORES_CUSTOMERS_CONNECTION_STRING") {
        config.stores.customers.connection_string = secret_string(val);
    }
    if let Ok(val) = std::env::var("CARTAGE_STORES_ORDERS_CONNECTION_STRING") {
        config.stores.orders.connection_string = secret_string(val);
    }

    // Linkage password override
    if let Ok(val) = std::env::var("CARTAGE_JOIN_LINKAGE_PASSWORD") {
        if let Some(ref mut linkage) = config.join.linkage {
            linkage.password = secret_string(val);
        }
    }

    // Export overrides
    if let Ok(val) = std::env::var("CARTAGE_EXPORT_OUTPUT_DIR") {
        config.export.output_dir = val;
    }

    // Logging overrides
    if let Ok(val) = std::env::var("CARTAGE_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("CARTAGE_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}
