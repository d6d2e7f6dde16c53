//! Domain identifier types with validation
//!
//! Newtype wrappers for the identifiers that flow through the task graph.
//! Each type validates its format on construction so that invalid names
//! never reach SQL rendering or graph wiring.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Logical dataset name newtype wrapper
///
/// Names one of the pipeline's source datasets (e.g. `customers`,
/// `orders`). The task graph and configuration refer to datasets only by
/// this name, never by literal paths.
///
/// # Examples
///
/// ```
/// use cartage::domain::ids::DatasetName;
///
/// let name = DatasetName::new("customers").unwrap();
/// assert_eq!(name.as_str(), "customers");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetName(String);

impl DatasetName {
    /// Creates a new DatasetName from a string
    ///
    /// # Errors
    ///
    /// Returns `Err` if the name is empty or contains characters outside
    /// `[a-z0-9_]`.
    pub fn new(name: impl Into<String>) -> Result<Self, String> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err("Dataset name cannot be empty".to_string());
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        {
            return Err(format!(
                "Invalid dataset name '{name}'. Allowed characters: a-z, 0-9, _"
            ));
        }
        Ok(Self(name))
    }

    /// Returns the dataset name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatasetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DatasetName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for DatasetName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Table name newtype wrapper
///
/// Table names are interpolated into DDL and COPY statements, so the
/// constructor enforces a plain SQL identifier: leading letter or
/// underscore, then letters, digits and underscores.
///
/// # Examples
///
/// ```
/// use cartage::domain::ids::TableName;
///
/// let table = TableName::new("customers_orders").unwrap();
/// assert_eq!(table.as_str(), "customers_orders");
/// assert!(TableName::new("drop table; --").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableName(String);

impl TableName {
    /// Creates a new TableName from a string
    ///
    /// # Errors
    ///
    /// Returns `Err` if the name is not a plain SQL identifier.
    pub fn new(name: impl Into<String>) -> Result<Self, String> {
        let name = name.into();
        let mut chars = name.chars();
        let valid_head = chars
            .next()
            .map(|c| c.is_ascii_alphabetic() || c == '_')
            .unwrap_or(false);
        let valid_tail = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid_head || !valid_tail {
            return Err(format!(
                "Invalid table name '{name}'. Expected a plain SQL identifier"
            ));
        }
        Ok(Self(name))
    }

    /// Returns the table name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TableName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for TableName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_name_valid() {
        let name = DatasetName::new("orders").unwrap();
        assert_eq!(name.as_str(), "orders");
        assert_eq!(name.to_string(), "orders");
    }

    #[test]
    fn test_dataset_name_empty() {
        assert!(DatasetName::new("").is_err());
        assert!(DatasetName::new("   ").is_err());
    }

    #[test]
    fn test_dataset_name_invalid_chars() {
        assert!(DatasetName::new("Orders").is_err());
        assert!(DatasetName::new("orders-v2").is_err());
        assert!(DatasetName::new("orders csv").is_err());
    }

    #[test]
    fn test_dataset_name_from_str() {
        let name: DatasetName = "customers".parse().unwrap();
        assert_eq!(name.as_ref(), "customers");
    }

    #[test]
    fn test_table_name_valid() {
        assert!(TableName::new("customers").is_ok());
        assert!(TableName::new("_staging").is_ok());
        assert!(TableName::new("customers_orders2").is_ok());
    }

    #[test]
    fn test_table_name_rejects_injection() {
        assert!(TableName::new("").is_err());
        assert!(TableName::new("1customers").is_err());
        assert!(TableName::new("customers; drop table orders").is_err());
        assert!(TableName::new("customers\"").is_err());
    }
}
