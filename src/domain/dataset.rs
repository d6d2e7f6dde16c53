//! Dataset descriptors and record types
//!
//! A [`DatasetDescriptor`] is the immutable per-run description of one
//! source dataset: where it comes from, what the staged file is called,
//! and the shape of the table it loads into. The task graph depends only
//! on these descriptors, never on literal paths or credentials.

use crate::domain::ids::{DatasetName, TableName};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use url::Url;

/// Column definition within a [`TableSpec`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Column name (plain SQL identifier)
    pub name: String,

    /// SQL type as rendered into DDL (e.g. `INT`, `VARCHAR(50)`)
    pub sql_type: String,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
        }
    }
}

/// Target table shape for one dataset
///
/// Renders the idempotent `CREATE TABLE IF NOT EXISTS` statement used by
/// the Load stage and the column list used by the COPY statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    /// Table name in the owning store
    pub name: TableName,

    /// Ordered column definitions, matching the source CSV column order
    pub columns: Vec<ColumnSpec>,

    /// Primary-key column; uniqueness of loaded rows hangs off this key
    pub primary_key: String,
}

impl TableSpec {
    /// Table spec for the customers dataset
    pub fn customers(table: TableName) -> Self {
        Self {
            name: table,
            columns: vec![
                ColumnSpec::new("customer_id", "INT"),
                ColumnSpec::new("customer_name", "VARCHAR(50)"),
                ColumnSpec::new("email", "VARCHAR(50)"),
                ColumnSpec::new("city", "VARCHAR(30)"),
            ],
            primary_key: "customer_id".to_string(),
        }
    }

    /// Table spec for the orders dataset
    pub fn orders(table: TableName) -> Self {
        Self {
            name: table,
            columns: vec![
                ColumnSpec::new("order_id", "INT"),
                ColumnSpec::new("customer_id", "INT"),
                ColumnSpec::new("order_date", "DATE"),
                ColumnSpec::new("customer_amount", "FLOAT"),
            ],
            primary_key: "order_id".to_string(),
        }
    }

    /// Renders the idempotent create statement for this table
    pub fn create_ddl(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|c| {
                if c.name == self.primary_key {
                    format!("{} {} PRIMARY KEY", c.name, c.sql_type)
                } else {
                    format!("{} {}", c.name, c.sql_type)
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("CREATE TABLE IF NOT EXISTS {} ({})", self.name, columns)
    }

    /// Comma-separated column list, in CSV order
    pub fn column_list(&self) -> String {
        self.columns
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Immutable per-run description of one source dataset
#[derive(Debug, Clone)]
pub struct DatasetDescriptor {
    /// Logical dataset name
    pub name: DatasetName,

    /// Source locator the Extract stage fetches from
    pub source_url: Url,

    /// File name within the staging (intake) directory
    pub staged_filename: String,

    /// Target table in the dataset's owning store
    pub table: TableSpec,
}

impl DatasetDescriptor {
    pub fn new(
        name: DatasetName,
        source_url: Url,
        staged_filename: impl Into<String>,
        table: TableSpec,
    ) -> Self {
        Self {
            name,
            source_url,
            staged_filename: staged_filename.into(),
            table,
        }
    }
}

/// One row of the customers table
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerRecord {
    pub customer_id: i32,
    pub customer_name: String,
    pub email: String,
    pub city: String,
}

/// One row of the orders table
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub order_id: i32,
    pub customer_id: i32,
    pub order_date: NaiveDate,
    pub customer_amount: f64,
}

/// One row of the materialized join: an order matched to its customer
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRecord {
    pub customer_id: i32,
    pub customer_name: String,
    pub email: String,
    pub city: String,
    pub order_id: i32,
    pub order_date: NaiveDate,
    pub customer_amount: f64,
}

/// Header row of the export artifact, in materialized column order
pub const JOINED_CSV_HEADER: &str =
    "customer_id,customer_name,email,city,order_id,order_date,customer_amount";

impl JoinedRecord {
    /// Inner join of orders to customers on `customer_id`
    ///
    /// One output row per order whose customer exists; orders with no
    /// matching customer are dropped. Output preserves order iteration
    /// order, matching the unordered read the Export stage performs.
    pub fn inner_join(customers: &[CustomerRecord], orders: &[OrderRecord]) -> Vec<JoinedRecord> {
        orders
            .iter()
            .filter_map(|order| {
                customers
                    .iter()
                    .find(|c| c.customer_id == order.customer_id)
                    .map(|customer| JoinedRecord {
                        customer_id: customer.customer_id,
                        customer_name: customer.customer_name.clone(),
                        email: customer.email.clone(),
                        city: customer.city.clone(),
                        order_id: order.order_id,
                        order_date: order.order_date,
                        customer_amount: order.customer_amount,
                    })
            })
            .collect()
    }

    /// Renders this record as one CSV row (no trailing newline)
    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{},{},{},{}",
            self.customer_id,
            csv_field(&self.customer_name),
            csv_field(&self.email),
            csv_field(&self.city),
            self.order_id,
            self.order_date.format("%Y-%m-%d"),
            self.customer_amount,
        )
    }
}

/// Quotes a CSV field when it contains a delimiter, quote or newline
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
