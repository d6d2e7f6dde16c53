//! Join providers for the materialize stage
//!
//! Two implementations of [`JoinProvider`]:
//!
//! - [`ForeignTableJoin`] — live linkage: exposes the customers table
//!   inside the orders store over `postgres_fdw` and materializes the
//!   join with `CREATE TABLE AS SELECT`, all in one transaction.
//! - [`MergeJoin`] — ETL-then-join: reads both stores, joins in memory,
//!   rewrites the materialized table in one transaction.
//!
//! Either way the old materialization is dropped and the new one created
//! atomically; a reader never sees a half-built table.

use crate::adapters::postgres::client::StoreClient;
use crate::adapters::store::{JoinProvider, TableRef};
use crate::config::LinkageConfig;
use crate::domain::dataset::{CustomerRecord, JoinedRecord, OrderRecord, TableSpec};
use crate::domain::errors::{PipelineError, StoreError};
use crate::domain::ids::TableName;
use crate::domain::result::Result;
use async_trait::async_trait;
use secrecy::ExposeSecret;
use std::sync::Arc;

fn ensure_identifier(name: &str) -> Result<()> {
    TableName::new(name)
        .map(|_| ())
        .map_err(|e| PipelineError::Store(StoreError::LinkageFailed(e)))
}

/// Live cross-store linkage over postgres_fdw
pub struct ForeignTableJoin {
    orders_client: Arc<StoreClient>,
    customers_table: TableSpec,
    orders_table: TableName,
    server_name: TableName,
    foreign_table: TableName,
    materialized_table: TableName,
    linkage: LinkageConfig,
}

impl ForeignTableJoin {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        orders_client: Arc<StoreClient>,
        customers_table: TableSpec,
        orders_table: TableName,
        server_name: TableName,
        foreign_table: TableName,
        materialized_table: TableName,
        linkage: LinkageConfig,
    ) -> Self {
        Self {
            orders_client,
            customers_table,
            orders_table,
            server_name,
            foreign_table,
            materialized_table,
            linkage,
        }
    }

    /// DDL establishing the extension, server, user mapping and foreign
    /// table. The foreign table is recreated each run so remote schema
    /// drift surfaces here, not in the join query.
    fn linkage_sql(&self) -> String {
        let columns = self
            .customers_table
            .columns
            .iter()
            .map(|c| format!("{} {}", c.name, c.sql_type))
            .collect::<Vec<_>>()
            .join(", ");
        // Single-quoted option values; quotes in credentials are doubled.
        let username = self.linkage.username.replace('\'', "''");
        let password = self
            .linkage
            .password
            .expose_secret()
            .as_ref()
            .replace('\'', "''");
        format!(
            "CREATE EXTENSION IF NOT EXISTS postgres_fdw;\n\
             CREATE SERVER IF NOT EXISTS {server} FOREIGN DATA WRAPPER postgres_fdw \
             OPTIONS (host '{host}', port '{port}', dbname '{dbname}');\n\
             CREATE USER MAPPING IF NOT EXISTS FOR CURRENT_USER SERVER {server} \
             OPTIONS (user '{username}', password '{password}');\n\
             DROP FOREIGN TABLE IF EXISTS {foreign_table};\n\
             CREATE FOREIGN TABLE {foreign_table} ({columns}) SERVER {server} \
             OPTIONS (table_name '{remote_table}');",
            server = self.server_name,
            host = self.linkage.host.replace('\'', "''"),
            port = self.linkage.port,
            dbname = self.linkage.dbname.replace('\'', "''"),
            foreign_table = self.foreign_table,
            remote_table = self.customers_table.name,
        )
    }

    /// DDL replacing the materialized join table
    fn materialize_sql(&self, join_key: &str) -> String {
        format!(
            "DROP TABLE IF EXISTS {materialized};\n\
             CREATE TABLE {materialized} AS \
             SELECT c.customer_id, c.customer_name, c.email, c.city, \
             o.order_id, o.order_date, o.customer_amount \
             FROM {foreign_table} AS c \
             INNER JOIN {orders} AS o ON c.{join_key} = o.{join_key}",
            materialized = self.materialized_table,
            foreign_table = self.foreign_table,
            orders = self.orders_table,
        )
    }
}

#[async_trait]
impl JoinProvider for ForeignTableJoin {
    async fn materialize(&self, join_key: &str) -> Result<TableRef> {
        ensure_identifier(join_key)?;

        let mut client = self.orders_client.get().await?;
        let tx = client
            .transaction()
            .await
            .map_err(|e| StoreError::TransactionFailed(e.to_string()))?;

        tx.batch_execute(&self.linkage_sql())
            .await
            .map_err(|e| StoreError::LinkageFailed(e.to_string()))?;

        tx.batch_execute(&self.materialize_sql(join_key))
            .await
            .map_err(|e| StoreError::DdlFailed(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| StoreError::TransactionFailed(e.to_string()))?;

        tracing::info!(
            table = %self.materialized_table,
            join_key,
            "Joined table materialized via foreign-table linkage"
        );

        Ok(TableRef::new(self.materialized_table.clone()))
    }
}

/// ETL-then-join provider: read both stores, join in memory, rewrite
pub struct MergeJoin {
    customers_client: Arc<StoreClient>,
    orders_client: Arc<StoreClient>,
    customers_table: TableName,
    orders_table: TableName,
    materialized_table: TableName,
}

impl MergeJoin {
    pub fn new(
        customers_client: Arc<StoreClient>,
        orders_client: Arc<StoreClient>,
        customers_table: TableName,
        orders_table: TableName,
        materialized_table: TableName,
    ) -> Self {
        Self {
            customers_client,
            orders_client,
            customers_table,
            orders_table,
            materialized_table,
        }
    }

    async fn read_customers(&self) -> Result<Vec<CustomerRecord>> {
        let rows = self
            .customers_client
            .query(
                &format!(
                    "SELECT customer_id, customer_name, email, city FROM {}",
                    self.customers_table
                ),
                &[],
            )
            .await?;
        Ok(rows
            .iter()
            .map(|row| CustomerRecord {
                customer_id: row.get(0),
                customer_name: row.get(1),
                email: row.get(2),
                city: row.get(3),
            })
            .collect())
    }

    async fn read_orders(&self) -> Result<Vec<OrderRecord>> {
        let rows = self
            .orders_client
            .query(
                &format!(
                    "SELECT order_id, customer_id, order_date, customer_amount FROM {}",
                    self.orders_table
                ),
                &[],
            )
            .await?;
        Ok(rows
            .iter()
            .map(|row| OrderRecord {
                order_id: row.get(0),
                customer_id: row.get(1),
                order_date: row.get(2),
                customer_amount: row.get(3),
            })
            .collect())
    }

    fn create_table_sql(&self) -> String {
        format!(
            "DROP TABLE IF EXISTS {materialized};\n\
             CREATE TABLE {materialized} (customer_id INT, customer_name VARCHAR(50), \
             email VARCHAR(50), city VARCHAR(30), order_id INT, order_date DATE, \
             customer_amount FLOAT)",
            materialized = self.materialized_table,
        )
    }
}

#[async_trait]
impl JoinProvider for MergeJoin {
    async fn materialize(&self, join_key: &str) -> Result<TableRef> {
        ensure_identifier(join_key)?;
        // This provider joins on the customer key by construction.
        if join_key != "customer_id" {
            return Err(StoreError::LinkageFailed(format!(
                "merge provider joins on customer_id, got '{join_key}'"
            ))
            .into());
        }

        let customers = self.read_customers().await?;
        let orders = self.read_orders().await?;
        let joined = JoinedRecord::inner_join(&customers, &orders);

        tracing::debug!(
            customers = customers.len(),
            orders = orders.len(),
            joined = joined.len(),
            "Computed in-memory inner join"
        );

        let mut client = self.orders_client.get().await?;
        let tx = client
            .transaction()
            .await
            .map_err(|e| StoreError::TransactionFailed(e.to_string()))?;

        tx.batch_execute(&self.create_table_sql())
            .await
            .map_err(|e| StoreError::DdlFailed(e.to_string()))?;

        let insert = format!(
            "INSERT INTO {} (customer_id, customer_name, email, city, order_id, \
             order_date, customer_amount) VALUES ($1, $2, $3, $4, $5, $6, $7)",
            self.materialized_table
        );
        let statement = tx
            .prepare(&insert)
            .await
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
        for record in &joined {
            tx.execute(
                &statement,
                &[
                    &record.customer_id,
                    &record.customer_name,
                    &record.email,
                    &record.city,
                    &record.order_id,
                    &record.order_date,
                    &record.customer_amount,
                ],
            )
            .await
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::TransactionFailed(e.to_string()))?;

        tracing::info!(
            table = %self.materialized_table,
            rows = joined.len(),
            "Joined table materialized via merge"
        );

        Ok(TableRef::new(self.materialized_table.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{secret_string, StoreConfig};

    fn store_client(table: &str) -> Arc<StoreClient> {
        Arc::new(
            StoreClient::new(StoreConfig {
                connection_string: secret_string(
                    "postgresql://etl:pw@localhost/shop".to_string(),
                ),
                table: table.to_string(),
                max_connections: 2,
                connection_timeout_seconds: 5,
                statement_timeout_seconds: 30,
            })
            .unwrap(),
        )
    }

    fn table(name: &str) -> TableName {
        TableName::new(name).unwrap()
    }

    fn foreign_table_join() -> ForeignTableJoin {
        ForeignTableJoin::new(
            store_client("orders"),
            TableSpec::customers(table("customers")),
            table("orders"),
            table("customers_server"),
            table("customers_remote"),
            table("customers_orders"),
            LinkageConfig {
                host: "customers-db".to_string(),
                port: 5432,
                dbname: "shop".to_string(),
                username: "etl".to_string(),
                password: secret_string("o'hare".to_string()),
            },
        )
    }

    #[test]
    fn test_linkage_sql_shape() {
        let sql = foreign_table_join().linkage_sql();
        assert!(sql.contains("CREATE EXTENSION IF NOT EXISTS postgres_fdw"));
        assert!(sql.contains(
            "CREATE SERVER IF NOT EXISTS customers_server FOREIGN DATA WRAPPER postgres_fdw"
        ));
        assert!(sql.contains("host 'customers-db', port '5432', dbname 'shop'"));
        assert!(sql.contains("CREATE USER MAPPING IF NOT EXISTS FOR CURRENT_USER"));
        assert!(sql.contains("DROP FOREIGN TABLE IF EXISTS customers_remote"));
        assert!(sql.contains("customer_id INT, customer_name VARCHAR(50)"));
        assert!(sql.contains("OPTIONS (table_name 'customers')"));
    }

    #[test]
    fn test_linkage_sql_escapes_quotes_in_credentials() {
        let sql = foreign_table_join().linkage_sql();
        assert!(sql.contains("password 'o''hare'"));
    }

    #[test]
    fn test_materialize_sql_replaces_table_atomically() {
        let sql = foreign_table_join().materialize_sql("customer_id");
        assert!(sql.contains("DROP TABLE IF EXISTS customers_orders"));
        assert!(sql.contains("CREATE TABLE customers_orders AS SELECT"));
        assert!(sql.contains("INNER JOIN orders AS o ON c.customer_id = o.customer_id"));
    }

    #[tokio::test]
    async fn test_bad_join_key_rejected_before_connecting() {
        let join = foreign_table_join();
        let err = join.materialize("customer_id; drop table orders").await;
        assert!(err.is_err());
    }

    #[test]
    fn test_merge_create_table_sql() {
        let join = MergeJoin::new(
            store_client("customers"),
            store_client("orders"),
            table("customers"),
            table("orders"),
            table("customers_orders"),
        );
        let sql = join.create_table_sql();
        assert!(sql.contains("DROP TABLE IF EXISTS customers_orders"));
        assert!(sql.contains("order_date DATE"));
        assert!(sql.contains("customer_amount FLOAT"));
    }
}
