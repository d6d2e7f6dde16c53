//! Joined-table reader for the Export stage
//!
//! Export wants exactly one live, closable connection per run, so this
//! source opens a dedicated tokio-postgres connection rather than
//! borrowing from the pool: `close()` drops the client and joins the
//! connection driver, and the leak surface is a single handle.

use crate::adapters::store::{JoinedConnection, JoinedSource};
use crate::config::StoreConfig;
use crate::domain::dataset::JoinedRecord;
use crate::domain::errors::StoreError;
use crate::domain::ids::TableName;
use crate::domain::result::Result;
use async_trait::async_trait;
use secrecy::ExposeSecret;
use tokio_postgres::NoTls;

/// Opens dedicated connections to the store holding the joined table
pub struct PostgresJoinedSource {
    config: StoreConfig,
    materialized_table: TableName,
}

impl PostgresJoinedSource {
    pub fn new(config: StoreConfig, materialized_table: TableName) -> Self {
        Self {
            config,
            materialized_table,
        }
    }
}

#[async_trait]
impl JoinedSource for PostgresJoinedSource {
    async fn connect(&self) -> Result<Box<dyn JoinedConnection>> {
        let (client, connection) = tokio_postgres::connect(
            self.config.connection_string.expose_secret().as_ref(),
            NoTls,
        )
        .await
        .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;

        // The connection object drives the socket until the client drops.
        let driver = tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::warn!(error = %e, "Export connection driver ended with error");
            }
        });

        tracing::debug!(table = %self.materialized_table, "Export connection established");

        Ok(Box::new(PostgresJoinedConnection {
            client: Some(client),
            driver: Some(driver),
            table: self.materialized_table.clone(),
        }))
    }
}

struct PostgresJoinedConnection {
    client: Option<tokio_postgres::Client>,
    driver: Option<tokio::task::JoinHandle<()>>,
    table: TableName,
}

#[async_trait]
impl JoinedConnection for PostgresJoinedConnection {
    async fn fetch_joined(&mut self) -> Result<Vec<JoinedRecord>> {
        let client = self.client.as_ref().ok_or_else(|| {
            StoreError::ConnectionFailed("Connection already closed".to_string())
        })?;

        let rows = client
            .query(
                &format!(
                    "SELECT customer_id, customer_name, email, city, order_id, \
                     order_date, customer_amount FROM {}",
                    self.table
                ),
                &[],
            )
            .await
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        Ok(rows
            .iter()
            .map(|row| JoinedRecord {
                customer_id: row.get(0),
                customer_name: row.get(1),
                email: row.get(2),
                city: row.get(3),
                order_id: row.get(4),
                order_date: row.get(5),
                customer_amount: row.get(6),
            })
            .collect())
    }

    async fn close(&mut self) -> Result<()> {
        // Dropping the client ends the connection; joining the driver
        // waits for the socket to wind down. Idempotent.
        drop(self.client.take());
        if let Some(driver) = self.driver.take() {
            let _ = driver.await;
            tracing::debug!(table = %self.table, "Export connection closed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;

    #[tokio::test]
    async fn test_connect_failure_maps_to_store_error() {
        let source = PostgresJoinedSource::new(
            StoreConfig {
                // Unroutable port; connect fails fast.
                connection_string: secret_string(
                    "postgresql://etl:pw@127.0.0.1:1/shop?connect_timeout=1".to_string(),
                ),
                table: "orders".to_string(),
                max_connections: 1,
                connection_timeout_seconds: 1,
                statement_timeout_seconds: 5,
            },
            TableName::new("customers_orders").unwrap(),
        );

        let result = source.connect().await;
        assert!(result.is_err());
    }
}
