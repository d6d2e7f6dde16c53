//! Bulk CSV loading over the COPY protocol
//!
//! Streams the staged file straight into `COPY ... FROM STDIN WITH
//! (FORMAT csv, HEADER true)`, bypassing SQL parsing. The file is sent
//! in fixed-size chunks; the staged CSV never has to fit in memory.

use crate::adapters::postgres::client::StoreClient;
use crate::adapters::store::BulkLoader;
use crate::domain::dataset::TableSpec;
use crate::domain::errors::StoreError;
use crate::domain::result::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures::SinkExt;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio_postgres::error::SqlState;

/// Chunk size for streaming the staged file into the COPY sink.
const COPY_CHUNK_BYTES: usize = 64 * 1024;

/// PostgreSQL implementation of [`BulkLoader`]
pub struct PostgresBulkLoader {
    client: Arc<StoreClient>,
    table: TableSpec,
}

impl PostgresBulkLoader {
    pub fn new(client: Arc<StoreClient>, table: TableSpec) -> Self {
        Self { client, table }
    }

    fn copy_statement(&self) -> String {
        format!(
            "COPY {} ({}) FROM STDIN WITH (FORMAT csv, HEADER true)",
            self.table.name,
            self.table.column_list()
        )
    }

    fn map_copy_error(&self, err: tokio_postgres::Error) -> StoreError {
        if err.code() == Some(&SqlState::UNIQUE_VIOLATION) {
            let detail = err
                .as_db_error()
                .map(|db| db.message().to_string())
                .unwrap_or_else(|| err.to_string());
            StoreError::DuplicateKey {
                table: self.table.name.to_string(),
                detail,
            }
        } else {
            StoreError::CopyFailed(err.to_string())
        }
    }
}

#[async_trait]
impl BulkLoader for PostgresBulkLoader {
    async fn ensure_table(&self) -> Result<()> {
        self.client.execute(&self.table.create_ddl(), &[]).await?;
        tracing::debug!(table = %self.table.name, "Target table ensured");
        Ok(())
    }

    async fn load(&self, staged: &Path) -> Result<u64> {
        let mut file = tokio::fs::File::open(staged).await.map_err(|e| {
            StoreError::CopyFailed(format!("Cannot open staged file {}: {e}", staged.display()))
        })?;

        let client = self.client.get().await?;
        let sink = client
            .copy_in(&self.copy_statement())
            .await
            .map_err(|e| self.map_copy_error(e))?;
        let mut sink = Box::pin(sink);

        let mut buf = vec![0u8; COPY_CHUNK_BYTES];
        loop {
            let read = file.read(&mut buf).await.map_err(|e| {
                StoreError::CopyFailed(format!("Read failed on {}: {e}", staged.display()))
            })?;
            if read == 0 {
                break;
            }
            sink.send(Bytes::copy_from_slice(&buf[..read]))
                .await
                .map_err(|e| self.map_copy_error(e))?;
        }

        let rows = sink
            .as_mut()
            .finish()
            .await
            .map_err(|e| self.map_copy_error(e))?;

        tracing::info!(
            table = %self.table.name,
            file = %staged.display(),
            rows,
            "Bulk load committed"
        );

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{secret_string, StoreConfig};
    use crate::domain::ids::TableName;

    fn loader(table: TableSpec) -> PostgresBulkLoader {
        let client = StoreClient::new(StoreConfig {
            connection_string: secret_string("postgresql://etl:pw@localhost/shop".to_string()),
            table: table.name.to_string(),
            max_connections: 2,
            connection_timeout_seconds: 5,
            statement_timeout_seconds: 30,
        })
        .unwrap();
        PostgresBulkLoader::new(Arc::new(client), table)
    }

    #[test]
    fn test_copy_statement_customers() {
        let loader = loader(TableSpec::customers(TableName::new("customers").unwrap()));
        assert_eq!(
            loader.copy_statement(),
            "COPY customers (customer_id, customer_name, email, city) \
             FROM STDIN WITH (FORMAT csv, HEADER true)"
        );
    }

    #[test]
    fn test_copy_statement_orders() {
        let loader = loader(TableSpec::orders(TableName::new("orders").unwrap()));
        assert_eq!(
            loader.copy_statement(),
            "COPY orders (order_id, customer_id, order_date, customer_amount) \
             FROM STDIN WITH (FORMAT csv, HEADER true)"
        );
    }

    #[tokio::test]
    async fn test_load_missing_file_fails_before_connecting() {
        let loader = loader(TableSpec::orders(TableName::new("orders").unwrap()));
        let err = loader.load(Path::new("/nonexistent/orders.csv")).await;
        assert!(err.is_err());
    }
}
