//! Export stage task
//!
//! Reads the full materialized table over one dedicated connection and
//! writes the dated CSV artifact. The connection is closed on every exit
//! path; errors are logged with context and re-raised, never swallowed.
//! Rows land in whatever order the read query returned — no ordering
//! clause is added here.

use crate::adapters::store::{JoinedConnection, JoinedSource};
use crate::domain::dataset::JOINED_CSV_HEADER;
use crate::domain::errors::PipelineError;
use crate::domain::result::Result;
use crate::domain::run::RunContext;
use crate::graph::{Task, TaskId};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Writes the dated joined extract
pub struct ExportTask {
    id: TaskId,
    source: Arc<dyn JoinedSource>,
    output_dir: PathBuf,
    filename_prefix: String,
}

impl ExportTask {
    pub fn new(
        source: Arc<dyn JoinedSource>,
        output_dir: impl Into<PathBuf>,
        filename_prefix: impl Into<String>,
    ) -> Self {
        Self {
            id: TaskId::new("export").expect("static id"),
            source,
            output_dir: output_dir.into(),
            filename_prefix: filename_prefix.into(),
        }
    }

    /// Artifact path for a logical run date
    pub fn artifact_path(&self, run_date: NaiveDate) -> PathBuf {
        self.output_dir.join(format!(
            "{}_{}.csv",
            self.filename_prefix,
            run_date.format("%Y-%m-%d")
        ))
    }

    async fn read_and_write(
        &self,
        conn: &mut dyn JoinedConnection,
        ctx: &RunContext,
    ) -> Result<()> {
        let records = conn.fetch_joined().await?;
        tracing::info!(count = records.len(), "Retrieved joined records");

        let mut contents = String::with_capacity((records.len() + 1) * 64);
        contents.push_str(JOINED_CSV_HEADER);
        contents.push('\n');
        for record in &records {
            contents.push_str(&record.to_csv_row());
            contents.push('\n');
        }

        let artifact = self.artifact_path(ctx.run_date);
        write_atomically(&artifact, contents.as_bytes()).await?;

        ctx.metrics
            .record_export(records.len() as u64, artifact.clone());

        tracing::info!(
            artifact = %artifact.display(),
            rows = records.len(),
            "Export artifact written"
        );

        Ok(())
    }
}

/// Writes through a temp file and renames into place, so a same-date
/// re-run is a deterministic overwrite and a failed write never leaves a
/// torn artifact at the final path.
async fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    let tmp = path.with_extension("csv.tmp");
    tokio::fs::write(&tmp, contents)
        .await
        .map_err(|e| PipelineError::Export(format!("Failed to write {}: {e}", tmp.display())))?;
    tokio::fs::rename(&tmp, path).await.map_err(|e| {
        PipelineError::Export(format!(
            "Failed to move artifact into place at {}: {e}",
            path.display()
        ))
    })?;
    Ok(())
}

#[async_trait]
impl Task for ExportTask {
    fn id(&self) -> &TaskId {
        &self.id
    }

    async fn run(&self, ctx: &RunContext) -> Result<()> {
        tracing::info!("Starting export from joined table");

        let mut conn = self.source.connect().await?;
        let result = self.read_and_write(conn.as_mut(), ctx).await;
        let close_result = conn.close().await;

        if let Err(e) = &result {
            tracing::error!(error = %e, "Export failed");
        }
        result?;
        close_result?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dataset::{CustomerRecord, JoinedRecord, OrderRecord};
    use crate::domain::errors::StoreError;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Fake source whose connections record whether close ran.
    struct FakeSource {
        records: Vec<JoinedRecord>,
        fail_fetch: bool,
        closed: Arc<AtomicBool>,
    }

    struct FakeConnection {
        records: Vec<JoinedRecord>,
        fail_fetch: bool,
        closed: Arc<AtomicBool>,
    }

    #[async_trait]
    impl JoinedSource for FakeSource {
        async fn connect(&self) -> Result<Box<dyn JoinedConnection>> {
            Ok(Box::new(FakeConnection {
                records: self.records.clone(),
                fail_fetch: self.fail_fetch,
                closed: self.closed.clone(),
            }))
        }
    }

    #[async_trait]
    impl JoinedConnection for FakeConnection {
        async fn fetch_joined(&mut self) -> Result<Vec<JoinedRecord>> {
            if self.fail_fetch {
                return Err(StoreError::QueryFailed("relation is gone".to_string()).into());
            }
            Ok(self.records.clone())
        }

        async fn close(&mut self) -> Result<()> {
            self.closed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    fn joined_fixture() -> Vec<JoinedRecord> {
        let customers = vec![CustomerRecord {
            customer_id: 1,
            customer_name: "A".to_string(),
            email: "a@x".to_string(),
            city: "NY".to_string(),
        }];
        let orders = vec![
            OrderRecord {
                order_id: 100,
                customer_id: 1,
                order_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                customer_amount: 9.99,
            },
            OrderRecord {
                order_id: 101,
                customer_id: 2,
                order_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                customer_amount: 5.00,
            },
        ];
        JoinedRecord::inner_join(&customers, &orders)
    }

    fn ctx() -> RunContext {
        RunContext::new(NaiveDate::from_ymd_opt(2025, 2, 9).unwrap())
    }

    #[tokio::test]
    async fn test_export_writes_dated_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let closed = Arc::new(AtomicBool::new(false));
        let task = ExportTask::new(
            Arc::new(FakeSource {
                records: joined_fixture(),
                fail_fetch: false,
                closed: closed.clone(),
            }),
            dir.path(),
            "customers_orders",
        );
        let ctx = ctx();

        task.run(&ctx).await.unwrap();

        let artifact = dir.path().join("customers_orders_2025-02-09.csv");
        let contents = std::fs::read_to_string(&artifact).unwrap();
        assert_eq!(
            contents,
            "customer_id,customer_name,email,city,order_id,order_date,customer_amount\n\
             1,A,a@x,NY,100,2025-01-01,9.99\n"
        );
        assert!(closed.load(Ordering::SeqCst));
        assert_eq!(ctx.metrics.snapshot().rows_exported, Some(1));
    }

    #[tokio::test]
    async fn test_unmatched_order_excluded_from_artifact() {
        // Order 101 has no matching customer; only order 100 appears.
        let records = joined_fixture();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].order_id, 100);
    }

    #[tokio::test]
    async fn test_export_closes_connection_on_fetch_failure() {
        let dir = tempfile::tempdir().unwrap();
        let closed = Arc::new(AtomicBool::new(false));
        let task = ExportTask::new(
            Arc::new(FakeSource {
                records: Vec::new(),
                fail_fetch: true,
                closed: closed.clone(),
            }),
            dir.path(),
            "customers_orders",
        );

        let err = task.run(&ctx()).await.unwrap_err();

        assert!(err.to_string().contains("relation is gone"));
        assert!(closed.load(Ordering::SeqCst), "connection leaked on error");
        // No artifact for the failed run.
        assert!(!dir.path().join("customers_orders_2025-02-09.csv").exists());
    }

    #[tokio::test]
    async fn test_same_date_rerun_overwrites_deterministically() {
        let dir = tempfile::tempdir().unwrap();
        let closed = Arc::new(AtomicBool::new(false));
        let task = ExportTask::new(
            Arc::new(FakeSource {
                records: joined_fixture(),
                fail_fetch: false,
                closed: closed.clone(),
            }),
            dir.path(),
            "customers_orders",
        );
        let ctx = ctx();

        task.run(&ctx).await.unwrap();
        let first = std::fs::read_to_string(dir.path().join("customers_orders_2025-02-09.csv"))
            .unwrap();
        task.run(&ctx).await.unwrap();
        let second = std::fs::read_to_string(dir.path().join("customers_orders_2025-02-09.csv"))
            .unwrap();

        assert_eq!(first, second);
        // Exactly one artifact, no leftovers.
        let count = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_artifact_name_embeds_run_date() {
        let task = ExportTask::new(
            Arc::new(FakeSource {
                records: Vec::new(),
                fail_fetch: false,
                closed: Arc::new(AtomicBool::new(false)),
            }),
            "/out",
            "customers_orders",
        );
        let path = task.artifact_path(NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
        assert_eq!(
            path,
            PathBuf::from("/out/customers_orders_2025-12-31.csv")
        );
    }
}
