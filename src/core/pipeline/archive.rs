//! Archive stage task
//!
//! Relocates both staged files out of the intake directory once both
//! loads committed. This is the run's completion marker for the intake
//! side: a file that is still in the intake directory has not been
//! consumed. Archive must be the last consumer of staged files, which is
//! why it sits behind the load barrier instead of running alongside it.

use crate::adapters::staging::StagingArea;
use crate::domain::result::Result;
use crate::domain::run::RunContext;
use crate::graph::{Task, TaskId};
use async_trait::async_trait;
use std::sync::Arc;

/// Moves consumed staged files into the archive directory
pub struct ArchiveTask {
    id: TaskId,
    staged_filenames: Vec<String>,
    staging: Arc<StagingArea>,
}

impl ArchiveTask {
    pub fn new(staged_filenames: Vec<String>, staging: Arc<StagingArea>) -> Self {
        Self {
            id: TaskId::new("archive").expect("static id"),
            staged_filenames,
            staging,
        }
    }
}

#[async_trait]
impl Task for ArchiveTask {
    fn id(&self) -> &TaskId {
        &self.id
    }

    async fn run(&self, ctx: &RunContext) -> Result<()> {
        for filename in &self.staged_filenames {
            let staged = self.staging.staged_path(filename);
            self.staging.archive(&staged).await?;
            ctx.metrics.record_archived_file();
        }

        tracing::info!(
            files = self.staged_filenames.len(),
            "Intake directory cleared"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ctx() -> RunContext {
        RunContext::new(NaiveDate::from_ymd_opt(2025, 2, 9).unwrap())
    }

    #[tokio::test]
    async fn test_archive_moves_all_staged_files() {
        let dir = tempfile::tempdir().unwrap();
        let staging = Arc::new(StagingArea::new(
            dir.path().join("intake"),
            dir.path().join("archive"),
        ));
        staging.ensure_directories().await.unwrap();
        for name in ["customers.csv", "orders.csv"] {
            tokio::fs::write(staging.staged_path(name), "rows")
                .await
                .unwrap();
        }

        let task = ArchiveTask::new(
            vec!["customers.csv".to_string(), "orders.csv".to_string()],
            staging.clone(),
        );
        let ctx = ctx();
        task.run(&ctx).await.unwrap();

        assert!(!staging.staged_path("customers.csv").exists());
        assert!(!staging.staged_path("orders.csv").exists());
        assert!(dir.path().join("archive").join("orders.csv").exists());
        assert_eq!(ctx.metrics.snapshot().files_archived, 2);
    }

    #[tokio::test]
    async fn test_archive_fails_when_staged_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let staging = Arc::new(StagingArea::new(
            dir.path().join("intake"),
            dir.path().join("archive"),
        ));
        staging.ensure_directories().await.unwrap();

        let task = ArchiveTask::new(vec!["customers.csv".to_string()], staging);
        assert!(task.run(&ctx()).await.is_err());
    }
}
