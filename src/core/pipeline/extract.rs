//! Extract stage task
//!
//! Fetches one source dataset into the intake directory and makes the
//! staged file loader-readable. Transfer failure is fatal for the run;
//! no content validation happens before hand-off to Load.

use crate::adapters::source::SourceFetcher;
use crate::adapters::staging::StagingArea;
use crate::domain::dataset::DatasetDescriptor;
use crate::domain::result::Result;
use crate::domain::run::RunContext;
use crate::graph::{Task, TaskId};
use async_trait::async_trait;
use std::sync::Arc;

/// Fetches one dataset's source file to its staging path
pub struct ExtractTask {
    id: TaskId,
    descriptor: DatasetDescriptor,
    fetcher: Arc<dyn SourceFetcher>,
    staging: Arc<StagingArea>,
}

impl ExtractTask {
    pub fn new(
        descriptor: DatasetDescriptor,
        fetcher: Arc<dyn SourceFetcher>,
        staging: Arc<StagingArea>,
    ) -> Self {
        let id = TaskId::new(format!("extract_{}", descriptor.name))
            .expect("dataset names are non-empty");
        Self {
            id,
            descriptor,
            fetcher,
            staging,
        }
    }
}

#[async_trait]
impl Task for ExtractTask {
    fn id(&self) -> &TaskId {
        &self.id
    }

    async fn run(&self, _ctx: &RunContext) -> Result<()> {
        let dest = self.staging.staged_path(&self.descriptor.staged_filename);

        tracing::info!(
            dataset = %self.descriptor.name,
            url = %self.descriptor.source_url,
            "Extracting source file"
        );

        self.fetcher.fetch(&self.descriptor.source_url, &dest).await?;
        self.staging.make_loader_readable(&dest).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dataset::TableSpec;
    use crate::domain::errors::{PipelineError, SourceError};
    use crate::domain::ids::{DatasetName, TableName};
    use chrono::NaiveDate;
    use std::path::Path;
    use url::Url;

    struct FakeFetcher {
        body: Option<&'static str>,
    }

    #[async_trait]
    impl SourceFetcher for FakeFetcher {
        async fn fetch(&self, _url: &Url, dest: &Path) -> Result<u64> {
            match self.body {
                Some(body) => {
                    tokio::fs::write(dest, body).await.unwrap();
                    Ok(body.len() as u64)
                }
                None => Err(SourceError::ConnectionFailed("unreachable".to_string()).into()),
            }
        }
    }

    fn descriptor() -> DatasetDescriptor {
        DatasetDescriptor::new(
            DatasetName::new("customers").unwrap(),
            Url::parse("https://example.com/customers.csv").unwrap(),
            "customers.csv",
            TableSpec::customers(TableName::new("customers").unwrap()),
        )
    }

    fn ctx() -> RunContext {
        RunContext::new(NaiveDate::from_ymd_opt(2025, 2, 9).unwrap())
    }

    #[tokio::test]
    async fn test_extract_stages_file() {
        let dir = tempfile::tempdir().unwrap();
        let staging = Arc::new(StagingArea::new(
            dir.path().join("intake"),
            dir.path().join("archive"),
        ));
        staging.ensure_directories().await.unwrap();

        let task = ExtractTask::new(
            descriptor(),
            Arc::new(FakeFetcher {
                body: Some("customer_id,customer_name,email,city\n1,A,a@x,NY\n"),
            }),
            staging.clone(),
        );

        assert_eq!(task.id().as_str(), "extract_customers");
        task.run(&ctx()).await.unwrap();

        let staged = staging.staged_path("customers.csv");
        assert!(staged.exists());
    }

    #[tokio::test]
    async fn test_extract_transfer_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let staging = Arc::new(StagingArea::new(
            dir.path().join("intake"),
            dir.path().join("archive"),
        ));
        staging.ensure_directories().await.unwrap();

        let task = ExtractTask::new(descriptor(), Arc::new(FakeFetcher { body: None }), staging);

        let err = task.run(&ctx()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Source(_)));
    }
}
