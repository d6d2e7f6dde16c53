//! Load stage task
//!
//! Ensures the dataset's table exists, then bulk-loads the staged file.
//! The two load instances target different stores and carry no edge
//! between each other; each depends only on its own extract.

use crate::adapters::staging::StagingArea;
use crate::adapters::store::BulkLoader;
use crate::domain::dataset::DatasetDescriptor;
use crate::domain::result::Result;
use crate::domain::run::RunContext;
use crate::graph::{Task, TaskId};
use async_trait::async_trait;
use std::sync::Arc;

/// Loads one dataset's staged file into its store
pub struct LoadTask {
    id: TaskId,
    descriptor: DatasetDescriptor,
    loader: Arc<dyn BulkLoader>,
    staging: Arc<StagingArea>,
}

impl LoadTask {
    pub fn new(
        descriptor: DatasetDescriptor,
        loader: Arc<dyn BulkLoader>,
        staging: Arc<StagingArea>,
    ) -> Self {
        let id = TaskId::new(format!("load_{}", descriptor.name))
            .expect("dataset names are non-empty");
        Self {
            id,
            descriptor,
            loader,
            staging,
        }
    }
}

#[async_trait]
impl Task for LoadTask {
    fn id(&self) -> &TaskId {
        &self.id
    }

    async fn run(&self, ctx: &RunContext) -> Result<()> {
        let staged = self.staging.staged_path(&self.descriptor.staged_filename);

        tracing::info!(
            dataset = %self.descriptor.name,
            table = %self.descriptor.table.name,
            file = %staged.display(),
            "Loading staged file"
        );

        self.loader.ensure_table().await?;
        let rows = self.loader.load(&staged).await?;

        ctx.metrics
            .record_rows_loaded(self.descriptor.name.clone(), rows);

        Ok(())
    }
}
