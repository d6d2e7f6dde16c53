//! Join/materialize stage task
//!
//! Delegates the cross-store inner join to the configured
//! [`JoinProvider`], which must replace any prior materialization
//! atomically. A failure here blocks Export; the run keeps whatever the
//! loads committed.

use crate::adapters::store::JoinProvider;
use crate::domain::result::Result;
use crate::domain::run::RunContext;
use crate::graph::{Task, TaskId};
use async_trait::async_trait;
use std::sync::Arc;

/// Materializes the customers-orders inner join
pub struct JoinTask {
    id: TaskId,
    provider: Arc<dyn JoinProvider>,
    join_key: String,
}

impl JoinTask {
    pub fn new(provider: Arc<dyn JoinProvider>, join_key: impl Into<String>) -> Self {
        Self {
            id: TaskId::new("join").expect("static id"),
            provider,
            join_key: join_key.into(),
        }
    }
}

#[async_trait]
impl Task for JoinTask {
    fn id(&self) -> &TaskId {
        &self.id
    }

    async fn run(&self, _ctx: &RunContext) -> Result<()> {
        let table_ref = self.provider.materialize(&self.join_key).await?;

        tracing::info!(
            table = %table_ref.table,
            join_key = %self.join_key,
            "Join materialized"
        );

        Ok(())
    }
}
