//! Pipeline coordinator - wires the task graph for one run
//!
//! Builds the capabilities once from configuration, then per run wires
//! the seven tasks into the graph:
//!
//! ```text
//! extract_customers ─► load_customers ─┬─► archive
//! extract_orders    ─► load_orders    ─┤
//!                                      └─► join ─► export
//! ```
//!
//! Archive and join both wait on the load barrier; no edge orders them
//! against each other.

use crate::adapters::postgres::{
    ForeignTableJoin, MergeJoin, PostgresBulkLoader, PostgresJoinedSource, StoreClient,
};
use crate::adapters::source::{HttpFetcher, SourceFetcher};
use crate::adapters::staging::StagingArea;
use crate::adapters::store::{BulkLoader, JoinProvider, JoinedSource};
use crate::config::{JoinProviderKind, PipelineConfig};
use crate::core::pipeline::archive::ArchiveTask;
use crate::core::pipeline::export::ExportTask;
use crate::core::pipeline::extract::ExtractTask;
use crate::core::pipeline::join::JoinTask;
use crate::core::pipeline::load::LoadTask;
use crate::core::pipeline::summary::RunSummary;
use crate::domain::dataset::{DatasetDescriptor, TableSpec};
use crate::domain::errors::PipelineError;
use crate::domain::ids::{DatasetName, TableName};
use crate::domain::result::Result;
use crate::domain::run::{Milestone, RunContext, RunState};
use crate::graph::{ExecutionReport, GraphExecutor, Task, TaskGraph, TaskId};
use chrono::NaiveDate;
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

/// Join key between the two datasets
const JOIN_KEY: &str = "customer_id";

/// Builds and executes the pipeline graph
pub struct PipelineCoordinator {
    customers: DatasetDescriptor,
    orders: DatasetDescriptor,
    staging: Arc<StagingArea>,
    fetcher: Arc<dyn SourceFetcher>,
    customers_loader: Arc<dyn BulkLoader>,
    orders_loader: Arc<dyn BulkLoader>,
    join_provider: Arc<dyn JoinProvider>,
    joined_source: Arc<dyn JoinedSource>,
    output_dir: PathBuf,
    filename_prefix: String,
}

impl PipelineCoordinator {
    /// Create a coordinator with production capabilities
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        let (customers, orders) = Self::descriptors(config)?;

        let staging = Arc::new(StagingArea::new(
            &config.staging.intake_dir,
            &config.staging.archive_dir,
        ));
        let fetcher: Arc<dyn SourceFetcher> = Arc::new(HttpFetcher::new(&config.http)?);

        let customers_client = Arc::new(StoreClient::new(config.stores.customers.clone())?);
        let orders_client = Arc::new(StoreClient::new(config.stores.orders.clone())?);

        let customers_loader: Arc<dyn BulkLoader> = Arc::new(PostgresBulkLoader::new(
            customers_client.clone(),
            customers.table.clone(),
        ));
        let orders_loader: Arc<dyn BulkLoader> = Arc::new(PostgresBulkLoader::new(
            orders_client.clone(),
            orders.table.clone(),
        ));

        let materialized_table = TableName::new(config.join.materialized_table.clone())
            .map_err(PipelineError::Configuration)?;

        let join_provider: Arc<dyn JoinProvider> = match config.join.provider {
            JoinProviderKind::ForeignTable => {
                let linkage = config.join.linkage.clone().ok_or_else(|| {
                    PipelineError::Configuration(
                        "join.linkage is required for the foreign_table provider".to_string(),
                    )
                })?;
                Arc::new(ForeignTableJoin::new(
                    orders_client.clone(),
                    customers.table.clone(),
                    orders.table.name.clone(),
                    TableName::new(config.join.server_name.clone())
                        .map_err(PipelineError::Configuration)?,
                    TableName::new(config.join.foreign_table.clone())
                        .map_err(PipelineError::Configuration)?,
                    materialized_table.clone(),
                    linkage,
                ))
            }
            JoinProviderKind::Merge => Arc::new(MergeJoin::new(
                customers_client,
                orders_client,
                customers.table.name.clone(),
                orders.table.name.clone(),
                materialized_table.clone(),
            )),
        };

        let joined_source: Arc<dyn JoinedSource> = Arc::new(PostgresJoinedSource::new(
            config.stores.orders.clone(),
            materialized_table,
        ));

        Ok(Self {
            customers,
            orders,
            staging,
            fetcher,
            customers_loader,
            orders_loader,
            join_provider,
            joined_source,
            output_dir: PathBuf::from(&config.export.output_dir),
            filename_prefix: config.export.filename_prefix.clone(),
        })
    }

    /// Create a coordinator with injected capabilities
    ///
    /// The seam the integration tests use: same wiring, fake transports
    /// and stores.
    #[allow(clippy::too_many_arguments)]
    pub fn with_capabilities(
        customers: DatasetDescriptor,
        orders: DatasetDescriptor,
        staging: Arc<StagingArea>,
        fetcher: Arc<dyn SourceFetcher>,
        customers_loader: Arc<dyn BulkLoader>,
        orders_loader: Arc<dyn BulkLoader>,
        join_provider: Arc<dyn JoinProvider>,
        joined_source: Arc<dyn JoinedSource>,
        output_dir: impl Into<PathBuf>,
        filename_prefix: impl Into<String>,
    ) -> Self {
        Self {
            customers,
            orders,
            staging,
            fetcher,
            customers_loader,
            orders_loader,
            join_provider,
            joined_source,
            output_dir: output_dir.into(),
            filename_prefix: filename_prefix.into(),
        }
    }

    /// Resolve the two dataset descriptors from configuration
    fn descriptors(config: &PipelineConfig) -> Result<(DatasetDescriptor, DatasetDescriptor)> {
        let customers_url = Url::parse(&config.sources.customers.url).map_err(|e| {
            PipelineError::Configuration(format!("sources.customers.url: {e}"))
        })?;
        let orders_url = Url::parse(&config.sources.orders.url)
            .map_err(|e| PipelineError::Configuration(format!("sources.orders.url: {e}")))?;

        let customers_table = TableName::new(config.stores.customers.table.clone())
            .map_err(PipelineError::Configuration)?;
        let orders_table = TableName::new(config.stores.orders.table.clone())
            .map_err(PipelineError::Configuration)?;

        let customers = DatasetDescriptor::new(
            DatasetName::new("customers").expect("static name"),
            customers_url,
            config.sources.customers.filename.clone(),
            TableSpec::customers(customers_table),
        );
        let orders = DatasetDescriptor::new(
            DatasetName::new("orders").expect("static name"),
            orders_url,
            config.sources.orders.filename.clone(),
            TableSpec::orders(orders_table),
        );
        Ok((customers, orders))
    }

    /// Wire the seven tasks and their edges
    pub fn build_graph(&self) -> Result<TaskGraph> {
        let extract_customers = Arc::new(ExtractTask::new(
            self.customers.clone(),
            self.fetcher.clone(),
            self.staging.clone(),
        ));
        let extract_orders = Arc::new(ExtractTask::new(
            self.orders.clone(),
            self.fetcher.clone(),
            self.staging.clone(),
        ));
        let load_customers = Arc::new(LoadTask::new(
            self.customers.clone(),
            self.customers_loader.clone(),
            self.staging.clone(),
        ));
        let load_orders = Arc::new(LoadTask::new(
            self.orders.clone(),
            self.orders_loader.clone(),
            self.staging.clone(),
        ));
        let archive = Arc::new(ArchiveTask::new(
            vec![
                self.customers.staged_filename.clone(),
                self.orders.staged_filename.clone(),
            ],
            self.staging.clone(),
        ));
        let join = Arc::new(JoinTask::new(self.join_provider.clone(), JOIN_KEY));
        let export = Arc::new(ExportTask::new(
            self.joined_source.clone(),
            self.output_dir.clone(),
            self.filename_prefix.clone(),
        ));

        let extract_customers_id = extract_customers.id().clone();
        let extract_orders_id = extract_orders.id().clone();
        let load_customers_id = load_customers.id().clone();
        let load_orders_id = load_orders.id().clone();
        let archive_id = archive.id().clone();
        let join_id = join.id().clone();
        let export_id = export.id().clone();

        let mut graph = TaskGraph::new();
        graph.add_task(extract_customers)?;
        graph.add_task(extract_orders)?;
        graph.add_task(load_customers)?;
        graph.add_task(load_orders)?;
        graph.add_task(archive)?;
        graph.add_task(join)?;
        graph.add_task(export)?;

        // Each load waits only on its matching extract.
        graph.add_dependency(&load_customers_id, &extract_customers_id)?;
        graph.add_dependency(&load_orders_id, &extract_orders_id)?;

        // Barrier: both loads gate archive and join alike.
        for downstream in [&archive_id, &join_id] {
            graph.add_dependency(downstream, &load_customers_id)?;
            graph.add_dependency(downstream, &load_orders_id)?;
        }

        graph.add_dependency(&export_id, &join_id)?;

        Ok(graph)
    }

    /// Topological order with each task's dependencies, for display
    pub fn plan(&self) -> Result<Vec<(TaskId, Vec<TaskId>)>> {
        let graph = self.build_graph()?;
        let order = graph.validate()?;
        Ok(order
            .into_iter()
            .map(|id| {
                let deps = graph.dependencies_of(&id).to_vec();
                (id, deps)
            })
            .collect())
    }

    /// Execute one run for a logical date
    pub async fn execute_run(&self, run_date: NaiveDate) -> Result<RunSummary> {
        self.staging.ensure_directories().await?;
        tokio::fs::create_dir_all(&self.output_dir).await.map_err(|e| {
            PipelineError::Configuration(format!(
                "Failed to create output directory {}: {e}",
                self.output_dir.display()
            ))
        })?;

        let ctx = RunContext::new(run_date);
        tracing::info!(
            run_id = %ctx.run_id,
            run_date = %run_date,
            "Starting pipeline run"
        );

        let graph = self.build_graph()?;
        let report = GraphExecutor::new().execute(&graph, &ctx).await?;
        let state = self.fold_state(&report)?;

        let summary = RunSummary {
            run_id: ctx.run_id,
            run_date,
            phase: state.phase(),
            success: report.is_success(),
            task_outcomes: report
                .outcomes()
                .map(|(id, outcome)| (id.clone(), outcome.clone()))
                .collect(),
            metrics: ctx.metrics.snapshot(),
            duration: report.duration(),
        };

        summary.log_summary();
        Ok(summary)
    }

    /// Fold task outcomes into the run state lattice
    fn fold_state(&self, report: &ExecutionReport) -> Result<RunState> {
        let succeeded = |name: &str| {
            let id = TaskId::new(name).expect("static name");
            report
                .outcome(&id)
                .map(|outcome| outcome.is_success())
                .unwrap_or(false)
        };

        let mut state = RunState::new();
        if succeeded("extract_customers") && succeeded("extract_orders") {
            state.record(Milestone::Extracted)?;
        }
        if succeeded("load_customers") && succeeded("load_orders") {
            state.record(Milestone::Loaded)?;
        }
        if succeeded("archive") {
            state.record(Milestone::Archived)?;
        }
        if succeeded("join") {
            state.record(Milestone::Joined)?;
        }
        if succeeded("export") {
            state.record(Milestone::Exported)?;
        }
        Ok(state)
    }
}
