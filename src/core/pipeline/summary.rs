//! Run summary and reporting
//!
//! One [`RunSummary`] per scheduled run: the furthest milestone reached,
//! per-task outcomes, and the metrics the tasks recorded along the way.

use crate::domain::run::MetricsSnapshot;
use crate::graph::{TaskId, TaskOutcome};
use chrono::NaiveDate;
use std::time::Duration;
use uuid::Uuid;

/// Summary of one pipeline run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Unique id of the run
    pub run_id: Uuid,

    /// Logical run date
    pub run_date: NaiveDate,

    /// Furthest milestone reached (PENDING .. EXPORTED)
    pub phase: &'static str,

    /// True when every task succeeded
    pub success: bool,

    /// Per-task outcomes in graph order
    pub task_outcomes: Vec<(TaskId, TaskOutcome)>,

    /// Metrics recorded by the tasks
    pub metrics: MetricsSnapshot,

    /// Wall-clock duration of the run
    pub duration: Duration,
}

impl RunSummary {
    /// Tasks that failed
    pub fn failed_tasks(&self) -> Vec<&TaskId> {
        self.task_outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_failure())
            .map(|(id, _)| id)
            .collect()
    }

    /// Tasks skipped because a dependency did not succeed
    pub fn skipped_tasks(&self) -> Vec<&TaskId> {
        self.task_outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_skipped())
            .map(|(id, _)| id)
            .collect()
    }

    /// Log the summary
    pub fn log_summary(&self) {
        let rows_loaded: u64 = self.metrics.rows_loaded.values().sum();
        tracing::info!(
            run_id = %self.run_id,
            run_date = %self.run_date,
            phase = self.phase,
            success = self.success,
            rows_loaded,
            rows_exported = self.metrics.rows_exported,
            files_archived = self.metrics.files_archived,
            duration_secs = self.duration.as_secs(),
            "Run completed"
        );

        if let Some(artifact) = &self.metrics.artifact_path {
            tracing::info!(artifact = %artifact.display(), "Export artifact");
        }

        if !self.success {
            tracing::warn!(
                failed = ?self.failed_tasks(),
                skipped = ?self.skipped_tasks(),
                "Run completed with failures"
            );
            for (id, outcome) in &self.task_outcomes {
                if !outcome.is_success() {
                    tracing::warn!(task = %id, outcome = %outcome, "Task did not succeed");
                }
            }
        }
    }
}
