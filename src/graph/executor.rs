//! Concurrent graph execution with failure-skip propagation
//!
//! The executor releases a task only once every one of its dependencies
//! succeeded (causal ordering); independent ready tasks run concurrently
//! as tokio tasks. When a task fails, every transitive dependent is
//! marked [`TaskOutcome::Skipped`] — it never runs, and the report says
//! why. There is no retry loop here; re-execution is the external
//! runner's policy.

use crate::domain::errors::PipelineError;
use crate::domain::result::Result;
use crate::domain::run::RunContext;
use crate::graph::plan::TaskGraph;
use crate::graph::task::{TaskId, TaskOutcome};
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

/// Outcome of executing a whole graph
#[derive(Debug, Clone)]
pub struct ExecutionReport {
    order: Vec<TaskId>,
    outcomes: HashMap<TaskId, TaskOutcome>,
    duration: Duration,
}

impl ExecutionReport {
    /// Outcome of a single task
    pub fn outcome(&self, id: &TaskId) -> Option<&TaskOutcome> {
        self.outcomes.get(id)
    }

    /// True when every task succeeded
    pub fn is_success(&self) -> bool {
        self.outcomes.values().all(TaskOutcome::is_success)
    }

    /// Task outcomes in graph insertion order
    pub fn outcomes(&self) -> impl Iterator<Item = (&TaskId, &TaskOutcome)> {
        self.order
            .iter()
            .filter_map(|id| self.outcomes.get(id).map(|outcome| (id, outcome)))
    }

    /// Ids of tasks that failed
    pub fn failed(&self) -> Vec<&TaskId> {
        self.order
            .iter()
            .filter(|id| self.outcomes[*id].is_failure())
            .collect()
    }

    /// Ids of tasks skipped because a dependency did not succeed
    pub fn skipped(&self) -> Vec<&TaskId> {
        self.order
            .iter()
            .filter(|id| self.outcomes[*id].is_skipped())
            .collect()
    }

    /// Wall-clock duration of the whole execution
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

/// Executes a validated [`TaskGraph`] on the tokio runtime
#[derive(Debug, Default)]
pub struct GraphExecutor;

impl GraphExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Runs the graph to completion
    ///
    /// Every task ends with exactly one outcome. The returned error is
    /// reserved for executor-level faults (invalid graph, task panic);
    /// ordinary task failures are reported through the outcomes.
    pub async fn execute(&self, graph: &TaskGraph, ctx: &RunContext) -> Result<ExecutionReport> {
        // Validation doubles as the cycle check.
        graph.validate()?;

        let start = Instant::now();
        let mut outcomes: HashMap<TaskId, TaskOutcome> = HashMap::new();
        let mut spawned: HashSet<TaskId> = HashSet::new();
        let mut running: JoinSet<(TaskId, Result<()>)> = JoinSet::new();

        self.schedule(graph, ctx, &mut outcomes, &mut spawned, &mut running);

        while let Some(joined) = running.join_next().await {
            let (id, result) = joined
                .map_err(|e| PipelineError::Graph(format!("Task panicked: {e}")))?;

            match result {
                Ok(()) => {
                    tracing::debug!(task = %id, "Task succeeded");
                    outcomes.insert(id, TaskOutcome::Succeeded);
                }
                Err(e) => {
                    tracing::error!(task = %id, error = %e, "Task failed");
                    outcomes.insert(id, TaskOutcome::Failed(e.to_string()));
                }
            }

            self.schedule(graph, ctx, &mut outcomes, &mut spawned, &mut running);
        }

        Ok(ExecutionReport {
            order: graph.task_ids().to_vec(),
            outcomes,
            duration: start.elapsed(),
        })
    }

    /// Spawns every task whose dependencies all succeeded and marks
    /// skipped every task with a failed or skipped dependency. Runs to a
    /// fixpoint so skip marks cascade through chains in one pass.
    fn schedule(
        &self,
        graph: &TaskGraph,
        ctx: &RunContext,
        outcomes: &mut HashMap<TaskId, TaskOutcome>,
        spawned: &mut HashSet<TaskId>,
        running: &mut JoinSet<(TaskId, Result<()>)>,
    ) {
        loop {
            let mut changed = false;

            for id in graph.task_ids() {
                if spawned.contains(id) || outcomes.contains_key(id) {
                    continue;
                }

                let deps = graph.dependencies_of(id);
                let blocker = deps.iter().find(|dep| {
                    outcomes
                        .get(*dep)
                        .map(|outcome| !outcome.is_success())
                        .unwrap_or(false)
                });

                if let Some(blocked_by) = blocker {
                    tracing::warn!(
                        task = %id,
                        blocked_by = %blocked_by,
                        "Skipping task: dependency did not succeed"
                    );
                    outcomes.insert(
                        id.clone(),
                        TaskOutcome::Skipped {
                            blocked_by: blocked_by.clone(),
                        },
                    );
                    changed = true;
                    continue;
                }

                let ready = deps
                    .iter()
                    .all(|dep| outcomes.get(dep).map(TaskOutcome::is_success).unwrap_or(false));
                if ready {
                    let task = graph.task(id).expect("validated graph");
                    let ctx = ctx.clone();
                    let task_id = id.clone();
                    tracing::debug!(task = %task_id, "Starting task");
                    running.spawn(async move {
                        let result = task.run(&ctx).await;
                        (task_id, result)
                    });
                    spawned.insert(id.clone());
                    changed = true;
                }
            }

            if !changed {
                break;
            }
        }
    }
}
