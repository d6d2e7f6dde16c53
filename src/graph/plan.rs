//! Task graph construction and validation
//!
//! A [`TaskGraph`] is a set of tasks plus dependency edges. Construction
//! rejects duplicate ids, unknown ids and self-edges; [`TaskGraph::validate`]
//! rejects cycles and produces a deterministic topological order.

use crate::domain::errors::PipelineError;
use crate::domain::result::Result;
use crate::graph::task::{Task, TaskId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// A directed acyclic graph of tasks
///
/// Fan-out is a task with several dependents; fan-in (a barrier) is a
/// task with several dependencies. Both are plain edges here — barrier
/// semantics are enforced by the executor, which releases a task only
/// after every dependency succeeded.
#[derive(Default)]
pub struct TaskGraph {
    tasks: HashMap<TaskId, Arc<dyn Task>>,
    dependencies: HashMap<TaskId, Vec<TaskId>>,
    // Insertion order keeps validation output and scheduling deterministic.
    order: Vec<TaskId>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a task node
    ///
    /// # Errors
    ///
    /// Returns an error if a task with the same id is already present.
    pub fn add_task(&mut self, task: Arc<dyn Task>) -> Result<()> {
        let id = task.id().clone();
        if self.tasks.contains_key(&id) {
            return Err(PipelineError::Graph(format!(
                "Duplicate task id: {id}"
            )));
        }
        self.order.push(id.clone());
        self.dependencies.entry(id.clone()).or_default();
        self.tasks.insert(id, task);
        Ok(())
    }

    /// Declares that `task` must not start before `depends_on` succeeded
    ///
    /// # Errors
    ///
    /// Returns an error if either id is unknown or the edge is a self-edge.
    pub fn add_dependency(&mut self, task: &TaskId, depends_on: &TaskId) -> Result<()> {
        if !self.tasks.contains_key(task) {
            return Err(PipelineError::Graph(format!("Unknown task: {task}")));
        }
        if !self.tasks.contains_key(depends_on) {
            return Err(PipelineError::Graph(format!(
                "Unknown dependency: {depends_on}"
            )));
        }
        if task == depends_on {
            return Err(PipelineError::Graph(format!(
                "Task {task} cannot depend on itself"
            )));
        }
        let deps = self.dependencies.get_mut(task).expect("task present");
        if !deps.contains(depends_on) {
            deps.push(depends_on.clone());
        }
        Ok(())
    }

    /// Looks up a task by id
    pub fn task(&self, id: &TaskId) -> Option<Arc<dyn Task>> {
        self.tasks.get(id).cloned()
    }

    /// Dependencies of a task, in declaration order
    pub fn dependencies_of(&self, id: &TaskId) -> &[TaskId] {
        self.dependencies
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Tasks that directly depend on `id`, in insertion order
    pub fn dependents_of(&self, id: &TaskId) -> Vec<TaskId> {
        self.order
            .iter()
            .filter(|candidate| self.dependencies_of(candidate).contains(id))
            .cloned()
            .collect()
    }

    /// All task ids in insertion order
    pub fn task_ids(&self) -> &[TaskId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Validates the graph and returns a topological order
    ///
    /// Kahn's algorithm over the insertion order, so the returned order
    /// is stable for a given construction sequence.
    ///
    /// # Errors
    ///
    /// Returns an error naming the tasks stuck on a cycle.
    pub fn validate(&self) -> Result<Vec<TaskId>> {
        let mut indegree: HashMap<&TaskId, usize> = self
            .order
            .iter()
            .map(|id| (id, self.dependencies_of(id).len()))
            .collect();

        let mut sorted = Vec::with_capacity(self.order.len());
        let mut done: HashSet<&TaskId> = HashSet::new();

        while sorted.len() < self.order.len() {
            let next = self
                .order
                .iter()
                .find(|id| !done.contains(id) && indegree[*id] == 0);

            let Some(id) = next else {
                let stuck: Vec<String> = self
                    .order
                    .iter()
                    .filter(|id| !done.contains(id))
                    .map(|id| id.to_string())
                    .collect();
                return Err(PipelineError::Graph(format!(
                    "Dependency cycle involving: {}",
                    stuck.join(", ")
                )));
            };

            done.insert(id);
            sorted.push(id.clone());
            for dependent in self.dependents_of(id) {
                if let Some(count) = indegree.get_mut(&dependent) {
                    *count -= 1;
                }
            }
        }

        Ok(sorted)
    }
}
