//! Task node contract
//!
//! A task is one unit of work in the dependency graph: it has an
//! identity, runs to completion or fails within a single invocation, and
//! reports nothing else. Dependencies live in the graph, not in the task.

use crate::domain::result::Result;
use crate::domain::run::RunContext;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Task identifier newtype wrapper
///
/// # Examples
///
/// ```
/// use cartage::graph::TaskId;
///
/// let id = TaskId::new("load_orders").unwrap();
/// assert_eq!(id.as_str(), "load_orders");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(String);

impl TaskId {
    /// Creates a new TaskId from a string
    ///
    /// # Errors
    ///
    /// Returns `Err` if the id is empty.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(crate::domain::PipelineError::Graph(
                "Task id cannot be empty".to_string(),
            ));
        }
        Ok(Self(id))
    }

    /// Returns the task id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = crate::domain::PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// A unit of work in the dependency graph
///
/// Implementations run to completion or fail within one scheduled
/// invocation; there is no suspend/resume and no retry loop inside the
/// task itself.
#[async_trait]
pub trait Task: Send + Sync {
    /// Stable identity of this task within its graph
    fn id(&self) -> &TaskId;

    /// Executes the task
    async fn run(&self, ctx: &RunContext) -> Result<()>;
}

/// Terminal outcome of one task within one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Task ran and returned Ok
    Succeeded,

    /// Task ran and returned an error
    Failed(String),

    /// Task never ran because a dependency did not succeed
    Skipped {
        /// The failed or skipped dependency that blocked this task
        blocked_by: TaskId,
    },
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Succeeded)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, TaskOutcome::Failed(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, TaskOutcome::Skipped { .. })
    }
}

impl fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskOutcome::Succeeded => write!(f, "succeeded"),
            TaskOutcome::Failed(message) => write!(f, "failed: {message}"),
            TaskOutcome::Skipped { blocked_by } => {
                write!(f, "skipped (blocked by {blocked_by})")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_id_valid() {
        let id = TaskId::new("extract_customers").unwrap();
        assert_eq!(id.as_str(), "extract_customers");
        assert_eq!(id.to_string(), "extract_customers");
    }

    #[test]
    fn test_task_id_empty_rejected() {
        assert!(TaskId::new("").is_err());
        assert!(TaskId::new("  ").is_err());
    }

    #[test]
    fn test_outcome_predicates() {
        assert!(TaskOutcome::Succeeded.is_success());
        assert!(TaskOutcome::Failed("boom".to_string()).is_failure());
        let skipped = TaskOutcome::Skipped {
            blocked_by: TaskId::new("load_orders").unwrap(),
        };
        assert!(skipped.is_skipped());
        assert!(!skipped.is_success());
    }

    #[test]
    fn test_outcome_display() {
        let skipped = TaskOutcome::Skipped {
            blocked_by: TaskId::new("load_orders").unwrap(),
        };
        assert_eq!(skipped.to_string(), "skipped (blocked by load_orders)");
    }
}
