//! Plan command implementation
//!
//! Prints the task graph in topological order with each task's
//! dependencies, without executing anything.

use crate::config::load_config;
use crate::core::pipeline::PipelineCoordinator;
use clap::Args;

/// Arguments for the plan command
#[derive(Args, Debug)]
pub struct PlanArgs {}

impl PlanArgs {
    /// Execute the plan command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Printing pipeline plan");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Configuration error: {e}");
                return Ok(2);
            }
        };

        let coordinator = PipelineCoordinator::new(&config)?;
        let plan = coordinator.plan()?;

        println!("Pipeline plan ({} tasks):", plan.len());
        for (task, deps) in &plan {
            if deps.is_empty() {
                println!("  {task}");
            } else {
                let deps: Vec<String> = deps.iter().map(|d| d.to_string()).collect();
                println!("  {task}  (after: {})", deps.join(", "));
            }
        }

        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_config_is_configuration_error() {
        let args = PlanArgs {};
        let code = args.execute("does-not-exist.toml").await.unwrap();
        assert_eq!(code, 2);
    }
}
