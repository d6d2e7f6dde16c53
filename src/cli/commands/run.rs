//! Run command implementation
//!
//! Executes one pipeline run for a logical date. The surrounding batch
//! runner (cron, systemd timer) invokes this once per scheduled day;
//! retry and overlap prevention are its job, not ours.

use crate::config::load_config;
use crate::core::pipeline::PipelineCoordinator;
use chrono::{Local, NaiveDate};
use clap::Args;

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Logical run date (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub date: Option<String>,
}

impl RunArgs {
    /// Execute the run command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Starting run command");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Configuration error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        let run_date = match &self.date {
            Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                Ok(date) => date,
                Err(e) => {
                    tracing::error!(date = %raw, error = %e, "Invalid run date");
                    eprintln!("Invalid --date '{raw}': expected YYYY-MM-DD");
                    return Ok(2);
                }
            },
            None => Local::now().date_naive(),
        };

        let coordinator = PipelineCoordinator::new(&config)?;
        let summary = coordinator.execute_run(run_date).await?;

        println!("Run {} for {}", summary.run_id, summary.run_date);
        println!("  Phase reached: {}", summary.phase);
        for (task, outcome) in &summary.task_outcomes {
            println!("  {task}: {outcome}");
        }
        if let Some(artifact) = &summary.metrics.artifact_path {
            println!("  Artifact: {}", artifact.display());
        }

        if summary.success {
            println!("✅ Run completed");
            Ok(0)
        } else {
            println!("❌ Run failed");
            Ok(1) // Run failure exit code
        }
    }
}
