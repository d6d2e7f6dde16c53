//! Per-run context, metrics and the run state machine
//!
//! A run is one scheduled invocation of the pipeline for a logical date.
//! [`RunContext`] travels through every task; [`RunState`] tracks the
//! milestone lattice `PENDING → EXTRACTED → LOADED → {ARCHIVED, JOINED} →
//! EXPORTED`. Archive and Export are independent branches off the same
//! fan-in point; neither gates the other.

use crate::domain::errors::PipelineError;
use crate::domain::ids::DatasetName;
use crate::domain::result::Result;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Shared context handed to every task of one run
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Unique id of this run
    pub run_id: Uuid,

    /// Logical run date; names the export artifact
    pub run_date: NaiveDate,

    /// Metrics accumulated by tasks as they complete
    pub metrics: RunMetrics,
}

impl RunContext {
    pub fn new(run_date: NaiveDate) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            run_date,
            metrics: RunMetrics::new(),
        }
    }
}

/// Metrics shared between concurrently running tasks
///
/// Tasks may run on different tokio workers, so the inner state sits
/// behind a mutex. Lock scopes are single updates.
#[derive(Debug, Clone, Default)]
pub struct RunMetrics {
    inner: Arc<Mutex<MetricsInner>>,
}

#[derive(Debug, Default)]
struct MetricsInner {
    rows_loaded: HashMap<DatasetName, u64>,
    rows_exported: Option<u64>,
    artifact_path: Option<PathBuf>,
    files_archived: u64,
}

/// Point-in-time copy of the run metrics
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    pub rows_loaded: HashMap<DatasetName, u64>,
    pub rows_exported: Option<u64>,
    pub artifact_path: Option<PathBuf>,
    pub files_archived: u64,
}

impl RunMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the row count a Load task committed for a dataset
    pub fn record_rows_loaded(&self, dataset: DatasetName, rows: u64) {
        let mut inner = self.inner.lock().expect("metrics mutex poisoned");
        inner.rows_loaded.insert(dataset, rows);
    }

    /// Records the Export result: row count and artifact location
    pub fn record_export(&self, rows: u64, artifact: PathBuf) {
        let mut inner = self.inner.lock().expect("metrics mutex poisoned");
        inner.rows_exported = Some(rows);
        inner.artifact_path = Some(artifact);
    }

    /// Records one staged file moved to the archive directory
    pub fn record_archived_file(&self) {
        let mut inner = self.inner.lock().expect("metrics mutex poisoned");
        inner.files_archived += 1;
    }

    /// Returns a copy of the current metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        let inner = self.inner.lock().expect("metrics mutex poisoned");
        MetricsSnapshot {
            rows_loaded: inner.rows_loaded.clone(),
            rows_exported: inner.rows_exported,
            artifact_path: inner.artifact_path.clone(),
            files_archived: inner.files_archived,
        }
    }
}

/// Milestones of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Milestone {
    /// Both source files staged
    Extracted,
    /// Both tables loaded
    Loaded,
    /// Staged files relocated out of the intake directory
    Archived,
    /// Joined table materialized
    Joined,
    /// Artifact written
    Exported,
}

/// Run state lattice with prerequisite checking
///
/// Recording a milestone whose prerequisite has not been met is an error;
/// recording the same milestone twice is an error. A run that stops short
/// of `Exported` is a failed run regardless of which branch completed.
#[derive(Debug, Clone, Default)]
pub struct RunState {
    extracted: bool,
    loaded: bool,
    archived: bool,
    joined: bool,
    exported: bool,
}

impl RunState {
    /// A fresh run in the PENDING state
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a milestone, enforcing the lattice ordering
    pub fn record(&mut self, milestone: Milestone) -> Result<()> {
        let (slot, prerequisite_met, requires) = match milestone {
            Milestone::Extracted => (&mut self.extracted, true, "PENDING"),
            Milestone::Loaded => (&mut self.loaded, self.extracted, "EXTRACTED"),
            Milestone::Archived => (&mut self.archived, self.loaded, "LOADED"),
            Milestone::Joined => (&mut self.joined, self.loaded, "LOADED"),
            Milestone::Exported => (&mut self.exported, self.joined, "JOINED"),
        };
        if !prerequisite_met {
            return Err(PipelineError::RunState(format!(
                "Cannot record {milestone:?} before {requires}"
            )));
        }
        if *slot {
            return Err(PipelineError::RunState(format!(
                "Milestone {milestone:?} already recorded"
            )));
        }
        *slot = true;
        Ok(())
    }

    pub fn is_extracted(&self) -> bool {
        self.extracted
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_archived(&self) -> bool {
        self.archived
    }

    pub fn is_joined(&self) -> bool {
        self.joined
    }

    pub fn is_exported(&self) -> bool {
        self.exported
    }

    /// Human-readable name of the furthest milestone reached
    pub fn phase(&self) -> &'static str {
        if self.exported {
            "EXPORTED"
        } else if self.joined {
            "JOINED"
        } else if self.archived {
            "ARCHIVED"
        } else if self.loaded {
            "LOADED"
        } else if self.extracted {
            "EXTRACTED"
        } else {
            "PENDING"
        }
    }
}
