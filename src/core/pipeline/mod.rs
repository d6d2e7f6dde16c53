//! The pipeline: stage tasks, coordinator, and run summary
//!
//! Five stage types implement [`crate::graph::Task`]; the coordinator
//! wires them into the dependency graph and folds the execution report
//! into the run state lattice.

pub mod archive;
pub mod coordinator;
pub mod export;
pub mod extract;
pub mod join;
pub mod load;
pub mod summary;

// Re-export commonly used types
pub use archive::ArchiveTask;
pub use coordinator::PipelineCoordinator;
pub use export::ExportTask;
pub use extract::ExtractTask;
pub use join::JoinTask;
pub use load::LoadTask;
pub use summary::RunSummary;
