//! Result type alias for Cartage operations

use super::errors::PipelineError;

/// Result type alias using [`PipelineError`] as the error type
pub type Result<T> = std::result::Result<T, PipelineError>;
