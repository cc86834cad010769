//! Pipeline error types

use garden_core::GraphError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that end a build
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Structural graph error (strict collision, phase or invariant violation, cancellation)
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// The content root is missing or not a directory
    #[error("Content root {0} is not a directory")]
    ContentRoot(PathBuf),

    /// Configuration could not be applied
    #[error(transparent)]
    Config(#[from] garden_config::ConfigError),

    /// The HTTP client for external link checks could not be built
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// A discovery task panicked
    #[error("Discovery task failed: {0}")]
    Task(String),
}

impl PipelineError {
    /// Whether the build ended because it was cancelled
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Graph(GraphError::Cancelled { .. }))
    }
}

/// Result alias for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;
