//! Graph error taxonomy
//!
//! Per-note problems (bad frontmatter, encoding errors, enrichment failures)
//! never surface here; they are recorded on the note. These are the structural
//! errors that end a build.

use crate::graph::GraphPhase;
use std::path::PathBuf;
use thiserror::Error;

/// Build-fatal graph errors
#[derive(Debug, Error)]
pub enum GraphError {
    /// Two distinct source files map to the same canonical URL (strict mode)
    #[error("URL collision on {url}: '{first}' and '{second}' map to the same page")]
    UrlCollision {
        /// Contested URL
        url: String,
        /// Path that already owned the URL
        first: PathBuf,
        /// Path that tried to claim it
        second: PathBuf,
    },

    /// An operation ran in the wrong build phase
    #[error("{operation} is not allowed during the {phase} phase")]
    PhaseViolation {
        /// Operation attempted
        operation: &'static str,
        /// Phase the graph was in
        phase: GraphPhase,
    },

    /// The registry contract was broken (unparsed source note, duplicate entry)
    #[error("Registry invariant violated: {0}")]
    InvariantViolation(String),

    /// The build was cancelled before the graph closed
    #[error("Build cancelled after {completed} of {scheduled} notes")]
    Cancelled {
        /// Notes fully processed before cancellation
        completed: usize,
        /// Notes discovered
        scheduled: usize,
    },
}

/// Result type for graph operations
pub type GraphResult<T> = Result<T, GraphError>;

impl GraphError {
    /// Create an invariant violation error
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }
}
