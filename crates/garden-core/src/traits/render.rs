//! Render dispatcher contract

use crate::graph::NoteGraph;
use async_trait::async_trait;
use std::path::PathBuf;

/// What a render run produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderSummary {
    /// Registry entries rendered
    pub rendered: usize,
    /// Files written
    pub outputs: Vec<PathBuf>,
}

/// Consumer of the closed graph
///
/// Emits one output per registry entry, choosing the template from
/// [`Note::template`](crate::note::Note::template). Implementations should
/// obtain notes through [`NoteGraph::closed_notes`], which refuses to hand
/// out a graph that is still being built.
#[async_trait]
pub trait RenderDispatcher: Send + Sync {
    /// Render every note of `graph`
    async fn render(&self, graph: &NoteGraph) -> anyhow::Result<RenderSummary>;
}
