//! Version-control metadata provider

use crate::note::EditHistory;
use async_trait::async_trait;
use std::path::Path;

/// Source of creation date, last modification date and edit count for a file
///
/// Calls may be slow (one subprocess per file for git). Implementations
/// return an error for anything they cannot answer; the enrichment pool turns
/// errors and timeouts into [`EditHistory::unknown`].
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    /// Look up the history of `path` (absolute, or relative to the process cwd)
    async fn history(&self, path: &Path) -> anyhow::Result<EditHistory>;

    /// Provider name for logs
    fn name(&self) -> &'static str;
}
