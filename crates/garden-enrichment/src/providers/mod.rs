//! History provider backends

mod filesystem;
mod git;

pub use filesystem::FilesystemHistoryProvider;
pub use git::{parse_log, GitHistoryProvider};

use async_trait::async_trait;
use garden_core::{EditHistory, HistoryProvider};
use std::path::Path;

/// [`HistoryProvider`] that knows nothing; every note gets the default
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHistoryProvider;

#[async_trait]
impl HistoryProvider for NoHistoryProvider {
    async fn history(&self, _path: &Path) -> anyhow::Result<EditHistory> {
        Ok(EditHistory::unknown())
    }

    fn name(&self) -> &'static str {
        "none"
    }
}
