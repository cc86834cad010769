//! Filesystem timestamp history

use crate::error::EnrichmentError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use garden_core::{EditHistory, HistoryProvider};
use std::path::Path;

/// [`HistoryProvider`] reading file creation and modification times
///
/// Creation time is unavailable on some filesystems; it is then left unknown
/// while the modification time is still reported. Edit count is always 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilesystemHistoryProvider;

impl FilesystemHistoryProvider {
    /// Create the provider
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl HistoryProvider for FilesystemHistoryProvider {
    async fn history(&self, path: &Path) -> anyhow::Result<EditHistory> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|source| EnrichmentError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let created = metadata.created().ok().map(DateTime::<Utc>::from);
        let modified = metadata.modified().ok().map(DateTime::<Utc>::from);
        Ok(EditHistory::new(created.or(modified), modified, 1))
    }

    fn name(&self) -> &'static str {
        "filesystem"
    }
}
