//! Shared helpers for pipeline integration tests

#![allow(dead_code)]

use garden_config::{GardenConfig, HistoryProviderKind};
use garden_core::test_support::MockHistoryProvider;
use garden_pipeline::SiteBuilder;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// A content tree in a temporary directory
pub struct TestGarden {
    pub dir: TempDir,
}

impl TestGarden {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    /// Garden populated with `(relative path, content)` pairs
    pub fn with_notes(notes: &[(&str, &str)]) -> Self {
        let garden = Self::new();
        for (path, content) in notes {
            garden.write(path, content.as_bytes());
        }
        garden
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, relative: &str, content: &[u8]) {
        let path = self.dir.path().join(relative);
        std::fs::create_dir_all(path.parent().expect("parent dir")).expect("create dirs");
        std::fs::write(path, content).expect("write note");
    }

    /// Configuration pointing at this garden, without history lookups
    pub fn config(&self) -> GardenConfig {
        let mut config = GardenConfig::default();
        config.content.root = self.dir.path().to_path_buf();
        config.build.output = self.dir.path().join("_site");
        config.build.parse_workers = 4;
        config.enrichment.provider = HistoryProviderKind::None;
        config.enrichment.max_concurrent = 4;
        config.enrichment.call_timeout_secs = 5;
        config.enrichment.quiescence_timeout_secs = 10;
        config
    }

    pub fn builder(&self) -> SiteBuilder {
        SiteBuilder::new(self.config())
    }

    /// Builder using `provider` for edit history
    pub fn builder_with(&self, provider: Arc<MockHistoryProvider>) -> SiteBuilder {
        SiteBuilder::new(self.config()).with_history_provider(provider)
    }
}

/// Sorted backlinks of `url`, panicking when the URL is not registered
pub fn backlinks(graph: &garden_core::NoteGraph, url: &str) -> Vec<String> {
    graph
        .get(url)
        .unwrap_or_else(|| panic!("{url} not registered"))
        .backlinks()
}
