//! # Garden Enrichment
//!
//! Asynchronous metadata for parsed notes:
//! - **Edit history**: creation date, last modification and edit count from
//!   git, the filesystem, or nothing at all
//! - **Enrichment pool**: bounded, tracked lookups with a quiescence barrier
//! - **Bibliography**: CSL-JSON citation library for citation pages
//!
//! ## Architecture
//!
//! - **Dependencies**: `garden-core` for the [`HistoryProvider`] and
//!   [`garden_core::Bibliography`] traits, `garden-config` for settings
//! - **Inversion**: the pipeline only sees `Arc<dyn HistoryProvider>`; use
//!   [`create_history_provider`] to pick a backend
//!
//! ## Usage
//!
//! ```rust,no_run
//! use garden_config::HistoryProviderKind;
//! use garden_core::Note;
//! use garden_enrichment::{create_history_provider, EnrichmentPool};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let provider = create_history_provider(HistoryProviderKind::Git);
//!     let pool = EnrichmentPool::new(provider, 8, Duration::from_secs(10));
//!
//!     let note = Arc::new(Note::source("/a/", "a.md"));
//!     pool.schedule(Arc::clone(&note), Some("content/a.md".into()));
//!     pool.wait_for_quiescence(Duration::from_secs(60)).await;
//!     assert!(note.history().is_some());
//! }
//! ```

pub mod bibliography;
pub mod error;
pub mod pool;
pub mod providers;

pub use bibliography::CslBibliography;
pub use error::{EnrichmentError, EnrichmentResult};
pub use pool::{EnrichmentPool, EnrichmentStats, Quiescence};
pub use providers::{FilesystemHistoryProvider, GitHistoryProvider, NoHistoryProvider};

use garden_config::HistoryProviderKind;
use garden_core::HistoryProvider;
use std::sync::Arc;

/// Create the history provider selected in configuration.
///
/// Returns a trait object so callers stay independent of the backend.
pub fn create_history_provider(kind: HistoryProviderKind) -> Arc<dyn HistoryProvider> {
    match kind {
        HistoryProviderKind::Git => Arc::new(GitHistoryProvider::new()),
        HistoryProviderKind::Filesystem => Arc::new(FilesystemHistoryProvider::new()),
        HistoryProviderKind::None => Arc::new(NoHistoryProvider),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_selects_backend() {
        assert_eq!(create_history_provider(HistoryProviderKind::Git).name(), "git");
        assert_eq!(
            create_history_provider(HistoryProviderKind::Filesystem).name(),
            "filesystem"
        );
        assert_eq!(create_history_provider(HistoryProviderKind::None).name(), "none");
    }
}
