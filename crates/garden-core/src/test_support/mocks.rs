//! Mock implementations of the collaborator traits
//!
//! - **Deterministic**: the same path always yields the same history
//! - **Configurable**: latency, failures and hangs can be injected per path
//! - **Observable**: calls are counted for assertions
//!
//! ```rust
//! use garden_core::test_support::MockHistoryProvider;
//! use garden_core::traits::HistoryProvider;
//! use std::path::Path;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let provider = MockHistoryProvider::new().with_edit_count(4);
//! let history = provider.history(Path::new("a.md")).await?;
//! assert_eq!(history.edit_count, 4);
//! assert_eq!(provider.calls(), 1);
//! # Ok(())
//! # }
//! ```

use crate::note::EditHistory;
use crate::traits::{BibEntry, Bibliography, HistoryProvider};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// In-memory [`HistoryProvider`]
#[derive(Debug, Default)]
pub struct MockHistoryProvider {
    delay: Duration,
    edit_count: Option<u32>,
    failing: HashSet<PathBuf>,
    hanging: HashSet<PathBuf>,
    calls: AtomicUsize,
    seen: Mutex<Vec<PathBuf>>,
}

impl MockHistoryProvider {
    /// Provider answering immediately with a fixed known history
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long before every answer
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Edit count returned for every path
    pub fn with_edit_count(mut self, edit_count: u32) -> Self {
        self.edit_count = Some(edit_count);
        self
    }

    /// Fail for any path ending in `suffix`
    pub fn failing_on(mut self, suffix: impl Into<PathBuf>) -> Self {
        self.failing.insert(suffix.into());
        self
    }

    /// Never answer for any path ending in `suffix`
    pub fn hanging_on(mut self, suffix: impl Into<PathBuf>) -> Self {
        self.hanging.insert(suffix.into());
        self
    }

    /// Number of calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Paths asked about, in call order
    pub fn seen(&self) -> Vec<PathBuf> {
        self.seen.lock().clone()
    }

    /// The history this mock reports for every answered path
    pub fn known_history(&self) -> EditHistory {
        let created = Utc.with_ymd_and_hms(2021, 3, 14, 9, 0, 0).single();
        let modified = Utc.with_ymd_and_hms(2023, 7, 1, 18, 30, 0).single();
        EditHistory::new(created, modified, self.edit_count.unwrap_or(3))
    }

    fn matches(set: &HashSet<PathBuf>, path: &Path) -> bool {
        set.iter().any(|suffix| path.ends_with(suffix))
    }
}

#[async_trait]
impl HistoryProvider for MockHistoryProvider {
    async fn history(&self, path: &Path) -> anyhow::Result<EditHistory> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push(path.to_path_buf());

        if Self::matches(&self.hanging, path) {
            std::future::pending::<()>().await;
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if Self::matches(&self.failing, path) {
            anyhow::bail!("no history for {}", path.display());
        }
        Ok(self.known_history())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// In-memory [`Bibliography`]
#[derive(Debug, Default, Clone)]
pub struct MemoryBibliography {
    entries: HashMap<String, BibEntry>,
}

impl MemoryBibliography {
    /// Empty bibliography
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record with just a title
    pub fn with_entry(mut self, key: &str, title: &str) -> Self {
        let key = key.to_lowercase();
        self.entries.insert(
            key.clone(),
            BibEntry {
                key,
                title: title.to_string(),
                authors: Vec::new(),
                year: None,
                url: None,
            },
        );
        self
    }
}

impl Bibliography for MemoryBibliography {
    fn lookup(&self, key: &str) -> Option<BibEntry> {
        self.entries.get(&key.to_lowercase()).cloned()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
