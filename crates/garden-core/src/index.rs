//! Tag and citation indexes
//!
//! Append-only maps from a normalized key to the notes carrying it, filled in
//! as each parse completes. Members are kept ordered by URL so aggregate pages
//! come out the same regardless of which parse finished first.

use crate::note::Note;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Concurrent key → ordered note set index
#[derive(Debug, Default)]
pub struct KeyIndex {
    entries: DashMap<String, BTreeMap<String, Arc<Note>>>,
}

impl KeyIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `note` carries `key`; keys are lower-cased
    pub fn add(&self, key: &str, note: &Arc<Note>) {
        self.entries
            .entry(key.to_lowercase())
            .or_default()
            .insert(note.url().to_string(), Arc::clone(note));
    }

    /// All keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    /// Notes carrying `key`, ordered by URL
    pub fn members(&self, key: &str) -> Vec<Arc<Note>> {
        self.entries
            .get(&key.to_lowercase())
            .map(|entry| entry.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no key has been recorded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys with their member counts, most used first (ties by key)
    pub fn counts(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = self
            .entries
            .iter()
            .map(|e| (e.key().clone(), e.value().len()))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        counts
    }
}
