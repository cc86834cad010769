//! Bibliography provider

use serde::{Deserialize, Serialize};

/// One bibliography record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BibEntry {
    /// Citation key (lower-case)
    pub key: String,
    /// Work title
    pub title: String,
    /// Author display names
    #[serde(default)]
    pub authors: Vec<String>,
    /// Publication year
    #[serde(default)]
    pub year: Option<i32>,
    /// Link to the work
    #[serde(default)]
    pub url: Option<String>,
}

/// Lookup of citation keys
pub trait Bibliography: Send + Sync {
    /// Record for `key` (case-insensitive), if known
    fn lookup(&self, key: &str) -> Option<BibEntry>;

    /// Number of records
    fn len(&self) -> usize;

    /// Whether the bibliography has no records
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
