//! Enrichment component configuration
//!
//! Controls how edit history (creation date, last modification, edit count)
//! is collected for each note, and how long the build waits for it.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which edit-history provider the build uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryProviderKind {
    /// Ask git for the commit history of each file
    #[default]
    Git,
    /// Use filesystem timestamps
    Filesystem,
    /// Do not collect history; every note gets the documented default
    None,
}

/// Enrichment configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// History provider backend
    pub provider: HistoryProviderKind,

    /// Maximum number of concurrent provider calls (subprocesses for git)
    pub max_concurrent: usize,

    /// Per-note provider timeout in seconds
    pub call_timeout_secs: u64,

    /// Upper bound on a single quiescence wait in seconds
    pub quiescence_timeout_secs: u64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            provider: HistoryProviderKind::default(),
            max_concurrent: default_max_concurrent(),
            call_timeout_secs: 10,
            quiescence_timeout_secs: 120,
        }
    }
}

/// Twice the CPU count (history lookups are I/O bound), capped at 16
pub fn default_max_concurrent() -> usize {
    (num_cpus::get() * 2).clamp(1, 16)
}

impl EnrichmentConfig {
    /// Per-note provider timeout
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    /// Quiescence wait timeout
    pub fn quiescence_timeout(&self) -> Duration {
        Duration::from_secs(self.quiescence_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_max_concurrent_is_bounded() {
        let n = default_max_concurrent();
        assert!(n >= 1);
        assert!(n <= 16);
    }

    #[test]
    fn test_provider_kind_lowercase() {
        let toml = r#"
            provider = "filesystem"
            call_timeout_secs = 3
        "#;
        let config: EnrichmentConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.provider, HistoryProviderKind::Filesystem);
        assert_eq!(config.call_timeout(), Duration::from_secs(3));
        assert_eq!(config.quiescence_timeout(), Duration::from_secs(120));
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let toml = r#"provider = "svn""#;
        assert!(toml::from_str::<EnrichmentConfig>(toml).is_err());
    }
}
