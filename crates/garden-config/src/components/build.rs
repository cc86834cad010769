//! Build component configuration
//!
//! Output location, site identity, parse concurrency and URL policy.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Build configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Output directory for rendered artifacts
    pub output: PathBuf,

    /// Public base URL of the site (used by renderers, never by the graph)
    pub base_url: String,

    /// Maximum number of notes parsed concurrently during discovery
    pub parse_workers: usize,

    /// Treat two source files mapping to the same URL as a build-fatal error
    ///
    /// When false the collision is logged and the lexicographically smaller
    /// path keeps the URL.
    pub strict_urls: bool,

    /// Optional CSL-JSON bibliography used for citation titles
    pub bibliography: Option<PathBuf>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("output"),
            base_url: "http://localhost".to_string(),
            parse_workers: num_cpus::get().max(1),
            strict_urls: false,
            bibliography: None,
        }
    }
}
