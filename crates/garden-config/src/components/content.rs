//! Content component configuration
//!
//! Where the notes live and which parts of the tree the walk must skip.

use crate::{ConfigError, ExclusionMatcher};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Content discovery configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Root directory of the note tree.
    ///
    /// Relative paths are resolved against the directory of the config file.
    pub root: PathBuf,

    /// File stem that maps to its parent directory's URL (`topics/index.md` -> `/topics/`)
    pub index_name: String,

    /// File extensions treated as notes; everything else is a static asset
    pub extensions: Vec<String>,

    /// Glob patterns (relative to `root`) pruned from the walk entirely
    ///
    /// Default: `["templates/**"]`
    pub exclude: Vec<String>,

    /// Skip files and directories whose name starts with `.`
    pub skip_hidden: bool,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("content"),
            index_name: "index".to_string(),
            extensions: vec!["md".to_string()],
            exclude: default_exclude(),
            skip_hidden: true,
        }
    }
}

fn default_exclude() -> Vec<String> {
    vec!["templates/**".to_string()]
}

impl ContentConfig {
    /// Compile the exclusion patterns into a matcher
    pub fn exclusion_matcher(&self) -> Result<ExclusionMatcher, ConfigError> {
        ExclusionMatcher::new(&self.exclude, self.skip_hidden)
    }

    /// Whether a file extension marks a note (case-insensitive)
    pub fn is_note_extension(&self, ext: &str) -> bool {
        self.extensions
            .iter()
            .any(|known| known.eq_ignore_ascii_case(ext))
    }
}
