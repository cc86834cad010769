//! Exclusion matching for the content walk
//!
//! Patterns are globs relative to the content root. A pattern of the form
//! `dir/**` also matches `dir` itself, so the walker can prune the whole
//! subtree at the directory instead of filtering every file below it.

use crate::ConfigError;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Component, Path};

/// Compiled exclusion patterns
#[derive(Debug, Clone)]
pub struct ExclusionMatcher {
    set: GlobSet,
    skip_hidden: bool,
}

impl ExclusionMatcher {
    /// Compile `patterns`; `skip_hidden` additionally excludes dot-prefixed names
    pub fn new(patterns: &[String], skip_hidden: bool) -> Result<Self, ConfigError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            add_glob(&mut builder, pattern)?;
            if let Some(dir) = pattern.strip_suffix("/**") {
                if !dir.is_empty() {
                    add_glob(&mut builder, dir)?;
                }
            }
        }

        let set = builder.build().map_err(|e| ConfigError::InvalidPattern {
            pattern: patterns.join(", "),
            message: e.to_string(),
        })?;

        Ok(Self { set, skip_hidden })
    }

    /// Matcher that excludes nothing
    pub fn empty() -> Self {
        Self {
            set: GlobSet::empty(),
            skip_hidden: false,
        }
    }

    /// Whether `relative` (a path below the content root) is excluded
    pub fn is_excluded(&self, relative: &Path) -> bool {
        if relative.as_os_str().is_empty() {
            return false;
        }
        if self.skip_hidden && has_hidden_component(relative) {
            return true;
        }
        self.set.is_match(relative)
    }
}

fn add_glob(builder: &mut GlobSetBuilder, pattern: &str) -> Result<(), ConfigError> {
    let glob = Glob::new(pattern).map_err(|e| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;
    builder.add(glob);
    Ok(())
}

fn has_hidden_component(path: &Path) -> bool {
    path.components().any(|c| match c {
        Component::Normal(name) => name.to_string_lossy().starts_with('.'),
        _ => false,
    })
}
