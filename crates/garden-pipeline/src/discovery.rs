//! Content tree walk
//!
//! Walks the content root in file-name order without following symlinks.
//! Excluded subtrees are pruned at the directory, so nothing below
//! `templates/` is ever visited. Note files and static assets are reported
//! separately; assets are listed but not copied. Symlinked files are
//! reported and skipped.

use crate::error::{PipelineError, PipelineResult};
use garden_config::{ContentConfig, ExclusionMatcher};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// A note file found by the walk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFile {
    /// Location on disk
    pub absolute: PathBuf,
    /// Location relative to the content root
    pub relative: PathBuf,
}

/// Result of walking the content root
#[derive(Debug, Clone, Default, Serialize)]
pub struct Discovery {
    /// Note files, in walk order
    pub notes: Vec<SourceFile>,
    /// Non-note files, relative to the content root
    pub assets: Vec<PathBuf>,
    /// Symlinks left alone by the walk, relative to the content root
    pub symlinks: Vec<PathBuf>,
    /// Entries that could not be read
    pub unreadable: usize,
}

/// Walk `config.root`, skipping everything `matcher` excludes
pub fn discover(config: &ContentConfig, matcher: &ExclusionMatcher) -> PipelineResult<Discovery> {
    let root = config.root.as_path();
    if !root.is_dir() {
        return Err(PipelineError::ContentRoot(root.to_path_buf()));
    }

    let mut discovery = Discovery::default();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !matcher.is_excluded(relative_to(root, entry.path())));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable entry");
                discovery.unreadable += 1;
                continue;
            }
        };
        let relative = relative_to(root, entry.path()).to_path_buf();
        if entry.depth() > 0 && entry.path_is_symlink() {
            warn!(path = %relative.display(), "Skipping symlink");
            discovery.symlinks.push(relative);
            continue;
        }
        if !entry.file_type().is_file() {
            continue;
        }

        let is_note = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| config.is_note_extension(ext));

        if is_note {
            discovery.notes.push(SourceFile {
                absolute: entry.path().to_path_buf(),
                relative,
            });
        } else {
            discovery.assets.push(relative);
        }
    }

    debug!(
        root = %root.display(),
        notes = discovery.notes.len(),
        assets = discovery.assets.len(),
        symlinks = discovery.symlinks.len(),
        "Content walk finished"
    );
    Ok(discovery)
}

fn relative_to<'a>(root: &Path, path: &'a Path) -> &'a Path {
    path.strip_prefix(root).unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "x").unwrap();
    }

    fn config(root: &Path) -> ContentConfig {
        ContentConfig {
            root: root.to_path_buf(),
            ..ContentConfig::default()
        }
    }

    #[test]
    fn test_notes_assets_and_exclusions() {
        let dir = TempDir::new().unwrap();
        for file in [
            "b.md",
            "a.md",
            "topics/index.md",
            "images/plot.png",
            "templates/note.md",
            ".obsidian/workspace.md",
            "notes/.hidden.md",
        ] {
            write(dir.path(), file);
        }

        let config = config(dir.path());
        let matcher = config.exclusion_matcher().unwrap();
        let found = discover(&config, &matcher).unwrap();

        let notes: Vec<_> = found.notes.iter().map(|f| f.relative.clone()).collect();
        assert_eq!(
            notes,
            vec![
                PathBuf::from("a.md"),
                PathBuf::from("b.md"),
                PathBuf::from("topics/index.md"),
            ]
        );
        assert_eq!(found.assets, vec![PathBuf::from("images/plot.png")]);
        assert!(found.notes[0].absolute.starts_with(dir.path()));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_reported() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "real.md");
        std::os::unix::fs::symlink(dir.path().join("real.md"), dir.path().join("alias.md"))
            .unwrap();

        let config = config(dir.path());
        let found = discover(&config, &ExclusionMatcher::empty()).unwrap();

        assert_eq!(found.notes.len(), 1);
        assert_eq!(found.notes[0].relative, PathBuf::from("real.md"));
        assert_eq!(found.symlinks, vec![PathBuf::from("alias.md")]);
        assert!(found.assets.is_empty());
    }

    #[test]
    fn test_missing_root() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir.path().join("nope"));
        let err = discover(&config, &ExclusionMatcher::empty()).unwrap_err();
        assert!(matches!(err, PipelineError::ContentRoot(_)));
    }
}
