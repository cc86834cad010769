//! URL-keyed note registry
//!
//! The single source of truth for "does this note already exist". Every write
//! is one atomic `DashMap` entry operation, so concurrent discovery tasks and
//! stub creation can never insert two notes under one URL.

use crate::error::{GraphError, GraphResult};
use crate::note::Note;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

/// What happens when two source files claim one URL
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// Warn; the lexicographically smaller relative path keeps the URL
    #[default]
    TieBreak,
    /// Fail the build
    Strict,
}

/// Outcome of registering a source note
#[derive(Debug)]
pub enum Registration {
    /// The URL was free; the note is now registered
    Inserted(Arc<Note>),
    /// The same file was registered before; this is that note
    Existing(Arc<Note>),
    /// The new note won a collision and displaced the previous owner
    Replaced {
        /// Now registered
        winner: Arc<Note>,
        /// No longer registered
        displaced: Arc<Note>,
    },
    /// The new note lost a collision and was not registered
    Rejected {
        /// Still registered
        winner: Arc<Note>,
        /// Path of the rejected file
        rejected: PathBuf,
    },
}

impl Registration {
    /// The note that owns the URL after this registration
    pub fn registered(&self) -> &Arc<Note> {
        match self {
            Self::Inserted(note) | Self::Existing(note) => note,
            Self::Replaced { winner, .. } | Self::Rejected { winner, .. } => winner,
        }
    }

    /// Whether the caller's note is the registered one and still needs parsing
    pub fn needs_parse(&self) -> bool {
        matches!(self, Self::Inserted(_) | Self::Replaced { .. })
    }
}

/// Concurrent map from canonical URL to note
#[derive(Debug, Default)]
pub struct NoteRegistry {
    notes: DashMap<String, Arc<Note>>,
}

impl NoteRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source note under its URL, applying `policy` on collision
    pub fn register_source(&self, note: Note, policy: CollisionPolicy) -> GraphResult<Registration> {
        let url = note.url().to_string();
        match self.notes.entry(url) {
            Entry::Vacant(slot) => {
                let note = Arc::new(note);
                slot.insert(Arc::clone(&note));
                Ok(Registration::Inserted(note))
            }
            Entry::Occupied(mut slot) => {
                let existing = Arc::clone(slot.get());
                let (Some(owner), Some(claimant)) = (existing.path(), note.path()) else {
                    return Err(GraphError::invariant(format!(
                        "source note registered over synthetic note at {}",
                        slot.key()
                    )));
                };

                if owner == claimant {
                    return Ok(Registration::Existing(existing));
                }

                if policy == CollisionPolicy::Strict {
                    return Err(GraphError::UrlCollision {
                        url: slot.key().clone(),
                        first: owner.to_path_buf(),
                        second: claimant.to_path_buf(),
                    });
                }

                warn!(
                    url = %slot.key(),
                    kept = %owner.min(claimant).display(),
                    dropped = %owner.max(claimant).display(),
                    "Two source files map to the same URL"
                );

                if claimant < owner {
                    let winner = Arc::new(note);
                    slot.insert(Arc::clone(&winner));
                    Ok(Registration::Replaced {
                        winner,
                        displaced: existing,
                    })
                } else {
                    let rejected = claimant.to_path_buf();
                    Ok(Registration::Rejected {
                        winner: existing,
                        rejected,
                    })
                }
            }
        }
    }

    /// Insert `note` unless its URL is taken.
    ///
    /// Returns the registered note and whether this call created it. A second
    /// caller racing on the same URL receives the first caller's instance.
    pub fn insert_if_absent(&self, note: Note) -> (Arc<Note>, bool) {
        match self.notes.entry(note.url().to_string()) {
            Entry::Occupied(slot) => (Arc::clone(slot.get()), false),
            Entry::Vacant(slot) => {
                let note = Arc::new(note);
                slot.insert(Arc::clone(&note));
                (note, true)
            }
        }
    }

    /// Look up a note by canonical URL
    pub fn get(&self, url: &str) -> Option<Arc<Note>> {
        self.notes.get(url).map(|entry| Arc::clone(entry.value()))
    }

    /// Whether a URL is registered
    pub fn contains(&self, url: &str) -> bool {
        self.notes.contains_key(url)
    }

    /// Whether `note` is the instance currently registered under its URL
    pub fn is_registered(&self, note: &Arc<Note>) -> bool {
        self.notes
            .get(note.url())
            .is_some_and(|entry| Arc::ptr_eq(entry.value(), note))
    }

    /// Number of registered notes
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Point-in-time copy of all notes, sorted by URL
    pub fn snapshot(&self) -> Vec<Arc<Note>> {
        let mut notes: Vec<Arc<Note>> = self
            .notes
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        notes.sort_by(|a, b| a.url().cmp(b.url()));
        notes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_register_same_path_is_idempotent() {
        let registry = NoteRegistry::new();
        let first = registry
            .register_source(Note::source("/a/", "a.md"), CollisionPolicy::TieBreak)
            .unwrap();
        assert!(first.needs_parse());

        let second = registry
            .register_source(Note::source("/a/", "a.md"), CollisionPolicy::TieBreak)
            .unwrap();
        assert!(matches!(second, Registration::Existing(_)));
        assert!(Arc::ptr_eq(first.registered(), second.registered()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_collision_tie_break_is_order_independent() {
        for order in [["My Note.md", "my note.md"], ["my note.md", "My Note.md"]] {
            let registry = NoteRegistry::new();
            for path in order {
                registry
                    .register_source(Note::source("/my_note/", path), CollisionPolicy::TieBreak)
                    .unwrap();
            }
            let owner = registry.get("/my_note/").unwrap();
            assert_eq!(owner.path(), Some(Path::new("My Note.md")));
        }
    }

    #[test]
    fn test_collision_outcomes() {
        let registry = NoteRegistry::new();
        registry
            .register_source(Note::source("/x/", "b/x.md"), CollisionPolicy::TieBreak)
            .unwrap();

        let replaced = registry
            .register_source(Note::source("/x/", "a/x.md"), CollisionPolicy::TieBreak)
            .unwrap();
        let Registration::Replaced { winner, displaced } = replaced else {
            panic!("expected replacement");
        };
        assert_eq!(winner.path(), Some(Path::new("a/x.md")));
        assert!(!registry.is_registered(&displaced));
        assert!(registry.is_registered(&winner));

        let rejected = registry
            .register_source(Note::source("/x/", "c/x.md"), CollisionPolicy::TieBreak)
            .unwrap();
        assert!(matches!(rejected, Registration::Rejected { .. }));
        assert!(!rejected.needs_parse());
    }

    #[test]
    fn test_strict_collision_is_error() {
        let registry = NoteRegistry::new();
        registry
            .register_source(Note::source("/x/", "x.md"), CollisionPolicy::Strict)
            .unwrap();
        let err = registry
            .register_source(Note::source("/x/", "X.md"), CollisionPolicy::Strict)
            .unwrap_err();
        assert!(matches!(err, GraphError::UrlCollision { .. }));
    }

    #[test]
    fn test_insert_if_absent_returns_first_instance() {
        let registry = NoteRegistry::new();
        let (first, created) = registry.insert_if_absent(Note::dangling("/c/"));
        assert!(created);
        let (second, created) = registry.insert_if_absent(Note::dangling("/c/"));
        assert!(!created);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_stub_creation_yields_one_instance() {
        let registry = Arc::new(NoteRegistry::new());
        let mut handles = Vec::new();
        for _ in 0..32 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                registry.insert_if_absent(Note::dangling("/contested/"))
            }));
        }

        let mut created = 0;
        let mut instances = Vec::new();
        for handle in handles {
            let (note, was_created) = handle.await.unwrap();
            created += usize::from(was_created);
            instances.push(note);
        }

        assert_eq!(created, 1);
        assert!(instances.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_snapshot_is_sorted() {
        let registry = NoteRegistry::new();
        for url in ["/c/", "/a/", "/b/"] {
            registry.insert_if_absent(Note::dangling(url));
        }
        let urls: Vec<_> = registry
            .snapshot()
            .iter()
            .map(|n| n.url().to_string())
            .collect();
        assert_eq!(urls, vec!["/a/", "/b/", "/c/"]);
    }
}
