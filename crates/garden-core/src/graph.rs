//! The build context: registry, indexes and phase tracking
//!
//! A [`NoteGraph`] is created fresh for every build and moves through three
//! phases:
//!
//! - **Discovery**: source notes are registered and parsed concurrently, and
//!   tag/citation keys are indexed as each parse completes.
//! - **Resolution**: aggregate pages are synthesized, then one backlink sweep
//!   over a snapshot of the registry inverts every note's links, creating
//!   stubs for dangling targets.
//! - **Closed**: read-only, ready for rendering.
//!
//! Phase transitions take the phase lock exclusively, while registry writes
//! hold it shared for the duration of the write. A write therefore either
//! completes before a transition or observes the new phase and fails.

use crate::error::{GraphError, GraphResult};
use crate::index::KeyIndex;
use crate::note::{AggregateKind, Note};
use crate::registry::{CollisionPolicy, NoteRegistry, Registration};
use crate::traits::Bibliography;
use crate::url::{citation_url, tag_url};
use parking_lot::RwLock;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Build phase of a [`NoteGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphPhase {
    /// Source notes are being registered and parsed
    Discovery,
    /// Aggregates and backlinks are being computed
    Resolution,
    /// The graph is final
    Closed,
}

impl fmt::Display for GraphPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discovery => f.write_str("discovery"),
            Self::Resolution => f.write_str("resolution"),
            Self::Closed => f.write_str("closed"),
        }
    }
}

/// Options fixed for the lifetime of a graph
#[derive(Debug, Clone)]
pub struct GraphOptions {
    /// File stem that maps to its directory URL
    pub index_name: String,
    /// URL collision handling
    pub collision_policy: CollisionPolicy,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            index_name: "index".to_string(),
            collision_policy: CollisionPolicy::TieBreak,
        }
    }
}

/// Outcome of the backlink sweep
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionReport {
    /// Notes in the pre-sweep snapshot
    pub notes_scanned: usize,
    /// Links examined
    pub links_followed: usize,
    /// Backlink edges newly inserted
    pub edges_added: usize,
    /// URLs of stubs created for dangling links, sorted
    pub stubs_created: Vec<String>,
}

/// Outcome of aggregate synthesis
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregateReport {
    /// Tag pages created
    pub tag_pages: usize,
    /// Citation pages created
    pub citation_pages: usize,
    /// Aggregate URLs already owned by a source note (members were merged in)
    pub merged_into_source: Vec<String>,
}

/// Explicit build context owning the registry and indexes
#[derive(Debug)]
pub struct NoteGraph {
    options: GraphOptions,
    registry: NoteRegistry,
    tags: KeyIndex,
    citations: KeyIndex,
    phase: RwLock<GraphPhase>,
}

impl Default for NoteGraph {
    fn default() -> Self {
        Self::new(GraphOptions::default())
    }
}

impl NoteGraph {
    /// Create an empty graph in the discovery phase
    pub fn new(options: GraphOptions) -> Self {
        Self {
            options,
            registry: NoteRegistry::new(),
            tags: KeyIndex::new(),
            citations: KeyIndex::new(),
            phase: RwLock::new(GraphPhase::Discovery),
        }
    }

    /// Graph options
    pub fn options(&self) -> &GraphOptions {
        &self.options
    }

    /// Configured index file stem
    pub fn index_name(&self) -> &str {
        &self.options.index_name
    }

    /// Current phase
    pub fn phase(&self) -> GraphPhase {
        *self.phase.read()
    }

    fn expect_phase<T>(
        &self,
        expected: GraphPhase,
        operation: &'static str,
        write: impl FnOnce() -> GraphResult<T>,
    ) -> GraphResult<T> {
        let phase = self.phase.read();
        if *phase != expected {
            return Err(GraphError::PhaseViolation {
                operation,
                phase: *phase,
            });
        }
        write()
    }

    fn ensure_phase(&self, expected: GraphPhase, operation: &'static str) -> GraphResult<()> {
        self.expect_phase(expected, operation, || Ok(()))
    }

    fn transition(&self, from: GraphPhase, to: GraphPhase) -> GraphResult<()> {
        let mut phase = self.phase.write();
        if *phase != from {
            return Err(GraphError::PhaseViolation {
                operation: "phase transition",
                phase: *phase,
            });
        }
        info!(from = %from, to = %to, notes = self.registry.len(), "Graph phase change");
        *phase = to;
        Ok(())
    }

    /// Register a source note (discovery only)
    pub fn register_source(&self, note: Note) -> GraphResult<Registration> {
        self.expect_phase(GraphPhase::Discovery, "register_source", || {
            self.registry
                .register_source(note, self.options.collision_policy)
        })
    }

    /// Index a parsed note's tags and citations (discovery only)
    pub fn index_note(&self, note: &Arc<Note>) -> GraphResult<()> {
        self.expect_phase(GraphPhase::Discovery, "index_note", || {
            for tag in note.tags() {
                self.tags.add(tag, note);
            }
            for key in note.cites() {
                self.citations.add(key, note);
            }
            Ok(())
        })
    }

    /// Close discovery
    pub fn begin_resolution(&self) -> GraphResult<()> {
        self.transition(GraphPhase::Discovery, GraphPhase::Resolution)
    }

    /// Close resolution; the graph becomes read-only
    pub fn close(&self) -> GraphResult<()> {
        self.transition(GraphPhase::Resolution, GraphPhase::Closed)
    }

    /// Placeholder for a dangling link target (resolution only).
    ///
    /// Atomic insert-if-absent: concurrent callers for one URL all receive
    /// the first caller's note. Returns the note and whether this call
    /// created it.
    pub fn create_stub(&self, url: &str) -> GraphResult<(Arc<Note>, bool)> {
        self.expect_phase(GraphPhase::Resolution, "create_stub", || {
            let (note, created) = self.registry.insert_if_absent(Note::dangling(url));
            if created {
                debug!(url = %url, "Created stub for dangling link");
            }
            Ok((note, created))
        })
    }

    /// Synthesize a tag or citation page with `members` preloaded as
    /// backlinks (resolution only).
    ///
    /// When a source note already owns the aggregate URL the source note is
    /// kept and the members are added to its backlinks.
    pub fn create_aggregate(
        &self,
        kind: AggregateKind,
        key: &str,
        title: Option<String>,
        members: &[Arc<Note>],
    ) -> GraphResult<(Arc<Note>, bool)> {
        self.expect_phase(GraphPhase::Resolution, "create_aggregate", || {
            let (url, default_title) = match kind {
                AggregateKind::Tag => (tag_url(key), format!("#{key}")),
                AggregateKind::Citation => (citation_url(key), format!("@{key}")),
            };
            let title = title.unwrap_or(default_title);
            let (note, created) = self
                .registry
                .insert_if_absent(Note::aggregate(url, kind, title));
            for member in members {
                note.add_backlink(member.url());
            }
            Ok((note, created))
        })
    }

    /// Create every tag and citation page from the indexes (resolution only).
    ///
    /// Index members displaced by a URL collision are dropped. Citation
    /// titles come from `bibliography` when it knows the key.
    pub fn synthesize_aggregates(
        &self,
        bibliography: Option<&dyn Bibliography>,
    ) -> GraphResult<AggregateReport> {
        self.ensure_phase(GraphPhase::Resolution, "synthesize_aggregates")?;
        let mut report = AggregateReport::default();

        for (kind, index) in [
            (AggregateKind::Tag, &self.tags),
            (AggregateKind::Citation, &self.citations),
        ] {
            for key in index.keys() {
                let members: Vec<Arc<Note>> = index
                    .members(&key)
                    .into_iter()
                    .filter(|member| self.registry.is_registered(member))
                    .collect();
                if members.is_empty() {
                    continue;
                }

                let title = match kind {
                    AggregateKind::Citation => bibliography
                        .and_then(|bib| bib.lookup(&key))
                        .map(|entry| entry.title),
                    AggregateKind::Tag => None,
                };

                let (note, created) = self.create_aggregate(kind, &key, title, &members)?;
                if !created {
                    if note.is_stub() {
                        debug!(url = %note.url(), key = %key, "Aggregate keys share a URL; members merged");
                        continue;
                    }
                    warn!(
                        url = %note.url(),
                        kind = %kind,
                        "Aggregate URL owned by a source note; merging members into its backlinks"
                    );
                    report.merged_into_source.push(note.url().to_string());
                    continue;
                }
                match kind {
                    AggregateKind::Tag => report.tag_pages += 1,
                    AggregateKind::Citation => report.citation_pages += 1,
                }
            }
        }

        info!(
            tag_pages = report.tag_pages,
            citation_pages = report.citation_pages,
            "Synthesized aggregate pages"
        );
        Ok(report)
    }

    /// The backlink sweep (resolution only).
    ///
    /// Walks a snapshot of the registry once. For every outgoing link the
    /// target is looked up, or created as a stub, and the source URL is added
    /// to its backlinks. Stubs created during the sweep are not visited; they
    /// have no outgoing links anyway.
    pub fn resolve_backlinks(&self) -> GraphResult<ResolutionReport> {
        self.ensure_phase(GraphPhase::Resolution, "resolve_backlinks")?;

        let snapshot = self.registry.snapshot();
        let mut report = ResolutionReport {
            notes_scanned: snapshot.len(),
            ..ResolutionReport::default()
        };

        for note in &snapshot {
            if !note.is_parsed() {
                return Err(GraphError::invariant(format!(
                    "{} reached resolution before its parse completed",
                    note.url()
                )));
            }

            for target_url in note.links() {
                report.links_followed += 1;
                let target = match self.registry.get(target_url) {
                    Some(target) => target,
                    None => {
                        let (stub, created) = self.create_stub(target_url)?;
                        if created {
                            report.stubs_created.push(target_url.clone());
                        }
                        stub
                    }
                };
                if target.add_backlink(note.url()) {
                    report.edges_added += 1;
                }
            }
        }

        report.stubs_created.sort();
        info!(
            notes = report.notes_scanned,
            edges = report.edges_added,
            stubs = report.stubs_created.len(),
            "Resolved backlinks"
        );
        Ok(report)
    }

    /// Look up a note by canonical URL
    pub fn get(&self, url: &str) -> Option<Arc<Note>> {
        self.registry.get(url)
    }

    /// Whether a URL is registered
    pub fn contains(&self, url: &str) -> bool {
        self.registry.contains(url)
    }

    /// Number of registered notes
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Whether no note is registered
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// All notes sorted by URL, in any phase
    pub fn notes(&self) -> Vec<Arc<Note>> {
        self.registry.snapshot()
    }

    /// All notes sorted by URL, only once the graph is closed
    pub fn closed_notes(&self) -> GraphResult<Vec<Arc<Note>>> {
        match self.phase() {
            GraphPhase::Closed => Ok(self.registry.snapshot()),
            phase => Err(GraphError::PhaseViolation {
                operation: "closed_notes",
                phase,
            }),
        }
    }

    /// Whether `note` is the instance registered under its URL
    pub fn is_registered(&self, note: &Arc<Note>) -> bool {
        self.registry.is_registered(note)
    }

    /// Tag index
    pub fn tags(&self) -> &KeyIndex {
        &self.tags
    }

    /// Citation index
    pub fn citations(&self) -> &KeyIndex {
        &self.citations
    }
}
