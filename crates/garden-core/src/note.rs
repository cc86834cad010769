//! The note entity
//!
//! A [`Note`] is one node of the link graph. Its identity (`url`, `path`,
//! `origin`) is fixed at construction. The parsed body is written exactly once
//! through a set-once cell; concurrent callers asking for the body wait on the
//! same cell, so nobody ever observes a half-parsed note. After parsing, the
//! only mutations are backlink inserts (set semantics) and the one-time edit
//! history write from the enrichment pool.

use crate::parser::{Metadata, TemplateSelector};
use crate::url::title_from_url;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tokio::sync::OnceCell;

static EMPTY_SET: BTreeSet<String> = BTreeSet::new();

/// Kind of synthesized aggregate page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateKind {
    /// `/tags/<key>/`
    Tag,
    /// `/citations/<key>/`
    Citation,
}

impl fmt::Display for AggregateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag => f.write_str("tag"),
            Self::Citation => f.write_str("citation"),
        }
    }
}

/// Where a note came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteOrigin {
    /// Backed by a file under the content root
    Source,
    /// Placeholder for a link target with no backing file
    Dangling,
    /// Synthesized tag or citation page
    Aggregate(AggregateKind),
}

/// Version-control derived metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditHistory {
    /// First commit (or file creation) time
    pub created: Option<DateTime<Utc>>,
    /// Most recent commit (or modification) time
    pub last_modified: Option<DateTime<Utc>>,
    /// Number of recorded edits, at least 1
    pub edit_count: u32,
}

impl EditHistory {
    /// The documented default for files the provider knows nothing about:
    /// no dates (renderers fall back to the build time) and one edit
    pub fn unknown() -> Self {
        Self {
            created: None,
            last_modified: None,
            edit_count: 1,
        }
    }

    /// Build a history, clamping the edit count to at least 1
    pub fn new(
        created: Option<DateTime<Utc>>,
        last_modified: Option<DateTime<Utc>>,
        edit_count: u32,
    ) -> Self {
        Self {
            created,
            last_modified,
            edit_count: edit_count.max(1),
        }
    }

    /// Whether this is the unknown default
    pub fn is_unknown(&self) -> bool {
        self.created.is_none() && self.last_modified.is_none()
    }
}

impl Default for EditHistory {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Everything the parse step produces for a note
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteBody {
    /// Display title
    pub title: String,
    /// Rendered HTML, empty for stubs and failed parses
    pub content: String,
    /// Frontmatter properties
    pub metadata: Metadata,
    /// Template selection
    pub template: TemplateSelector,
    /// Outgoing edges (canonical URLs)
    pub links: BTreeSet<String>,
    /// Tag keys
    pub tags: BTreeSet<String>,
    /// Citation keys
    pub cites: BTreeSet<String>,
    /// Recorded parse problem, if any
    pub diagnostic: Option<String>,
}

impl NoteBody {
    /// Body with only a title and a template
    pub fn titled(title: impl Into<String>, template: TemplateSelector) -> Self {
        Self {
            title: title.into(),
            template,
            ..Self::default()
        }
    }

    /// Body for a note whose source could not be parsed
    pub fn failed(url: &str, template: TemplateSelector, diagnostic: impl Into<String>) -> Self {
        Self {
            title: title_from_url(url),
            template,
            diagnostic: Some(diagnostic.into()),
            ..Self::default()
        }
    }
}

/// A node in the link graph
pub struct Note {
    url: String,
    path: Option<PathBuf>,
    origin: NoteOrigin,
    body: OnceCell<NoteBody>,
    backlinks: RwLock<BTreeSet<String>>,
    history: OnceLock<EditHistory>,
}

impl Note {
    /// A note backed by `path` (relative to the content root), not yet parsed
    pub fn source(url: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            path: Some(path.into()),
            origin: NoteOrigin::Source,
            body: OnceCell::new(),
            backlinks: RwLock::new(BTreeSet::new()),
            history: OnceLock::new(),
        }
    }

    /// Placeholder for a dangling link target
    pub fn dangling(url: impl Into<String>) -> Self {
        let url = url.into();
        let body = NoteBody::titled(title_from_url(&url), TemplateSelector::Default);
        Self::synthetic(url, NoteOrigin::Dangling, body)
    }

    /// Synthesized tag or citation page
    pub fn aggregate(url: impl Into<String>, kind: AggregateKind, title: impl Into<String>) -> Self {
        let template = match kind {
            AggregateKind::Tag => TemplateSelector::Index,
            AggregateKind::Citation => TemplateSelector::Literature,
        };
        Self::synthetic(
            url.into(),
            NoteOrigin::Aggregate(kind),
            NoteBody::titled(title, template),
        )
    }

    fn synthetic(url: String, origin: NoteOrigin, body: NoteBody) -> Self {
        let history = OnceLock::new();
        let _ = history.set(EditHistory::unknown());
        Self {
            url,
            path: None,
            origin,
            body: OnceCell::new_with(Some(body)),
            backlinks: RwLock::new(BTreeSet::new()),
            history,
        }
    }

    /// Canonical URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Source path relative to the content root, `None` for synthetic notes
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Where this note came from
    pub fn origin(&self) -> NoteOrigin {
        self.origin
    }

    /// True for dangling placeholders and aggregate pages
    pub fn is_stub(&self) -> bool {
        !matches!(self.origin, NoteOrigin::Source)
    }

    /// True for a dangling-link placeholder
    pub fn is_dangling(&self) -> bool {
        matches!(self.origin, NoteOrigin::Dangling)
    }

    /// Run `parse` exactly once and return the body.
    ///
    /// Concurrent callers wait for the first caller's parse instead of
    /// starting their own.
    pub async fn populate<F, Fut>(&self, parse: F) -> &NoteBody
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = NoteBody>,
    {
        self.body.get_or_init(parse).await
    }

    /// The parsed body, if parsing has finished
    pub fn body(&self) -> Option<&NoteBody> {
        self.body.get()
    }

    /// Whether the parse step has completed
    pub fn is_parsed(&self) -> bool {
        self.body.initialized()
    }

    /// Display title (derived from the URL until parsed)
    pub fn title(&self) -> String {
        match self.body() {
            Some(body) => body.title.clone(),
            None => title_from_url(&self.url),
        }
    }

    /// Rendered HTML
    pub fn content(&self) -> &str {
        self.body().map(|b| b.content.as_str()).unwrap_or_default()
    }

    /// Frontmatter properties
    pub fn metadata(&self) -> Metadata {
        self.body().map(|b| b.metadata.clone()).unwrap_or_default()
    }

    /// Template the renderer should use
    pub fn template(&self) -> TemplateSelector {
        self.body().map(|b| b.template.clone()).unwrap_or_default()
    }

    /// Outgoing edges
    pub fn links(&self) -> &BTreeSet<String> {
        self.body().map(|b| &b.links).unwrap_or(&EMPTY_SET)
    }

    /// Tag keys
    pub fn tags(&self) -> &BTreeSet<String> {
        self.body().map(|b| &b.tags).unwrap_or(&EMPTY_SET)
    }

    /// Citation keys
    pub fn cites(&self) -> &BTreeSet<String> {
        self.body().map(|b| &b.cites).unwrap_or(&EMPTY_SET)
    }

    /// Recorded parse problem
    pub fn diagnostic(&self) -> Option<&str> {
        self.body().and_then(|b| b.diagnostic.as_deref())
    }

    /// Insert an incoming edge; returns false when it was already present
    pub(crate) fn add_backlink(&self, source_url: &str) -> bool {
        if self.backlinks.read().contains(source_url) {
            return false;
        }
        self.backlinks.write().insert(source_url.to_string())
    }

    /// URLs of the notes linking here, sorted
    pub fn backlinks(&self) -> Vec<String> {
        self.backlinks.read().iter().cloned().collect()
    }

    /// Number of incoming edges
    pub fn backlink_count(&self) -> usize {
        self.backlinks.read().len()
    }

    /// Whether `source_url` links here
    pub fn has_backlink(&self, source_url: &str) -> bool {
        self.backlinks.read().contains(source_url)
    }

    /// Record edit history; only the first write sticks
    pub fn set_history(&self, history: EditHistory) -> bool {
        self.history.set(history).is_ok()
    }

    /// Edit history, if enrichment has finished
    pub fn history(&self) -> Option<&EditHistory> {
        self.history.get()
    }

    /// Edit history, or the unknown default while enrichment is outstanding
    pub fn history_or_default(&self) -> EditHistory {
        self.history().cloned().unwrap_or_default()
    }

    /// Plain serializable view of the note
    pub fn snapshot(&self) -> NoteSnapshot {
        let history = self.history_or_default();
        NoteSnapshot {
            url: self.url.clone(),
            path: self.path.clone(),
            origin: self.origin,
            title: self.title(),
            content: self.content().to_string(),
            metadata: self.metadata(),
            template: self.template(),
            is_stub: self.is_stub(),
            links: self.links().iter().cloned().collect(),
            backlinks: self.backlinks(),
            tags: self.tags().iter().cloned().collect(),
            cites: self.cites().iter().cloned().collect(),
            creation_date: history.created,
            last_modified_date: history.last_modified,
            edit_count: history.edit_count,
            diagnostic: self.diagnostic().map(str::to_string),
        }
    }
}

impl fmt::Debug for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Note")
            .field("url", &self.url)
            .field("path", &self.path)
            .field("origin", &self.origin)
            .field("parsed", &self.is_parsed())
            .field("backlinks", &self.backlink_count())
            .finish()
    }
}

/// Serializable copy of a note's graph-visible state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteSnapshot {
    /// Canonical URL
    pub url: String,
    /// Source path relative to the content root
    pub path: Option<PathBuf>,
    /// Origin
    pub origin: NoteOrigin,
    /// Display title
    pub title: String,
    /// Rendered HTML body
    pub content: String,
    /// Frontmatter properties
    pub metadata: Metadata,
    /// Template key
    pub template: TemplateSelector,
    /// Stub flag
    pub is_stub: bool,
    /// Outgoing edges, sorted
    pub links: Vec<String>,
    /// Incoming edges, sorted
    pub backlinks: Vec<String>,
    /// Tag keys, sorted
    pub tags: Vec<String>,
    /// Citation keys, sorted
    pub cites: Vec<String>,
    /// First edit
    pub creation_date: Option<DateTime<Utc>>,
    /// Latest edit
    pub last_modified_date: Option<DateTime<Utc>>,
    /// Number of edits
    pub edit_count: u32,
    /// Recorded parse problem
    pub diagnostic: Option<String>,
}
