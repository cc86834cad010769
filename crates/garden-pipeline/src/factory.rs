//! Note factory: one source file in, one registered and parsed note out
//!
//! Per file the factory reads the bytes, decodes them, reads the frontmatter
//! to learn any URL override, registers the note, and only then parses it
//! inside the note's set-once body cell. Registering before parsing means a
//! second request for the same file finds the note in the registry and waits
//! for the first parse instead of starting another.
//!
//! A file that cannot be read, decoded or parsed still becomes a note: empty
//! content, a title derived from its URL and a recorded diagnostic.

use crate::discovery::SourceFile;
use crate::error::PipelineResult;
use garden_core::url::{apply_override, path_to_url, title_from_url};
use garden_core::{
    MarkdownParser, Note, NoteBody, NoteGraph, ParserError, Registration,
    TemplateSelector,
};
use garden_enrichment::EnrichmentPool;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of [`NoteFactory::get_or_create`]
#[derive(Debug, Clone)]
pub enum Produced {
    /// This call registered and parsed the note
    Created(Arc<Note>),
    /// The file was already registered; this is that note, fully parsed
    Existing(Arc<Note>),
    /// Another file owns the URL and won the tie-break
    Rejected {
        /// URL both files map to
        url: String,
    },
}

impl Produced {
    /// The registered note, unless this file lost a collision
    pub fn note(&self) -> Option<&Arc<Note>> {
        match self {
            Self::Created(note) | Self::Existing(note) => Some(note),
            Self::Rejected { .. } => None,
        }
    }
}

/// Creates notes from source files against one [`NoteGraph`]
pub struct NoteFactory {
    graph: Arc<NoteGraph>,
    parser: Arc<dyn MarkdownParser>,
    pool: Arc<EnrichmentPool>,
}

impl NoteFactory {
    /// Factory registering into `graph` and scheduling history on `pool`
    pub fn new(
        graph: Arc<NoteGraph>,
        parser: Arc<dyn MarkdownParser>,
        pool: Arc<EnrichmentPool>,
    ) -> Self {
        Self {
            graph,
            parser,
            pool,
        }
    }

    /// The graph notes are registered into
    pub fn graph(&self) -> &Arc<NoteGraph> {
        &self.graph
    }

    /// Return the note for `file`, registering and parsing it on first request.
    ///
    /// Only structural errors (strict URL collision, phase violation) are
    /// returned; per-file problems are recorded on the note.
    pub async fn get_or_create(&self, file: &SourceFile) -> PipelineResult<Produced> {
        let source = read_source(&file.absolute).await;
        let frontmatter = match &source {
            Ok(text) => self.parser.parse_frontmatter(text).ok(),
            Err(_) => None,
        };

        let index_name = self.graph.index_name();
        let computed = path_to_url(&file.relative, index_name);
        let url = match &frontmatter {
            Some(fm) => apply_override(&computed, fm.url().as_deref(), fm.slug().as_deref()),
            None => computed,
        };

        let registration = self
            .graph
            .register_source(Note::source(url.clone(), &file.relative))?;
        let created = registration.needs_parse();
        let note = match registration {
            Registration::Rejected { rejected, .. } => {
                debug!(url = %url, path = %rejected.display(), "Skipping file that lost its URL");
                return Ok(Produced::Rejected { url });
            }
            Registration::Replaced { winner, displaced } => {
                debug!(
                    url = %url,
                    displaced = ?displaced.path(),
                    "Replaced note that lost its URL"
                );
                winner
            }
            Registration::Inserted(note) | Registration::Existing(note) => note,
        };

        let template = default_template(&file.relative, index_name);
        let body = note
            .populate(|| async {
                match source {
                    Ok(text) => self.parse_body(note.url(), &text, template),
                    Err(e) => NoteBody::failed(note.url(), template, e.to_string()),
                }
            })
            .await;

        if !created {
            return Ok(Produced::Existing(note));
        }

        if let Some(diagnostic) = &body.diagnostic {
            warn!(
                path = %file.relative.display(),
                url = %note.url(),
                diagnostic = %diagnostic,
                "Note parsed with problems"
            );
        }

        self.graph.index_note(&note)?;
        self.pool
            .schedule(Arc::clone(&note), Some(file.absolute.clone()));
        Ok(Produced::Created(note))
    }

    fn parse_body(&self, url: &str, text: &str, default: TemplateSelector) -> NoteBody {
        let doc = match self.parser.parse(text) {
            Ok(doc) => doc,
            Err(e) => return NoteBody::failed(url, default, e.to_string()),
        };

        let diagnostic = if doc.diagnostics.is_empty() {
            None
        } else {
            Some(doc.diagnostics.join("; "))
        };
        NoteBody {
            title: doc.title.unwrap_or_else(|| title_from_url(url)),
            content: doc.html,
            metadata: doc.frontmatter.properties,
            template: doc.template.unwrap_or(default),
            links: doc.links,
            tags: doc.tags,
            cites: doc.citations,
            diagnostic,
        }
    }
}

impl std::fmt::Debug for NoteFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoteFactory")
            .field("parser", &self.parser.name())
            .field("notes", &self.graph.len())
            .field("pool", &self.pool)
            .finish()
    }
}

async fn read_source(path: &Path) -> Result<String, ParserError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ParserError::parse_failed(format!("cannot read file: {e}")))?;
    String::from_utf8(bytes).map_err(|e| ParserError::from(e.utf8_error()))
}

/// Index files render with the index template unless they pick another
fn default_template(relative: &Path, index_name: &str) -> TemplateSelector {
    let is_index = relative
        .file_stem()
        .and_then(|stem| stem.to_str())
        .is_some_and(|stem| stem.eq_ignore_ascii_case(index_name));
    if is_index {
        TemplateSelector::Index
    } else {
        TemplateSelector::Default
    }
}
