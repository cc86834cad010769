//! # Garden Core
//!
//! The note graph of a digital-garden site builder: canonical URL mapping, the
//! note entity, the URL-keyed registry, tag and citation indexes, and the
//! backlink resolution pass, all owned by one [`NoteGraph`] build context.
//!
//! Collaborators (markdown parser, edit-history provider, bibliography, render
//! dispatcher) are traits defined here and implemented in other crates.
//!
//! ```rust
//! use garden_core::{Note, NoteBody, NoteGraph};
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), garden_core::GraphError> {
//! let graph = NoteGraph::default();
//! let a = Arc::clone(graph.register_source(Note::source("/a/", "a.md"))?.registered());
//! a.populate(|| async {
//!     NoteBody { links: ["/b/".to_string()].into(), ..NoteBody::default() }
//! })
//! .await;
//!
//! graph.begin_resolution()?;
//! graph.resolve_backlinks()?;
//! graph.close()?;
//!
//! let b = graph.get("/b/").expect("stub created");
//! assert!(b.is_stub());
//! assert_eq!(b.backlinks(), vec!["/a/".to_string()]);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod graph;
pub mod index;
pub mod note;
pub mod parser;
pub mod registry;
pub mod test_support;
pub mod traits;
pub mod url;

pub use error::{GraphError, GraphResult};
pub use graph::{AggregateReport, GraphOptions, GraphPhase, NoteGraph, ResolutionReport};
pub use index::KeyIndex;
pub use note::{AggregateKind, EditHistory, Note, NoteBody, NoteOrigin, NoteSnapshot};
pub use parser::{
    Frontmatter, FrontmatterFormat, MarkdownParser, Metadata, ParsedDocument, ParserError,
    ParserResult, TemplateSelector,
};
pub use registry::{CollisionPolicy, NoteRegistry, Registration};
pub use traits::{BibEntry, Bibliography, HistoryProvider, RenderDispatcher, RenderSummary};
