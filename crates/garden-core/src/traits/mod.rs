//! Collaborator abstractions for the garden's Dependency Inversion layout
//!
//! Core defines the traits; infrastructure crates implement them and the
//! pipeline wires implementations together through trait objects.
//!
//! ```text
//! ┌──────────────────┐
//! │   garden-core    │  ← defines traits, owns the graph
//! │  - MarkdownParser│
//! │  - HistoryProvider
//! │  - Bibliography  │
//! │  - RenderDispatcher
//! └────────┬─────────┘
//!          │ implemented by
//!          ▼
//! ┌──────────────────┐
//! │ garden-parser     │  pulldown-cmark adapter
//! │ garden-enrichment │  git / filesystem history, CSL-JSON bibliography
//! │ garden-cli        │  manifest renderer
//! └──────────────────┘
//! ```

pub mod bibliography;
pub mod history;
pub mod render;

pub use crate::parser::MarkdownParser;
pub use bibliography::{BibEntry, Bibliography};
pub use history::HistoryProvider;
pub use render::{RenderDispatcher, RenderSummary};
