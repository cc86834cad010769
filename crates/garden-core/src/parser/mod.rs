//! Markdown parsing abstractions for the garden
//!
//! # Dependency Inversion Principle
//!
//! This module defines the **canonical** parser abstractions and types:
//! - `traits::MarkdownParser` - Core parser trait
//! - `types::*` - Parsed document, frontmatter and template selector
//! - `error::*` - Parser error types
//!
//! The `garden-parser` crate depends on these types and provides the
//! implementation.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{ParserError, ParserResult};
pub use traits::MarkdownParser;
pub use types::{
    word_count, Frontmatter, FrontmatterFormat, Metadata, ParsedDocument, TemplateSelector,
};
