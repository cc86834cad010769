//! Garden Markdown Parser
//!
//! Implements [`garden_core::MarkdownParser`] on top of pulldown-cmark:
//! - YAML (`---`) and TOML (`+++`) frontmatter
//! - Wikilinks `[[note]]`, `[[note|alias]]`, `[[note#heading]]`
//! - Wiki images `![[image.png|alt]]`
//! - Inline `#tags` and `@citations`
//! - Title extraction from the first level-1 heading
//!
//! Inline syntax inside code or raw HTML is left alone.

pub mod code_spans;
pub mod frontmatter;
pub mod html;
pub mod inline;
pub mod parser;

pub use frontmatter::{split_frontmatter, SplitDocument};
pub use inline::{escape_html, Fragment, InlineExtraction};
pub use parser::GardenMarkdownParser;

use garden_core::parser::MarkdownParser;
use garden_core::traits::Bibliography;
use pulldown_cmark::Options;
use std::sync::Arc;

/// Markdown dialect used for both code detection and rendering
pub(crate) fn markdown_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
}

/// Create the default parser as a trait object
pub fn create_parser(
    index_name: &str,
    bibliography: Option<Arc<dyn Bibliography>>,
) -> Arc<dyn MarkdownParser> {
    let parser = GardenMarkdownParser::new(index_name);
    match bibliography {
        Some(bib) => Arc::new(parser.with_bibliography(bib)),
        None => Arc::new(parser),
    }
}
