//! Parser trait

use super::error::ParserResult;
use super::types::{Frontmatter, ParsedDocument};

/// Markdown-to-HTML parse adapter
///
/// Implementations must be re-entrant: documents are parsed concurrently from
/// many tasks, so no state may leak from one call to the next.
pub trait MarkdownParser: Send + Sync {
    /// Parse only the frontmatter block.
    ///
    /// Used before registration to compute URL overrides, so it must be cheap
    /// and must agree with the frontmatter returned by [`parse`](Self::parse).
    fn parse_frontmatter(&self, source: &str) -> ParserResult<Frontmatter>;

    /// Parse a complete document: frontmatter, HTML body and side channels
    fn parse(&self, source: &str) -> ParserResult<ParsedDocument>;

    /// Parser name for logs
    fn name(&self) -> &'static str {
        "markdown"
    }
}
