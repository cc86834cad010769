//! The garden's markdown parser
//!
//! One parse is: split frontmatter, find code and raw HTML spans, rewrite inline syntax
//! while collecting its side channels, render with pulldown-cmark and pull
//! the title out. Parsers hold only immutable configuration, so one instance
//! is shared by every discovery task.

use crate::code_spans::verbatim_ranges;
use crate::frontmatter::split_frontmatter;
use crate::html::render;
use crate::inline::rewrite_inline;
use garden_core::parser::{
    Frontmatter, MarkdownParser, ParsedDocument, ParserResult, TemplateSelector,
};
use garden_core::traits::Bibliography;
use std::sync::Arc;
use tracing::debug;

/// pulldown-cmark backed [`MarkdownParser`]
#[derive(Clone)]
pub struct GardenMarkdownParser {
    index_name: String,
    bibliography: Option<Arc<dyn Bibliography>>,
}

impl GardenMarkdownParser {
    /// Parser canonicalizing link targets with `index_name`
    pub fn new(index_name: impl Into<String>) -> Self {
        Self {
            index_name: index_name.into(),
            bibliography: None,
        }
    }

    /// Attach a bibliography for citation tooltips
    pub fn with_bibliography(mut self, bibliography: Arc<dyn Bibliography>) -> Self {
        self.bibliography = Some(bibliography);
        self
    }
}

impl Default for GardenMarkdownParser {
    fn default() -> Self {
        Self::new("index")
    }
}

impl std::fmt::Debug for GardenMarkdownParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GardenMarkdownParser")
            .field("index_name", &self.index_name)
            .field(
                "bibliography_entries",
                &self.bibliography.as_ref().map(|b| b.len()),
            )
            .finish()
    }
}

impl MarkdownParser for GardenMarkdownParser {
    fn parse_frontmatter(&self, source: &str) -> ParserResult<Frontmatter> {
        Ok(split_frontmatter(source)?.frontmatter)
    }

    fn parse(&self, source: &str) -> ParserResult<ParsedDocument> {
        let split = split_frontmatter(source)?;
        let verbatim = verbatim_ranges(split.body);
        let inline = rewrite_inline(
            split.body,
            &verbatim,
            &self.index_name,
            self.bibliography.as_deref(),
        );
        let rendered = render(&inline.markdown, &inline.inserts);

        let mut diagnostics = Vec::new();
        let template = match split.frontmatter.template() {
            Some(name) => match TemplateSelector::parse(&name) {
                Ok(selector) => Some(selector),
                Err(err) => {
                    debug!(template = %name, "Ignoring invalid template selector");
                    diagnostics.push(err.to_string());
                    None
                }
            },
            None => None,
        };

        let title = split.frontmatter.title().or(rendered.heading);

        Ok(ParsedDocument {
            html: rendered.html,
            title,
            frontmatter: split.frontmatter,
            links: inline.links,
            tags: inline.tags,
            citations: inline.citations,
            images: inline.images,
            template,
            diagnostics,
        })
    }

    fn name(&self) -> &'static str {
        "pulldown-cmark"
    }
}
