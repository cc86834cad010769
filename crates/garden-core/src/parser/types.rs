//! Core data types for parsed markdown documents

use super::error::ParserError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;

/// Frontmatter key/value mapping
pub type Metadata = Map<String, Value>;

/// A parsed markdown document and its side channels
///
/// Produced by a [`MarkdownParser`](super::MarkdownParser) from raw document
/// text. Link targets are already canonical URLs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedDocument {
    /// Rendered HTML body (leading title heading removed)
    pub html: String,

    /// Title from frontmatter, else the first level-1 heading
    pub title: Option<String>,

    /// Parsed frontmatter
    pub frontmatter: Frontmatter,

    /// Canonical URLs of every wikilink target
    pub links: BTreeSet<String>,

    /// Normalized tag keys
    pub tags: BTreeSet<String>,

    /// Normalized citation keys
    pub citations: BTreeSet<String>,

    /// Wiki-image sources, in document order
    pub images: Vec<String>,

    /// Declared template, if the frontmatter names a valid one
    pub template: Option<TemplateSelector>,

    /// Recoverable problems found while parsing
    pub diagnostics: Vec<String>,
}

impl ParsedDocument {
    /// Word count of the rendered body with markup stripped
    pub fn word_count(&self) -> usize {
        word_count(&self.html)
    }
}

/// Count whitespace-separated words in HTML, ignoring tags
pub fn word_count(html: &str) -> usize {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => {
                in_tag = true;
                text.push(' ');
            }
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }
    text.split_whitespace().count()
}

/// Frontmatter metadata block
///
/// Supports both YAML (`---`) and TOML (`+++`) frontmatter formats.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frontmatter {
    /// Format the block was written in
    pub format: FrontmatterFormat,

    /// Parsed properties
    pub properties: Metadata,
}

impl Frontmatter {
    /// Create frontmatter from parsed properties
    pub fn new(format: FrontmatterFormat, properties: Metadata) -> Self {
        Self { format, properties }
    }

    /// Whether the document carried no frontmatter properties
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Get a scalar property rendered as a string
    pub fn get_string(&self, key: &str) -> Option<String> {
        match self.properties.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Declared `title`
    pub fn title(&self) -> Option<String> {
        self.get_string("title").filter(|t| !t.trim().is_empty())
    }

    /// Declared full URL override
    pub fn url(&self) -> Option<String> {
        self.get_string("url")
    }

    /// Declared last-segment override
    pub fn slug(&self) -> Option<String> {
        self.get_string("slug")
    }

    /// Declared template name
    pub fn template(&self) -> Option<String> {
        self.get_string("template")
    }
}

/// Frontmatter format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrontmatterFormat {
    /// YAML between `---` fences
    Yaml,
    /// TOML between `+++` fences
    Toml,
    /// No frontmatter
    #[default]
    None,
}

/// Template a render dispatcher should use for a note
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateSelector {
    /// Regular article page
    #[default]
    Default,
    /// Listing page (directory index files, tag pages)
    Index,
    /// Reference page (citation pages)
    Literature,
    /// Named template supplied by the site
    Custom(String),
}

impl TemplateSelector {
    /// Validate a frontmatter template name.
    ///
    /// Custom names must be non-empty and consist of ASCII alphanumerics,
    /// `-` and `_` so they can be used as template file names verbatim.
    pub fn parse(name: &str) -> Result<Self, ParserError> {
        let normalized = name.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "default" | "article" | "note" => Ok(Self::Default),
            "index" => Ok(Self::Index),
            "literature" => Ok(Self::Literature),
            "" => Err(ParserError::InvalidTemplate(name.to_string())),
            custom
                if custom
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') =>
            {
                Ok(Self::Custom(custom.to_string()))
            }
            _ => Err(ParserError::InvalidTemplate(name.to_string())),
        }
    }

    /// Template key handed to the renderer
    pub fn name(&self) -> &str {
        match self {
            Self::Default => "default",
            Self::Index => "index",
            Self::Literature => "literature",
            Self::Custom(name) => name,
        }
    }
}

impl fmt::Display for TemplateSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
