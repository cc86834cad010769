//! Wikilink, wiki-image, tag and citation extraction
//!
//! Grammar (outside code and raw HTML only):
//!
//! - wikilink: `[[target]]`, `[[target|alias]]`, `[[target#heading]]`
//! - wiki-image: `![[file.png]]`, `![[file.png|alt text]]` (not a link)
//! - tag: `#` at the start of the text or after whitespace, then a letter,
//!   digit or `_`, then letters, digits, `_`, `-` or `/`. Trailing `-` and
//!   `/` are not part of the tag. Keys are lower-cased.
//! - citation: `@` at the start of the text or after whitespace or `[`, then a
//!   letter, digit or `_`, then letters, digits, `_`, `-`, `:` or `.`.
//!   Trailing `.` and `:` are not part of the key. Keys are lower-cased.
//!
//! Every match is swapped for a placeholder token before the markdown
//! renderer runs, and its canonical key is collected as a side channel. The
//! token is ordinary paragraph text to pulldown-cmark, so it never changes
//! block structure; [`crate::html::render`] expands it into inline HTML
//! events afterwards.

use crate::code_spans::in_ranges;
use garden_core::traits::Bibliography;
use garden_core::url::{link_to_url, tag_url};
use regex::Regex;
use std::collections::BTreeSet;
use std::ops::Range;
use std::sync::LazyLock;

static WIKILINK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(!?)\[\[([^\[\]\n]+)\]\]").expect("wikilink regex"));

static TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)#([\p{L}\p{N}_][\p{L}\p{N}_/\-]*)").expect("tag regex")
});

static CITATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[\s\[])@([\p{L}\p{N}_][\p{L}\p{N}_:.\-]*)").expect("citation regex")
});

const PLACEHOLDER_OPEN: char = '\u{E000}';
const PLACEHOLDER_CLOSE: char = '\u{E001}';

/// One piece of a replacement's output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// Markup emitted verbatim
    Html(String),
    /// Visible text, escaped by the renderer
    Text(String),
}

/// Piece of rewritten text: literal markdown text or an expanded match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Piece<'a> {
    /// Text that was not part of a match
    Literal(&'a str),
    /// Index into [`InlineExtraction::inserts`] of the match the token stands for
    Insert(usize),
}

/// Side channels collected while rewriting a body
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InlineExtraction {
    /// Markdown with every match replaced by a placeholder token
    pub markdown: String,
    /// Output for each placeholder, indexed by the token's number
    pub inserts: Vec<Vec<Fragment>>,
    /// Canonical URLs of wikilink targets
    pub links: BTreeSet<String>,
    /// Tag keys
    pub tags: BTreeSet<String>,
    /// Citation keys
    pub citations: BTreeSet<String>,
    /// Wiki-image sources
    pub images: Vec<String>,
}

struct Replacement {
    range: Range<usize>,
    fragments: Vec<Fragment>,
}

/// Extract and rewrite inline syntax in `body`, skipping `verbatim` ranges
pub fn rewrite_inline(
    body: &str,
    verbatim: &[Range<usize>],
    index_name: &str,
    bibliography: Option<&dyn Bibliography>,
) -> InlineExtraction {
    let mut out = InlineExtraction::default();
    let mut replacements: Vec<Replacement> = Vec::new();

    for caps in WIKILINK_REGEX.captures_iter(body) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(2)) else {
            continue;
        };
        if in_ranges(verbatim, whole.start()) {
            continue;
        }
        let is_image = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
        let fragments = if is_image {
            wiki_image(inner.as_str(), &mut out)
        } else {
            wikilink(inner.as_str(), index_name, &mut out)
        };
        if let Some(fragments) = fragments {
            replacements.push(Replacement {
                range: whole.range(),
                fragments,
            });
        }
    }

    let taken: Vec<Range<usize>> = replacements.iter().map(|r| r.range.clone()).collect();
    let skip = |offset: usize| in_ranges(verbatim, offset) || in_ranges(&taken, offset);

    for caps in TAG_REGEX.captures_iter(body) {
        let Some(token) = caps.get(1) else { continue };
        let hash = token.start() - 1;
        if skip(hash) {
            continue;
        }
        let key = token.as_str().trim_end_matches(['-', '/']);
        let key_lower = key.to_lowercase();
        replacements.push(Replacement {
            range: hash..token.start() + key.len(),
            fragments: vec![
                Fragment::Html(format!(
                    r#"<a class="tag" href="{}">"#,
                    escape_html(&tag_url(&key_lower))
                )),
                Fragment::Text(format!("#{key}")),
                Fragment::Html("</a>".to_string()),
            ],
        });
        out.tags.insert(key_lower);
    }

    for caps in CITATION_REGEX.captures_iter(body) {
        let Some(token) = caps.get(1) else { continue };
        let at = token.start() - 1;
        if skip(at) {
            continue;
        }
        let key = token.as_str().trim_end_matches(['.', ':']);
        let key_lower = key.to_lowercase();
        if let Some(entry) = bibliography.and_then(|bib| bib.lookup(&key_lower)) {
            replacements.push(Replacement {
                range: at..token.start() + key.len(),
                fragments: vec![
                    Fragment::Html(r#"<span class="tooltip">"#.to_string()),
                    Fragment::Text(format!("@{key}")),
                    Fragment::Html(r#"<span class="tooltiptext">"#.to_string()),
                    Fragment::Text(entry.title),
                    Fragment::Html("</span></span>".to_string()),
                ],
            });
        }
        out.citations.insert(key_lower);
    }

    replacements.sort_by_key(|r| r.range.start);
    let mut markdown = String::with_capacity(body.len());
    let mut cursor = 0;
    for replacement in replacements {
        if replacement.range.start < cursor {
            continue;
        }
        markdown.push_str(&body[cursor..replacement.range.start]);
        markdown.push(PLACEHOLDER_OPEN);
        markdown.push_str(&out.inserts.len().to_string());
        markdown.push(PLACEHOLDER_CLOSE);
        out.inserts.push(replacement.fragments);
        cursor = replacement.range.end;
    }
    markdown.push_str(&body[cursor..]);
    out.markdown = markdown;
    out
}

/// Split rendered text at placeholder tokens.
///
/// Tokens that do not name an entry of `inserts` stay literal text.
pub fn split_placeholders<'a>(text: &'a str, inserts: &[Vec<Fragment>]) -> Vec<Piece<'a>> {
    let mut pieces = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find(PLACEHOLDER_OPEN) {
        let after = &rest[open + PLACEHOLDER_OPEN.len_utf8()..];
        let insert = after.find(PLACEHOLDER_CLOSE).and_then(|close| {
            let index: usize = after[..close].parse().ok()?;
            (index < inserts.len()).then_some((index, close))
        });
        match insert {
            Some((index, close)) => {
                if open > 0 {
                    pieces.push(Piece::Literal(&rest[..open]));
                }
                pieces.push(Piece::Insert(index));
                rest = &after[close + PLACEHOLDER_CLOSE.len_utf8()..];
            }
            None => {
                let literal_end = open + PLACEHOLDER_OPEN.len_utf8();
                pieces.push(Piece::Literal(&rest[..literal_end]));
                rest = &rest[literal_end..];
            }
        }
    }
    if !rest.is_empty() {
        pieces.push(Piece::Literal(rest));
    }
    pieces
}

fn wikilink(inner: &str, index_name: &str, out: &mut InlineExtraction) -> Option<Vec<Fragment>> {
    let (target, alias) = match inner.split_once('|') {
        Some((target, alias)) => (target.trim(), Some(alias.trim())),
        None => (inner.trim(), None),
    };
    if target.is_empty() {
        return None;
    }

    let label = alias
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| target.trim_start_matches('/'));

    match link_to_url(target, index_name) {
        Some(url) => {
            let open = format!(r#"<a class="wikilink" href="{}">"#, escape_html(&url));
            out.links.insert(url);
            Some(vec![
                Fragment::Html(open),
                Fragment::Text(label.to_string()),
                Fragment::Html("</a>".to_string()),
            ])
        }
        // Same-page reference such as [[#section]]
        None => Some(vec![
            Fragment::Html(r#"<span class="wikilink">"#.to_string()),
            Fragment::Text(label.trim_start_matches('#').to_string()),
            Fragment::Html("</span>".to_string()),
        ]),
    }
}

fn wiki_image(inner: &str, out: &mut InlineExtraction) -> Option<Vec<Fragment>> {
    let src = inner.split('|').next().unwrap_or_default().trim();
    if src.is_empty() {
        return None;
    }
    let alt = inner.rsplit('|').next().unwrap_or(src).trim();
    let url = format!("/{}", src.trim_start_matches('/').to_lowercase());
    let html = format!(
        r#"<img class="wikiimage" src="{}" alt="{}">"#,
        escape_html(&url),
        escape_html(alt)
    );
    out.images.push(url);
    Some(vec![Fragment::Html(html)])
}

/// Escape text for HTML element content and attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
