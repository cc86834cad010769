//! Verbatim span detection
//!
//! Wikilinks, tags and citations are plain text inside code and inside raw
//! HTML. Positions come from pulldown-cmark's own offsets, so fenced blocks,
//! indented blocks, inline code spans, HTML blocks and inline HTML tags are
//! recognized exactly as the renderer sees them.

use pulldown_cmark::{Event, Parser, Tag};
use std::ops::Range;

/// Byte ranges of all code and raw HTML in `body`, sorted and disjoint
pub fn verbatim_ranges(body: &str) -> Vec<Range<usize>> {
    let mut ranges: Vec<Range<usize>> = Parser::new_ext(body, crate::markdown_options())
        .into_offset_iter()
        .filter_map(|(event, range)| match event {
            Event::Start(Tag::CodeBlock(_))
            | Event::Start(Tag::HtmlBlock)
            | Event::Code(_)
            | Event::Html(_)
            | Event::InlineHtml(_) => Some(range),
            _ => None,
        })
        .collect();

    // HTML blocks report their lines again as nested `Html` events
    ranges.sort_by_key(|r| r.start);
    let mut merged: Vec<Range<usize>> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.start <= last.end => last.end = last.end.max(range.end),
            _ => merged.push(range),
        }
    }
    merged
}

/// Whether `offset` falls inside one of `ranges` (sorted, non-overlapping)
pub fn in_ranges(ranges: &[Range<usize>], offset: usize) -> bool {
    let idx = ranges.partition_point(|r| r.end <= offset);
    ranges.get(idx).is_some_and(|r| r.contains(&offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn covered(body: &str, needle: &str) -> bool {
        let ranges = verbatim_ranges(body);
        let offset = body.find(needle).expect("needle present");
        in_ranges(&ranges, offset)
    }

    #[test]
    fn test_fenced_block() {
        let body = "text [[a]]\n\n```\n[[b]] #tag\n```\n";
        assert!(!covered(body, "[[a]]"));
        assert!(covered(body, "[[b]]"));
        assert!(covered(body, "#tag"));
    }

    #[test]
    fn test_indented_block() {
        let body = "para\n\n    [[inside]]\n\nafter [[outside]]\n";
        assert!(covered(body, "[[inside]]"));
        assert!(!covered(body, "[[outside]]"));
    }

    #[test]
    fn test_inline_code() {
        let body = "use `#include` but #real";
        assert!(covered(body, "#include"));
        assert!(!covered(body, "#real"));
    }

    #[test]
    fn test_inline_html_attributes() {
        let body = r#"<span style="color: #fff">#red</span> text"#;
        assert!(covered(body, "#fff"));
        assert!(!covered(body, "#red"));
        assert!(!covered(body, "text"));
    }

    #[test]
    fn test_html_block() {
        let body = "<div class=\"note\">\n[[hidden]] #x\n</div>\n\nafter #y\n";
        assert!(covered(body, "[[hidden]]"));
        assert!(covered(body, "#x"));
        assert!(!covered(body, "#y"));

        let ranges = verbatim_ranges(body);
        assert!(ranges.windows(2).all(|w| w[0].end < w[1].start));
    }

    #[test]
    fn test_in_ranges_boundaries() {
        let ranges = vec![2..4, 8..10];
        assert!(!in_ranges(&ranges, 1));
        assert!(in_ranges(&ranges, 2));
        assert!(in_ranges(&ranges, 3));
        assert!(!in_ranges(&ranges, 4));
        assert!(in_ranges(&ranges, 9));
        assert!(!in_ranges(&ranges, 10));
    }
}
