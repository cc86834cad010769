//! HTML rendering with title extraction
//!
//! Placeholder tokens left by [`crate::inline::rewrite_inline`] are expanded
//! into inline HTML and text events here, after pulldown-cmark has settled
//! the block structure. The first level-1 heading with visible text is taken
//! as the document's heading title and removed from the rendered body.

use crate::inline::{split_placeholders, Fragment, Piece};
use pulldown_cmark::{html, CowStr, Event, HeadingLevel, Parser, Tag, TagEnd, TextMergeStream};

/// Rendered body plus the extracted heading title
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedBody {
    /// HTML without the title heading
    pub html: String,
    /// Text of the first non-empty `#` heading
    pub heading: Option<String>,
}

/// Render `markdown` (already rewritten for inline syntax) to HTML
pub fn render<'a>(markdown: &'a str, inserts: &'a [Vec<Fragment>]) -> RenderedBody {
    let mut events: Vec<Event<'a>> = Vec::new();
    for event in TextMergeStream::new(Parser::new_ext(markdown, crate::markdown_options())) {
        expand(event, inserts, &mut events);
    }

    let mut heading = None;
    let mut skip = None;
    let mut idx = 0;
    while idx < events.len() {
        if let Event::Start(Tag::Heading {
            level: HeadingLevel::H1,
            ..
        }) = &events[idx]
        {
            let end = events[idx..]
                .iter()
                .position(|e| matches!(e, Event::End(TagEnd::Heading(HeadingLevel::H1))))
                .map(|offset| idx + offset)
                .unwrap_or(events.len() - 1);
            let text = heading_text(&events[idx + 1..end]);
            if !text.is_empty() {
                heading = Some(text);
                skip = Some(idx..=end);
                break;
            }
            idx = end;
        }
        idx += 1;
    }

    let mut output = String::with_capacity(markdown.len() * 3 / 2);
    let kept = events
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !skip.as_ref().is_some_and(|range| range.contains(i)))
        .map(|(_, event)| event);
    html::push_html(&mut output, kept);

    RenderedBody {
        html: output.trim_start().to_string(),
        heading,
    }
}

fn expand<'a>(event: Event<'a>, inserts: &'a [Vec<Fragment>], events: &mut Vec<Event<'a>>) {
    let text = match event {
        Event::Text(text) if !inserts.is_empty() => text,
        other => {
            events.push(other);
            return;
        }
    };
    for piece in split_placeholders(&text, inserts) {
        match piece {
            Piece::Literal(literal) => events.push(Event::Text(CowStr::from(literal.to_string()))),
            Piece::Insert(index) => {
                let fragments = inserts.get(index).into_iter().flatten();
                events.extend(fragments.map(|fragment| match fragment {
                    Fragment::Html(html) => Event::InlineHtml(CowStr::Borrowed(html.as_str())),
                    Fragment::Text(text) => Event::Text(CowStr::Borrowed(text.as_str())),
                }));
            }
        }
    }
}

fn heading_text(events: &[Event<'_>]) -> String {
    let mut text = String::new();
    for event in events {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(t),
            Event::SoftBreak | Event::HardBreak => text.push(' '),
            _ => {}
        }
    }
    text.trim().to_string()
}
