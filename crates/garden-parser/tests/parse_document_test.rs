//! End-to-end parsing of realistic garden notes

use garden_core::test_support::MemoryBibliography;
use garden_core::{MarkdownParser, TemplateSelector};
use garden_parser::create_parser;
use std::sync::Arc;

const NOTE: &str = r#"---
title: Gardening Notes
template: literature
aliases:
  - garden
---
# Ignored Heading

Links to [[Soil Health]], [[compost|the compost pile]] and [[#Later]].

![[diagrams/Beds.png|Raised beds]]

Tagged #gardening and #project/beds. Source: @Doe2020, see also @nobody.

```rust
// [[not-a-link]] #not-a-tag @not-a-cite
```

## Later

Inline `[[nope]]` code.
"#;

#[test]
fn test_full_document() {
    let bib = Arc::new(MemoryBibliography::new().with_entry("doe2020", "Soil and Time"));
    let parser = create_parser("index", Some(bib));
    let doc = parser.parse(NOTE).unwrap();

    assert_eq!(doc.title.as_deref(), Some("Gardening Notes"));
    assert_eq!(doc.template, Some(TemplateSelector::Literature));
    assert!(doc.diagnostics.is_empty());

    let links: Vec<_> = doc.links.iter().map(String::as_str).collect();
    assert_eq!(links, vec!["/compost/", "/soil_health/"]);

    let tags: Vec<_> = doc.tags.iter().map(String::as_str).collect();
    assert_eq!(tags, vec!["gardening", "project/beds"]);

    let cites: Vec<_> = doc.citations.iter().map(String::as_str).collect();
    assert_eq!(cites, vec!["doe2020", "nobody"]);

    assert_eq!(doc.images, vec!["/diagrams/beds.png".to_string()]);

    assert!(!doc.html.contains("Ignored Heading"));
    assert!(doc.html.contains("<h2>Later</h2>"));
    assert!(doc.html.contains(r#"<a class="wikilink" href="/compost/">the compost pile</a>"#));
    assert!(doc.html.contains(r#"<span class="tooltiptext">Soil and Time</span>"#));
    assert!(doc.html.contains("[[not-a-link]]"));
    assert!(doc.html.contains("<code>[[nope]]</code>"));
    assert!(doc.word_count() > 10);
}

#[test]
fn test_parser_name_and_frontmatter_only() {
    let parser = create_parser("home", None);
    assert_eq!(parser.name(), "pulldown-cmark");

    let fm = parser
        .parse_frontmatter("+++\nurl = \"/custom/\"\n+++\nbody [[x]]")
        .unwrap();
    assert_eq!(fm.url().as_deref(), Some("/custom/"));
}

#[test]
fn test_index_name_canonicalizes_links() {
    let parser = create_parser("home", None);
    let doc = parser.parse("[[projects/home]] and [[home]]").unwrap();
    let links: Vec<_> = doc.links.iter().map(String::as_str).collect();
    assert_eq!(links, vec!["/", "/projects/"]);
}

#[test]
fn test_invalid_utf8_is_caller_concern() {
    let bytes = b"# Title\n\xff\xfe".to_vec();
    let err = std::str::from_utf8(&bytes).map_err(garden_core::ParserError::from);
    assert!(matches!(
        err,
        Err(garden_core::ParserError::EncodingError { valid_up_to: 8 })
    ));
}

#[test]
fn test_parse_is_deterministic() {
    let parser = create_parser("index", None);
    let first = parser.parse(NOTE).unwrap();
    let second = tokio_test::block_on(async { parser.parse(NOTE).unwrap() });
    assert_eq!(first.html, second.html);
    assert_eq!(first.links, second.links);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shared_parser_across_tasks() {
    let parser = create_parser("index", None);
    let mut handles = Vec::new();
    for i in 0..16 {
        let parser = Arc::clone(&parser);
        handles.push(tokio::spawn(async move {
            let source = format!("# Note {i}\n\n[[target-{i}]] #t{i}");
            parser.parse(&source).unwrap()
        }));
    }
    for (i, handle) in handles.into_iter().enumerate() {
        let doc = handle.await.unwrap();
        assert_eq!(doc.title, Some(format!("Note {i}")));
        assert!(doc.links.contains(&format!("/target-{i}/")));
        assert!(doc.tags.contains(&format!("t{i}")));
    }
}
