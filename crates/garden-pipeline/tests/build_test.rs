//! End-to-end builds over small gardens
//!
//! Each test writes a content tree into a temp dir, runs a full build and
//! inspects the closed graph.

mod common;

use common::{backlinks, TestGarden};
use garden_core::test_support::MemoryBibliography;
use garden_core::{AggregateKind, GraphError, NoteGraph, NoteOrigin, TemplateSelector};
use garden_pipeline::PipelineError;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

fn urls(graph: &NoteGraph) -> Vec<String> {
    graph.notes().iter().map(|n| n.url().to_string()).collect()
}

#[tokio::test]
async fn test_chain_with_dangling_end() {
    let garden = TestGarden::with_notes(&[("a.md", "# A\n[[b]]"), ("b.md", "# B\n[[c]]")]);

    let build = garden.builder().build().await.unwrap();
    let graph = &build.graph;

    assert_eq!(urls(graph), vec!["/a/", "/b/", "/c/"]);
    assert!(backlinks(graph, "/a/").is_empty());
    assert_eq!(backlinks(graph, "/b/"), vec!["/a/"]);
    assert_eq!(backlinks(graph, "/c/"), vec!["/b/"]);

    let c = graph.get("/c/").unwrap();
    assert!(c.is_stub());
    assert_eq!(c.origin(), NoteOrigin::Dangling);
    assert!(c.links().is_empty());
    assert_eq!(c.content(), "");

    assert_eq!(build.report.notes_discovered, 2);
    assert_eq!(build.report.notes_created, 2);
    assert_eq!(build.report.resolution.stubs_created, vec!["/c/"]);
    assert_eq!(build.report.resolution.edges_added, 2);
    assert_eq!(build.report.total_notes, 3);
}

#[tokio::test]
async fn test_mutual_links() {
    let garden = TestGarden::with_notes(&[("x.md", "[[y]]"), ("y.md", "[[x]]")]);

    let build = garden.builder().build().await.unwrap();
    let graph = &build.graph;

    assert_eq!(graph.len(), 2);
    assert_eq!(backlinks(graph, "/x/"), vec!["/y/"]);
    assert_eq!(backlinks(graph, "/y/"), vec!["/x/"]);
    assert!(build.report.resolution.stubs_created.is_empty());
}

#[tokio::test]
async fn test_backlinks_invert_links() {
    let garden = TestGarden::with_notes(&[
        ("index.md", "# Home\n[[a]] [[b]] [[topics/c]]"),
        ("a.md", "[[b]] and again [[b|B]] and [[missing]]"),
        ("b.md", "[[a#section]] [[index]]"),
        ("topics/c.md", "[[a]] [[C Note]] #topic"),
        ("topics/index.md", "[[c]]"),
    ]);

    let build = garden.builder().build().await.unwrap();
    let graph = &build.graph;

    let notes = graph.closed_notes().unwrap();
    for source in &notes {
        for target in source.links() {
            let target = graph
                .get(target)
                .unwrap_or_else(|| panic!("link target {target} unresolved"));
            assert!(target.has_backlink(source.url()));
        }
    }
    for target in &notes {
        for source in target.backlinks() {
            let source = graph.get(&source).unwrap();
            assert!(
                source.links().contains(target.url())
                    || matches!(target.origin(), NoteOrigin::Aggregate(_))
            );
        }
    }
    for stub in notes.iter().filter(|n| n.is_stub()) {
        assert!(stub.links().is_empty());
    }
}

#[tokio::test]
async fn test_repeated_link_is_one_edge() {
    let garden = TestGarden::with_notes(&[("a.md", "[[b]] [[b]] [[B]] [[b.md]]"), ("b.md", "# B")]);

    let build = garden.builder().build().await.unwrap();

    assert_eq!(build.graph.get("/a/").unwrap().links().len(), 1);
    assert_eq!(backlinks(&build.graph, "/b/"), vec!["/a/"]);
    assert_eq!(build.report.resolution.edges_added, 1);
}

#[tokio::test]
async fn test_rebuild_gives_same_graph() {
    let garden = TestGarden::with_notes(&[
        ("a.md", "[[b]] #garden"),
        ("b.md", "[[c]] @smith2020"),
        ("notes/d.md", "[[a]] #garden/seedling"),
    ]);
    let builder = garden.builder();

    let first = builder.build().await.unwrap();
    let second = builder.build().await.unwrap();

    let snapshot = |graph: &NoteGraph| -> Vec<_> {
        graph.notes().iter().map(|n| n.snapshot()).collect()
    };
    assert_eq!(snapshot(&first.graph), snapshot(&second.graph));
    assert!(!Arc::ptr_eq(&first.graph, &second.graph));
}

#[tokio::test]
async fn test_every_link_target_registered() {
    let garden = TestGarden::with_notes(&[
        ("a.md", "[[x]] [[y/z]] [[Deep/Path/Note.md]]"),
        ("b.md", "[[x]] [[a]]"),
    ]);

    let build = garden.builder().build().await.unwrap();
    let graph = &build.graph;

    let mut targets = BTreeSet::new();
    for note in graph.notes() {
        targets.extend(note.links().iter().cloned());
    }
    for target in &targets {
        assert!(graph.contains(target), "{target} missing");
    }
    assert_eq!(
        build.report.resolution.stubs_created,
        vec!["/deep/path/note/", "/x/", "/y/z/"]
    );
    assert_eq!(backlinks(graph, "/x/"), vec!["/a/", "/b/"]);
}

#[tokio::test]
async fn test_title_precedence() {
    let garden = TestGarden::with_notes(&[
        ("front.md", "---\ntitle: From Frontmatter\n---\n# From Heading\n"),
        ("heading.md", "# From Heading\n\nbody"),
        ("my_plain_note.md", "just text"),
        ("topics/index.md", "no heading"),
    ]);

    let build = garden.builder().build().await.unwrap();
    let graph = &build.graph;

    assert_eq!(graph.get("/front/").unwrap().title(), "From Frontmatter");
    assert_eq!(graph.get("/heading/").unwrap().title(), "From Heading");
    assert_eq!(graph.get("/my_plain_note/").unwrap().title(), "My plain note");
    assert_eq!(graph.get("/topics/").unwrap().title(), "Topics");
    assert_eq!(
        graph.get("/topics/").unwrap().template(),
        TemplateSelector::Index
    );
}

#[tokio::test]
async fn test_url_override_receives_links() {
    let garden = TestGarden::with_notes(&[
        ("deep/long name.md", "---\nurl: /short\n---\n# Short"),
        ("a.md", "[[short]] [[deep/long name]]"),
    ]);

    let build = garden.builder().build().await.unwrap();
    let graph = &build.graph;

    let short = graph.get("/short/").unwrap();
    assert!(!short.is_stub());
    assert_eq!(short.path(), Some(Path::new("deep/long name.md")));
    assert_eq!(short.backlinks(), vec!["/a/"]);
    // The computed URL is no longer a page of its own
    assert!(graph.get("/deep/long_name/").unwrap().is_stub());
}

#[tokio::test]
async fn test_excluded_and_hidden_files_skipped() {
    let garden = TestGarden::with_notes(&[
        ("a.md", "[[note]]"),
        ("templates/note.md", "# Template"),
        (".obsidian/config.md", "x"),
        ("drafts/.wip.md", "x"),
        ("images/plot.png", "png"),
    ]);

    let build = garden.builder().build().await.unwrap();

    assert_eq!(build.report.notes_discovered, 1);
    assert_eq!(build.report.assets, vec![Path::new("images/plot.png")]);
    assert!(build.graph.get("/note/").unwrap().is_stub());
    assert!(!build.graph.contains("/templates/note/"));
}

#[tokio::test]
async fn test_broken_notes_do_not_stop_the_build() {
    let garden = TestGarden::new();
    garden.write("good.md", b"[[bad_yaml]] [[bad_bytes]]");
    garden.write("bad_yaml.md", b"---\ntitle: [unclosed\n---\n[[good]]");
    garden.write("bad_bytes.md", b"# Title\n\xff\xfe [[good]]");

    let build = garden.builder().build().await.unwrap();
    let graph = &build.graph;

    assert_eq!(build.report.notes_created, 3);
    assert_eq!(build.report.diagnostics.len(), 2);
    let paths: Vec<_> = build
        .report
        .diagnostics
        .iter()
        .map(|d| d.path.clone())
        .collect();
    assert_eq!(paths, vec![Path::new("bad_bytes.md"), Path::new("bad_yaml.md")]);
    assert!(build.report.diagnostics[0].message.contains("UTF-8"));

    for url in ["/bad_yaml/", "/bad_bytes/"] {
        let note = graph.get(url).unwrap();
        assert!(!note.is_stub());
        assert!(note.links().is_empty());
        assert_eq!(note.content(), "");
        assert!(note.diagnostic().is_some());
        assert_eq!(note.backlinks(), vec!["/good/"]);
    }
    assert_eq!(graph.get("/bad_yaml/").unwrap().title(), "Bad yaml");
    assert!(backlinks(graph, "/good/").is_empty());
}

#[tokio::test]
async fn test_collision_smaller_path_wins() {
    let garden = TestGarden::with_notes(&[("A Note.md", "# Upper\n[[x]]"), ("a_note.md", "# Lower\n[[y]]")]);
    let mut config = garden.config();
    config.build.parse_workers = 1;

    let build = garden_pipeline::SiteBuilder::new(config)
        .build()
        .await
        .unwrap();
    let graph = &build.graph;

    let note = graph.get("/a_note/").unwrap();
    assert_eq!(note.path(), Some(Path::new("A Note.md")));
    assert_eq!(note.title(), "Upper");
    assert_eq!(build.report.notes_rejected, 1);
    assert!(graph.contains("/x/"));
    assert!(!graph.contains("/y/"));
}

#[tokio::test]
async fn test_collision_winner_independent_of_workers() {
    for workers in [1, 4, 16] {
        let garden = TestGarden::with_notes(&[
            ("a_note.md", "# Lower"),
            ("A Note.md", "# Upper"),
            ("A  NOTE.md", "# Shout"),
        ]);
        let mut config = garden.config();
        config.build.parse_workers = workers;

        let build = garden_pipeline::SiteBuilder::new(config)
            .build()
            .await
            .unwrap();
        let note = build.graph.get("/a_note/").unwrap();
        assert_eq!(note.path(), Some(Path::new("A  NOTE.md")), "workers={workers}");
        assert_eq!(build.graph.len(), 1);
    }
}

#[tokio::test]
async fn test_strict_collision_is_fatal() {
    let garden = TestGarden::with_notes(&[("A Note.md", "x"), ("a_note.md", "y")]);
    let mut config = garden.config();
    config.build.strict_urls = true;

    let err = garden_pipeline::SiteBuilder::new(config)
        .build()
        .await
        .unwrap_err();

    match err {
        PipelineError::Graph(GraphError::UrlCollision { url, .. }) => assert_eq!(url, "/a_note/"),
        other => panic!("expected collision, got {other}"),
    }
}

#[tokio::test]
async fn test_missing_content_root() {
    let garden = TestGarden::new();
    let mut config = garden.config();
    config.content.root = garden.root().join("absent");

    let err = garden_pipeline::SiteBuilder::new(config)
        .build()
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::ContentRoot(_)));
}

#[tokio::test]
async fn test_tag_and_citation_pages() {
    let garden = TestGarden::with_notes(&[
        ("a.md", "#Garden and #garden/seedling, see [@Smith2020]"),
        ("b.md", "#garden @jones2019 `#not-a-tag`"),
    ]);
    let bibliography = MemoryBibliography::new().with_entry("smith2020", "On Gardens");

    let build = garden
        .builder()
        .with_bibliography(Arc::new(bibliography))
        .build()
        .await
        .unwrap();
    let graph = &build.graph;

    assert_eq!(build.report.aggregates.tag_pages, 2);
    assert_eq!(build.report.aggregates.citation_pages, 2);
    assert_eq!(graph.tags().keys(), vec!["garden", "garden/seedling"]);

    let tag = graph.get("/tags/garden/").unwrap();
    assert_eq!(tag.origin(), NoteOrigin::Aggregate(AggregateKind::Tag));
    assert_eq!(tag.backlinks(), vec!["/a/", "/b/"]);
    assert_eq!(tag.title(), "#garden");
    assert_eq!(
        graph.get("/tags/garden/seedling/").unwrap().backlinks(),
        vec!["/a/"]
    );

    let known = graph.get("/citations/smith2020/").unwrap();
    assert_eq!(known.title(), "On Gardens");
    assert_eq!(known.backlinks(), vec!["/a/"]);
    assert_eq!(graph.get("/citations/jones2019/").unwrap().title(), "@jones2019");
    assert!(!graph.contains("/tags/not-a-tag/"));
}

#[tokio::test]
async fn test_source_note_owns_tag_url() {
    let garden = TestGarden::with_notes(&[
        ("tags/garden.md", "# About the garden tag"),
        ("a.md", "#garden"),
    ]);

    let build = garden.builder().build().await.unwrap();

    let page = build.graph.get("/tags/garden/").unwrap();
    assert!(!page.is_stub());
    assert_eq!(page.backlinks(), vec!["/a/"]);
    assert_eq!(build.report.aggregates.merged_into_source, vec!["/tags/garden/"]);
}
