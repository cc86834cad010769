//! Concurrency behavior of full builds
//!
//! Confluence across worker counts, the enrichment quiescence barriers,
//! timeout recovery and cancellation.

mod common;

use async_trait::async_trait;
use common::TestGarden;
use garden_core::test_support::MockHistoryProvider;
use garden_core::{EditHistory, NoteGraph, NoteSnapshot, RenderDispatcher, RenderSummary};
use garden_pipeline::SiteBuilder;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Forty notes linking forward, backward and into the void
fn busy_garden() -> TestGarden {
    let garden = TestGarden::new();
    for i in 0..40 {
        let body = format!(
            "# Note {i}\n[[n{}]] [[n{}]] [[ghost{}]] #t{}\n",
            (i + 1) % 40,
            (i * 7) % 45,
            i % 5,
            i % 3
        );
        garden.write(&format!("n{i}.md"), body.as_bytes());
    }
    garden
}

fn snapshot(graph: &NoteGraph) -> Vec<NoteSnapshot> {
    graph.notes().iter().map(|n| n.snapshot()).collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_graph_independent_of_worker_count() {
    let garden = busy_garden();

    let mut graphs = Vec::new();
    for workers in [1, 4, 16] {
        let mut config = garden.config();
        config.build.parse_workers = workers;
        let build = SiteBuilder::new(config).build().await.unwrap();
        graphs.push(snapshot(&build.graph));
    }

    assert_eq!(graphs[0], graphs[1]);
    assert_eq!(graphs[0], graphs[2]);
    // 40 sources, n40..n44 and ghost0..ghost4 stubs, t0..t2 tag pages
    assert_eq!(graphs[0].len(), 40 + 5 + 5 + 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_dangling_links_share_one_stub() {
    let garden = TestGarden::new();
    for i in 0..32 {
        garden.write(&format!("s{i}.md"), b"[[shared target]]");
    }

    let build = garden.builder().build().await.unwrap();

    let stub = build.graph.get("/shared_target/").unwrap();
    assert!(stub.is_stub());
    assert_eq!(stub.backlink_count(), 32);
    assert_eq!(build.report.resolution.stubs_created, vec!["/shared_target/"]);
    assert_eq!(build.graph.len(), 33);
}

#[tokio::test]
async fn test_slow_history_completes_before_close() {
    let garden = TestGarden::with_notes(&[
        ("a.md", "[[b]] [[gone]]"),
        ("b.md", "[[a]]"),
        ("c.md", "#tagged"),
    ]);
    let provider = Arc::new(MockHistoryProvider::new().with_delay(Duration::from_millis(40)));

    let build = garden
        .builder_with(Arc::clone(&provider))
        .build()
        .await
        .unwrap();

    let expected = provider.known_history();
    for url in ["/a/", "/b/", "/c/"] {
        let note = build.graph.get(url).unwrap();
        assert_eq!(note.history(), Some(&expected), "{url}");
    }
    for url in ["/gone/", "/tags/tagged/"] {
        let note = build.graph.get(url).unwrap();
        assert!(note.history().is_some_and(EditHistory::is_unknown), "{url}");
    }

    assert_eq!(provider.calls(), 3);
    assert!(provider.seen().iter().all(|p| p.is_absolute()));
    assert_eq!(build.report.enrichment.succeeded, 3);
    assert_eq!(build.report.quiescence_timeouts, 0);
}

#[tokio::test]
async fn test_failed_history_uses_default() {
    let garden = TestGarden::with_notes(&[("a.md", "x"), ("b.md", "y")]);
    let provider = Arc::new(MockHistoryProvider::new().failing_on("b.md"));

    let build = garden.builder_with(provider).build().await.unwrap();

    assert!(!build.graph.get("/a/").unwrap().history().unwrap().is_unknown());
    let b = build.graph.get("/b/").unwrap();
    assert_eq!(b.history(), Some(&EditHistory::unknown()));
    assert_eq!(b.snapshot().edit_count, 1);
    assert_eq!(build.report.enrichment.failed, 1);
}

#[tokio::test]
async fn test_hanging_history_hits_quiescence_timeout() {
    let garden = TestGarden::with_notes(&[("fast.md", "[[slow]]"), ("slow.md", "[[fast]]")]);
    let provider = Arc::new(MockHistoryProvider::new().hanging_on("slow.md"));
    let mut config = garden.config();
    config.enrichment.call_timeout_secs = 60;
    config.enrichment.quiescence_timeout_secs = 1;

    let build = SiteBuilder::new(config)
        .with_history_provider(provider)
        .build()
        .await
        .unwrap();

    assert_eq!(build.report.quiescence_timeouts, 1);
    assert_eq!(build.report.enrichment.cancelled, 1);
    assert!(build
        .graph
        .get("/slow/")
        .unwrap()
        .history()
        .is_some_and(EditHistory::is_unknown));
    assert!(!build.graph.get("/fast/").unwrap().history().unwrap().is_unknown());
    assert_eq!(build.graph.get("/fast/").unwrap().backlinks(), vec!["/slow/"]);
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let garden = busy_garden();
    let token = CancellationToken::new();
    token.cancel();

    let err = garden
        .builder()
        .with_cancellation(token)
        .build()
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert!(err.to_string().contains("of 40 notes"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancelled_during_enrichment() {
    let garden = busy_garden();
    let provider = Arc::new(MockHistoryProvider::new().with_delay(Duration::from_millis(200)));
    let builder = garden.builder_with(Arc::clone(&provider));
    let token = builder.cancellation_token();

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
    });
    let err = builder.build().await.unwrap_err();
    canceller.await.unwrap();

    assert!(err.is_cancelled());
    assert!(provider.calls() < 40);
}

#[tokio::test]
async fn test_builder_reusable_after_strict_failure() {
    let garden = TestGarden::with_notes(&[("A.md", "x"), ("a.md", "y")]);
    let mut config = garden.config();
    config.build.strict_urls = true;
    let builder = SiteBuilder::new(config);
    let token = builder.cancellation_token();

    assert!(builder.build().await.is_err());
    assert!(!token.is_cancelled());
}

#[tokio::test]
async fn test_strict_collision_stops_scheduling() {
    let garden = TestGarden::with_notes(&[("A.md", "x"), ("a.md", "y")]);
    for c in 'b'..='t' {
        garden.write(&format!("{c}.md"), b"later note");
    }
    let provider = Arc::new(MockHistoryProvider::new());
    let mut config = garden.config();
    config.build.strict_urls = true;
    config.build.parse_workers = 1;

    let builder = SiteBuilder::new(config).with_history_provider(provider.clone());
    assert!(builder.build().await.is_err());

    // Only A.md was created before the collision; the rest never ran
    assert!(provider.calls() <= 1, "{:?}", provider.seen());
    assert!(provider.seen().iter().all(|path| path.ends_with("A.md")));
}

/// Renderer recording what it was handed
#[derive(Default)]
struct CountingRenderer {
    renders: AtomicUsize,
}

#[async_trait]
impl RenderDispatcher for CountingRenderer {
    async fn render(&self, graph: &NoteGraph) -> anyhow::Result<RenderSummary> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        let notes = graph.closed_notes()?;
        for note in &notes {
            anyhow::ensure!(note.history().is_some(), "{} not enriched", note.url());
        }
        Ok(RenderSummary {
            rendered: notes.len(),
            outputs: notes
                .iter()
                .map(|n| PathBuf::from(n.url().trim_matches('/')).join("index.html"))
                .collect(),
        })
    }
}

#[tokio::test]
async fn test_renderer_sees_closed_enriched_graph() {
    let garden = TestGarden::with_notes(&[("a.md", "[[b]] #t"), ("b.md", "text")]);
    let provider = Arc::new(MockHistoryProvider::new().with_delay(Duration::from_millis(20)));
    let renderer = CountingRenderer::default();

    let (build, summary) = garden
        .builder_with(provider)
        .build_and_render(&renderer)
        .await
        .unwrap();

    assert_eq!(renderer.renders.load(Ordering::SeqCst), 1);
    assert_eq!(summary.rendered, build.graph.len());
    assert_eq!(summary.rendered, 3);
    assert!(summary.outputs.contains(&PathBuf::from("tags/t/index.html")));
}
