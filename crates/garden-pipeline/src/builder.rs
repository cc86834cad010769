//! Build orchestration
//!
//! ```text
//! SiteBuilder::build
//!   ├─> discover            walk the content root
//!   ├─> NoteFactory         register + parse every note (bounded tasks)
//!   ├─> quiescence (a)      all history lookups from discovery done
//!   ├─> begin_resolution
//!   ├─> synthesize_aggregates
//!   ├─> resolve_backlinks   one sweep, stubs for dangling links
//!   ├─> quiescence (b)
//!   ├─> close
//!   └─> quiescence (c)      before the render dispatcher sees the graph
//! ```
//!
//! Cancellation stops new parse and enrichment work from being scheduled,
//! drains whatever is in flight, and ends the build with
//! [`GraphError::Cancelled`].

use crate::discovery::{discover, Discovery, SourceFile};
use crate::error::{PipelineError, PipelineResult};
use crate::factory::{NoteFactory, Produced};
use garden_config::GardenConfig;
use garden_core::{
    AggregateReport, Bibliography, CollisionPolicy, GraphError, GraphOptions, HistoryProvider,
    MarkdownParser, NoteGraph, RenderDispatcher, RenderSummary, ResolutionReport,
};
use garden_enrichment::{
    create_history_provider, CslBibliography, EnrichmentPool, EnrichmentStats, Quiescence,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// A per-note problem that did not stop the build
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteDiagnostic {
    /// Source file, relative to the content root
    pub path: PathBuf,
    /// URL the note was registered under
    pub url: String,
    /// What went wrong
    pub message: String,
}

/// Everything a build did
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
    /// Note files found by the walk
    pub notes_discovered: usize,
    /// Notes registered and parsed
    pub notes_created: usize,
    /// Files that lost a URL collision
    pub notes_rejected: usize,
    /// Static assets found by the walk (not copied)
    pub assets: Vec<PathBuf>,
    /// Symlinked files the walk skipped
    pub symlinks: Vec<PathBuf>,
    /// Notes parsed with problems
    pub diagnostics: Vec<NoteDiagnostic>,
    /// Tag and citation page synthesis
    pub aggregates: AggregateReport,
    /// Backlink sweep
    pub resolution: ResolutionReport,
    /// History lookups
    pub enrichment: EnrichmentStats,
    /// Quiescence waits that hit their timeout
    pub quiescence_timeouts: usize,
    /// Registry size when the graph closed
    pub total_notes: usize,
    /// Wall-clock build time
    #[serde(with = "duration_ms")]
    pub elapsed: Duration,
}

mod duration_ms {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }
}

/// A closed graph and the report of the build that produced it
#[derive(Debug)]
pub struct Build {
    /// The closed note graph
    pub graph: Arc<NoteGraph>,
    /// What the build did
    pub report: BuildReport,
}

/// Builds a [`NoteGraph`] from a content directory
pub struct SiteBuilder {
    config: GardenConfig,
    parser: Arc<dyn MarkdownParser>,
    history: Arc<dyn HistoryProvider>,
    bibliography: Option<Arc<dyn Bibliography>>,
    cancel: CancellationToken,
}

impl SiteBuilder {
    /// Builder with the configured history provider and no bibliography
    pub fn new(config: GardenConfig) -> Self {
        let history = create_history_provider(config.enrichment.provider);
        let parser = garden_parser::create_parser(&config.content.index_name, None);
        Self {
            config,
            parser,
            history,
            bibliography: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Builder with everything the configuration names, loading the
    /// bibliography file when one is set
    pub async fn from_config(config: GardenConfig) -> anyhow::Result<Self> {
        let mut builder = Self::new(config);
        if let Some(path) = builder.config.build.bibliography.clone() {
            let bibliography = CslBibliography::load(&path).await?;
            builder = builder.with_bibliography(Arc::new(bibliography));
        }
        Ok(builder)
    }

    /// Replace the history provider
    pub fn with_history_provider(mut self, provider: Arc<dyn HistoryProvider>) -> Self {
        self.history = provider;
        self
    }

    /// Use `bibliography` for citation tooltips and citation page titles
    pub fn with_bibliography(mut self, bibliography: Arc<dyn Bibliography>) -> Self {
        self.parser = garden_parser::create_parser(
            &self.config.content.index_name,
            Some(Arc::clone(&bibliography)),
        );
        self.bibliography = Some(bibliography);
        self
    }

    /// Cancel the build when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that cancels this builder's builds
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Configuration in use
    pub fn config(&self) -> &GardenConfig {
        &self.config
    }

    /// Run a full build and return the closed graph
    pub async fn build(&self) -> PipelineResult<Build> {
        let started = Instant::now();
        let mut report = BuildReport::default();
        let cancel = self.cancel.child_token();

        let graph = Arc::new(NoteGraph::new(GraphOptions {
            index_name: self.config.content.index_name.clone(),
            collision_policy: if self.config.build.strict_urls {
                CollisionPolicy::Strict
            } else {
                CollisionPolicy::TieBreak
            },
        }));
        let pool = Arc::new(
            EnrichmentPool::from_config(Arc::clone(&self.history), &self.config.enrichment)
                .with_shutdown(cancel.clone()),
        );
        let quiescence_timeout = self.config.enrichment.quiescence_timeout();

        let discovery = self.walk().await?;
        report.notes_discovered = discovery.notes.len();
        report.assets = discovery.assets;
        report.symlinks = discovery.symlinks;
        info!(
            root = %self.config.content.root.display(),
            notes = report.notes_discovered,
            assets = report.assets.len(),
            history = pool.provider_name(),
            "Discovered content"
        );

        let factory = Arc::new(NoteFactory::new(
            Arc::clone(&graph),
            Arc::clone(&self.parser),
            Arc::clone(&pool),
        ));
        let workers = self.config.build.parse_workers;
        let outcome = create_notes(&factory, discovery.notes, workers, &cancel).await;

        // (a) after the walk; runs even on failure so no lookup outlives the build
        quiesce(&pool, quiescence_timeout, &mut report).await;
        let created = outcome?;
        report.notes_created = created.created;
        report.notes_rejected = created.rejected;
        report.diagnostics = created.diagnostics;
        check_cancelled(&cancel, report.notes_created, report.notes_discovered)?;

        graph.begin_resolution()?;
        report.aggregates = graph.synthesize_aggregates(self.bibliography.as_deref())?;
        report.resolution = graph.resolve_backlinks()?;

        // (b) after backlink resolution
        quiesce(&pool, quiescence_timeout, &mut report).await;
        check_cancelled(&cancel, report.notes_created, report.notes_discovered)?;
        graph.close()?;

        // (c) before the graph is handed to a renderer
        quiesce(&pool, quiescence_timeout, &mut report).await;

        report.enrichment = pool.stats();
        report.total_notes = graph.len();
        report.elapsed = started.elapsed();
        pool.log_summary();
        info!(
            notes = report.total_notes,
            created = report.notes_created,
            stubs = report.resolution.stubs_created.len(),
            edges = report.resolution.edges_added,
            diagnostics = report.diagnostics.len(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Build complete"
        );

        Ok(Build { graph, report })
    }

    /// Build, then hand the closed graph to `renderer`
    pub async fn build_and_render(
        &self,
        renderer: &dyn RenderDispatcher,
    ) -> anyhow::Result<(Build, RenderSummary)> {
        let build = self.build().await?;
        let summary = renderer.render(&build.graph).await?;
        Ok((build, summary))
    }

    async fn walk(&self) -> PipelineResult<Discovery> {
        let content = self.config.content.clone();
        let matcher = content.exclusion_matcher()?;
        tokio::task::spawn_blocking(move || discover(&content, &matcher))
            .await
            .map_err(|e| PipelineError::Task(e.to_string()))?
    }
}

impl std::fmt::Debug for SiteBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteBuilder")
            .field("root", &self.config.content.root)
            .field("parser", &self.parser.name())
            .field("history", &self.history.name())
            .field("bibliography", &self.bibliography.as_ref().map(|b| b.len()))
            .finish()
    }
}

#[derive(Debug, Default)]
struct Created {
    created: usize,
    rejected: usize,
    diagnostics: Vec<NoteDiagnostic>,
}

/// Run the factory over `files` with at most `workers` notes in flight.
///
/// Stops scheduling on cancellation or on the first structural error, then
/// drains the tasks already running.
async fn create_notes(
    factory: &Arc<NoteFactory>,
    files: Vec<SourceFile>,
    workers: usize,
    cancel: &CancellationToken,
) -> PipelineResult<Created> {
    let workers = workers.max(1);
    let permits = Arc::new(Semaphore::new(workers));
    let mut tasks: JoinSet<(SourceFile, PipelineResult<Produced>)> = JoinSet::new();
    let mut collected = Collected::default();

    debug!(files = files.len(), workers, "Creating notes");
    for file in files {
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            permit = Arc::clone(&permits).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };
        // Pick up errors from tasks that already finished
        while let Some(joined) = tasks.try_join_next() {
            collected.record(joined, cancel);
        }
        if collected.fatal.is_some() {
            break;
        }

        let factory = Arc::clone(factory);
        tasks.spawn(async move {
            let _permit = permit;
            let result = factory.get_or_create(&file).await;
            (file, result)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        collected.record(joined, cancel);
    }

    debug!(created = collected.created.created, "Note creation drained");
    match collected.fatal {
        Some(e) => Err(e),
        None => {
            let mut created = collected.created;
            created.diagnostics.sort_by(|a, b| a.path.cmp(&b.path));
            Ok(created)
        }
    }
}

type Joined = Result<(SourceFile, PipelineResult<Produced>), tokio::task::JoinError>;

#[derive(Default)]
struct Collected {
    created: Created,
    fatal: Option<PipelineError>,
}

impl Collected {
    fn record(&mut self, joined: Joined, cancel: &CancellationToken) {
        let (file, result) = match joined {
            Ok(done) => done,
            Err(e) => {
                self.fatal.get_or_insert(PipelineError::Task(e.to_string()));
                return;
            }
        };
        match result {
            Ok(Produced::Created(note)) => {
                self.created.created += 1;
                if let Some(message) = note.diagnostic() {
                    self.created.diagnostics.push(NoteDiagnostic {
                        path: file.relative,
                        url: note.url().to_string(),
                        message: message.to_string(),
                    });
                }
            }
            Ok(Produced::Existing(_)) => {}
            Ok(Produced::Rejected { .. }) => self.created.rejected += 1,
            Err(e) => {
                if self.fatal.is_none() {
                    warn!(path = %file.relative.display(), error = %e, "Stopping discovery");
                    cancel.cancel();
                }
                self.fatal.get_or_insert(e);
            }
        }
    }
}

async fn quiesce(pool: &EnrichmentPool, timeout: Duration, report: &mut BuildReport) {
    if let Quiescence::TimedOut { cancelled } = pool.wait_for_quiescence(timeout).await {
        report.quiescence_timeouts += 1;
        warn!(cancelled, "History lookups abandoned at quiescence timeout");
    }
}

fn check_cancelled(
    cancel: &CancellationToken,
    completed: usize,
    scheduled: usize,
) -> PipelineResult<()> {
    if cancel.is_cancelled() {
        info!(completed, scheduled, "Build cancelled");
        return Err(GraphError::Cancelled {
            completed,
            scheduled,
        }
        .into());
    }
    Ok(())
}
