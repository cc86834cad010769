//! Bounded enrichment pool with a quiescence barrier
//!
//! Every note gets exactly one history lookup. Lookups run as tracked tokio
//! tasks limited by a semaphore; [`EnrichmentPool::wait_for_quiescence`]
//! joins the tracker instead of polling. A lookup that fails, exceeds the
//! per-call timeout, or is cancelled by a timed-out quiescence wait records
//! [`EditHistory::unknown`], so after any completed wait every scheduled note
//! has a history.

use garden_config::EnrichmentConfig;
use garden_core::{EditHistory, HistoryProvider, Note};
use parking_lot::Mutex;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

/// How a quiescence wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quiescence {
    /// Every outstanding task finished on its own
    Drained,
    /// The wait timed out and this many tasks were cancelled
    TimedOut {
        /// Tasks still outstanding when the timeout fired
        cancelled: usize,
    },
}

/// Counters for everything the pool has done
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EnrichmentStats {
    /// Lookups handed to the provider
    pub scheduled: usize,
    /// Lookups that returned a history
    pub succeeded: usize,
    /// Lookups the provider rejected
    pub failed: usize,
    /// Lookups that hit the per-call timeout
    pub timed_out: usize,
    /// Lookups cancelled by a quiescence timeout
    pub cancelled: usize,
    /// Notes given the default without a lookup (no path, or shut down)
    pub skipped: usize,
}

#[derive(Debug, Default)]
struct Counters {
    scheduled: AtomicUsize,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
    timed_out: AtomicUsize,
    cancelled: AtomicUsize,
    skipped: AtomicUsize,
}

/// Pool of asynchronous history lookups
pub struct EnrichmentPool {
    provider: Arc<dyn HistoryProvider>,
    permits: Arc<Semaphore>,
    tracker: TaskTracker,
    /// Cancels the lookups of the current wait round
    round: Mutex<CancellationToken>,
    /// Stops new lookups from being scheduled
    shutdown: CancellationToken,
    call_timeout: Duration,
    counters: Arc<Counters>,
}

impl EnrichmentPool {
    /// Pool running at most `max_concurrent` lookups at once
    pub fn new(
        provider: Arc<dyn HistoryProvider>,
        max_concurrent: usize,
        call_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            tracker: TaskTracker::new(),
            round: Mutex::new(CancellationToken::new()),
            shutdown: CancellationToken::new(),
            call_timeout,
            counters: Arc::new(Counters::default()),
        }
    }

    /// Pool configured from the `[enrichment]` section
    pub fn from_config(provider: Arc<dyn HistoryProvider>, config: &EnrichmentConfig) -> Self {
        Self::new(provider, config.max_concurrent, config.call_timeout())
    }

    /// Stop scheduling lookups once `token` is cancelled
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// Name of the underlying provider
    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Number of lookups not yet finished
    pub fn outstanding(&self) -> usize {
        self.tracker.len()
    }

    /// Schedule the history lookup for `note`.
    ///
    /// `path` is the absolute file location; notes without one (stubs,
    /// aggregates) and notes scheduled after shutdown get the default
    /// immediately. A shutdown also ends lookups already running, with the
    /// default recorded. Returns whether a lookup task was spawned.
    pub fn schedule(&self, note: Arc<Note>, path: Option<PathBuf>) -> bool {
        if note.history().is_some() {
            return false;
        }
        let Some(path) = path.filter(|_| !self.shutdown.is_cancelled()) else {
            note.set_history(EditHistory::unknown());
            self.counters.skipped.fetch_add(1, Ordering::Relaxed);
            return false;
        };

        self.counters.scheduled.fetch_add(1, Ordering::Relaxed);
        let provider = Arc::clone(&self.provider);
        let permits = Arc::clone(&self.permits);
        let counters = Arc::clone(&self.counters);
        let round = self.round.lock().clone();
        let shutdown = self.shutdown.clone();
        let call_timeout = self.call_timeout;

        self.tracker.spawn(async move {
            let lookup = async {
                let _permit = permits.acquire_owned().await.ok();
                tokio::time::timeout(call_timeout, provider.history(&path)).await
            };
            let stopped = async {
                tokio::select! {
                    _ = round.cancelled() => {}
                    _ = shutdown.cancelled() => {}
                }
            };

            let history = tokio::select! {
                biased;
                _ = stopped => {
                    counters.cancelled.fetch_add(1, Ordering::Relaxed);
                    debug!(url = %note.url(), "History lookup cancelled");
                    EditHistory::unknown()
                }
                result = lookup => match result {
                    Ok(Ok(history)) => {
                        counters.succeeded.fetch_add(1, Ordering::Relaxed);
                        history
                    }
                    Ok(Err(e)) => {
                        counters.failed.fetch_add(1, Ordering::Relaxed);
                        debug!(path = %path.display(), error = %e, "No history, using default");
                        EditHistory::unknown()
                    }
                    Err(_) => {
                        counters.timed_out.fetch_add(1, Ordering::Relaxed);
                        warn!(
                            path = %path.display(),
                            timeout_ms = call_timeout.as_millis() as u64,
                            "History lookup timed out, using default"
                        );
                        EditHistory::unknown()
                    }
                },
            };
            note.set_history(history);
        });
        true
    }

    /// Block until no lookup is outstanding, or `timeout` elapses.
    ///
    /// On timeout the outstanding lookups are cancelled (recording the
    /// default) and awaited, so the wait always completes with every
    /// scheduled note enriched. The pool accepts new work afterwards.
    pub async fn wait_for_quiescence(&self, timeout: Duration) -> Quiescence {
        self.tracker.close();
        let outcome = match tokio::time::timeout(timeout, self.tracker.wait()).await {
            Ok(()) => Quiescence::Drained,
            Err(_) => {
                let cancelled = self.tracker.len();
                warn!(
                    outstanding = cancelled,
                    timeout_ms = timeout.as_millis() as u64,
                    "Quiescence wait timed out, cancelling history lookups"
                );
                let round = std::mem::replace(&mut *self.round.lock(), CancellationToken::new());
                round.cancel();
                self.tracker.wait().await;
                Quiescence::TimedOut { cancelled }
            }
        };
        self.tracker.reopen();
        debug!(?outcome, "Enrichment quiescent");
        outcome
    }

    /// Snapshot of the pool counters
    pub fn stats(&self) -> EnrichmentStats {
        let c = &self.counters;
        EnrichmentStats {
            scheduled: c.scheduled.load(Ordering::Relaxed),
            succeeded: c.succeeded.load(Ordering::Relaxed),
            failed: c.failed.load(Ordering::Relaxed),
            timed_out: c.timed_out.load(Ordering::Relaxed),
            cancelled: c.cancelled.load(Ordering::Relaxed),
            skipped: c.skipped.load(Ordering::Relaxed),
        }
    }

    /// Log the counters at info level
    pub fn log_summary(&self) {
        let stats = self.stats();
        info!(
            provider = self.provider.name(),
            scheduled = stats.scheduled,
            succeeded = stats.succeeded,
            failed = stats.failed,
            timed_out = stats.timed_out,
            cancelled = stats.cancelled,
            "Enrichment finished"
        );
    }
}

impl std::fmt::Debug for EnrichmentPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnrichmentPool")
            .field("provider", &self.provider.name())
            .field("available_permits", &self.permits.available_permits())
            .field("outstanding", &self.tracker.len())
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use garden_core::test_support::MockHistoryProvider;

    fn note(name: &str) -> Arc<Note> {
        Arc::new(Note::source(format!("/{name}/"), format!("{name}.md")))
    }

    #[tokio::test]
    async fn test_pathless_note_gets_default() {
        let pool = EnrichmentPool::new(
            Arc::new(MockHistoryProvider::new()),
            2,
            Duration::from_secs(1),
        );
        let stub = Arc::new(Note::dangling("/ghost/"));
        assert!(!pool.schedule(Arc::clone(&stub), None));
        assert_eq!(stub.history(), Some(&EditHistory::unknown()));
        assert_eq!(pool.stats().skipped, 1);
    }

    #[tokio::test]
    async fn test_failure_records_default() {
        let provider = Arc::new(MockHistoryProvider::new().failing_on("bad.md"));
        let pool = EnrichmentPool::new(provider, 2, Duration::from_secs(1));
        let good = note("good");
        let bad = note("bad");
        pool.schedule(Arc::clone(&good), Some(PathBuf::from("/c/good.md")));
        pool.schedule(Arc::clone(&bad), Some(PathBuf::from("/c/bad.md")));

        assert_eq!(
            pool.wait_for_quiescence(Duration::from_secs(5)).await,
            Quiescence::Drained
        );
        assert_eq!(good.history().map(|h| h.edit_count), Some(3));
        assert!(bad.history().is_some_and(EditHistory::is_unknown));
        assert_eq!(pool.stats().failed, 1);
    }

    #[tokio::test]
    async fn test_call_timeout_records_default() {
        let provider = Arc::new(MockHistoryProvider::new().hanging_on("slow.md"));
        let pool = EnrichmentPool::new(provider, 2, Duration::from_millis(50));
        let slow = note("slow");
        pool.schedule(Arc::clone(&slow), Some(PathBuf::from("slow.md")));

        assert_eq!(
            pool.wait_for_quiescence(Duration::from_secs(5)).await,
            Quiescence::Drained
        );
        assert!(slow.history().is_some_and(EditHistory::is_unknown));
        assert_eq!(pool.stats().timed_out, 1);
    }

    #[tokio::test]
    async fn test_shutdown_stops_scheduling() {
        let token = CancellationToken::new();
        let provider = Arc::new(MockHistoryProvider::new());
        let pool = EnrichmentPool::new(provider.clone(), 2, Duration::from_secs(1))
            .with_shutdown(token.clone());
        token.cancel();

        let n = note("late");
        assert!(!pool.schedule(Arc::clone(&n), Some(PathBuf::from("late.md"))));
        assert!(n.history().is_some_and(EditHistory::is_unknown));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_ends_running_lookups() {
        let token = CancellationToken::new();
        let provider = Arc::new(MockHistoryProvider::new().hanging_on("stuck.md"));
        let pool = EnrichmentPool::new(provider, 2, Duration::from_secs(60))
            .with_shutdown(token.clone());

        let n = note("stuck");
        assert!(pool.schedule(Arc::clone(&n), Some(PathBuf::from("stuck.md"))));
        token.cancel();

        assert_eq!(
            pool.wait_for_quiescence(Duration::from_secs(5)).await,
            Quiescence::Drained
        );
        assert!(n.history().is_some_and(EditHistory::is_unknown));
        assert_eq!(pool.stats().cancelled, 1);
    }

    #[tokio::test]
    async fn test_already_enriched_note_is_not_rescheduled() {
        let provider = Arc::new(MockHistoryProvider::new());
        let pool = EnrichmentPool::new(provider.clone(), 2, Duration::from_secs(1));
        let n = note("once");
        assert!(pool.schedule(Arc::clone(&n), Some(PathBuf::from("once.md"))));
        pool.wait_for_quiescence(Duration::from_secs(5)).await;
        assert!(!pool.schedule(Arc::clone(&n), Some(PathBuf::from("once.md"))));
        pool.wait_for_quiescence(Duration::from_secs(5)).await;
        assert_eq!(provider.calls(), 1);
    }
}
