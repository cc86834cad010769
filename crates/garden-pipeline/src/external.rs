//! External link checking
//!
//! Collects `http(s)` links from rendered note bodies and checks every unique
//! URL once: `HEAD` first, then `GET` when the server answers `HEAD` with an
//! error status. Requests run one at a time with a pause between them.

use crate::analysis::NoteRef;
use crate::error::PipelineResult;
use garden_core::NoteGraph;
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// User agent sent with every check
pub const USER_AGENT: &str = "Mozilla/5.0 (Digital Garden Link Checker)";

static HREF_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)href=["']?(https?://[^"'>\s]+)"#).expect("href regex")
});

// Markdown links that survived rendering, e.g. inside raw HTML blocks
static MARKDOWN_LINK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[[^\]]+\]\((https?://[^)]+)\)").expect("markdown link regex")
});

/// Unique external URLs in one rendered body
pub fn extract_external_links(content: &str) -> BTreeSet<String> {
    HREF_REGEX
        .captures_iter(content)
        .chain(MARKDOWN_LINK_REGEX.captures_iter(content))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// External links of a garden, grouped by URL
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalLinks {
    /// Notes with a non-empty body
    pub notes_scanned: usize,
    /// URL to the notes linking to it, in note URL order
    pub links: BTreeMap<String, Vec<NoteRef>>,
}

impl ExternalLinks {
    /// Sum over URLs of the notes linking to each
    pub fn total_links(&self) -> usize {
        self.links.values().map(Vec::len).sum()
    }
}

/// Gather external links from every note with content.
///
/// Stubs and other pages without a body are skipped.
pub fn collect_external_links(graph: &NoteGraph) -> ExternalLinks {
    let mut collected = ExternalLinks::default();
    for note in graph.notes() {
        let content = note.content();
        if content.is_empty() {
            continue;
        }
        collected.notes_scanned += 1;
        for url in extract_external_links(content) {
            collected
                .links
                .entry(url)
                .or_default()
                .push(NoteRef::of(&note));
        }
    }
    debug!(
        notes = collected.notes_scanned,
        unique = collected.links.len(),
        "Collected external links"
    );
    collected
}

/// Outcome class of one URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    /// Answered `200 OK`
    Ok,
    /// Answered with any other status
    Warning,
    /// No answer: timeout, refused connection, redirect loop
    Error,
}

/// Result of checking one URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlCheck {
    pub status: LinkStatus,
    pub status_code: Option<u16>,
    /// URL after redirects
    pub final_url: Option<String>,
    pub error: Option<String>,
}

impl UrlCheck {
    fn failed(error: impl Into<String>) -> Self {
        Self {
            status: LinkStatus::Error,
            status_code: None,
            final_url: None,
            error: Some(error.into()),
        }
    }
}

/// A checked URL and where it appears
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkCheck {
    pub url: String,
    #[serde(flatten)]
    pub result: UrlCheck,
    pub found_in_notes: Vec<NoteRef>,
}

/// Counts over a link check
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExternalLinkSummary {
    pub total_notes: usize,
    pub total_external_links: usize,
    pub unique_external_links: usize,
    pub ok_links: usize,
    pub warning_links: usize,
    pub error_links: usize,
}

/// Full result of [`ExternalLinkChecker::check`]
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExternalLinkReport {
    pub summary: ExternalLinkSummary,
    pub links_checked: Vec<LinkCheck>,
    /// Whether cancellation cut the run short
    pub cancelled: bool,
}

impl ExternalLinkReport {
    /// Links that did not answer `200 OK`
    pub fn problems(&self) -> impl Iterator<Item = &LinkCheck> {
        self.links_checked
            .iter()
            .filter(|link| link.result.status != LinkStatus::Ok)
    }

    fn record(&mut self, check: LinkCheck) {
        match check.result.status {
            LinkStatus::Ok => self.summary.ok_links += 1,
            LinkStatus::Warning => self.summary.warning_links += 1,
            LinkStatus::Error => self.summary.error_links += 1,
        }
        self.links_checked.push(check);
    }
}

/// Request timeout and spacing for a link check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckerOptions {
    /// Bound on each request
    pub timeout: Duration,
    /// Pause between consecutive URLs
    pub delay: Duration,
}

impl Default for CheckerOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            delay: Duration::from_millis(500),
        }
    }
}

/// Sequential HTTP checker for external links
#[derive(Debug, Clone)]
pub struct ExternalLinkChecker {
    client: Client,
    delay: Duration,
}

impl ExternalLinkChecker {
    /// Checker with its own HTTP client
    pub fn new(options: CheckerOptions) -> PipelineResult<Self> {
        let client = Client::builder()
            .timeout(options.timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            delay: options.delay,
        })
    }

    /// Check one URL, retrying with `GET` when `HEAD` gets an error status
    pub async fn check_url(&self, url: &str) -> UrlCheck {
        let response = match self.client.head(url).send().await {
            Ok(head) if head.status().as_u16() >= 400 => {
                debug!(url, status = %head.status(), "HEAD refused, retrying with GET");
                self.client.get(url).send().await
            }
            other => other,
        };

        match response {
            Ok(response) => {
                let status = response.status();
                UrlCheck {
                    status: if status == StatusCode::OK {
                        LinkStatus::Ok
                    } else {
                        LinkStatus::Warning
                    },
                    status_code: Some(status.as_u16()),
                    final_url: Some(response.url().to_string()),
                    error: None,
                }
            }
            Err(err) => UrlCheck::failed(describe(&err)),
        }
    }

    /// Check every collected URL in order.
    ///
    /// Cancellation stops before the next URL; links already checked stay
    /// in the report.
    pub async fn check(
        &self,
        links: ExternalLinks,
        cancel: &CancellationToken,
    ) -> ExternalLinkReport {
        let mut report = ExternalLinkReport {
            summary: ExternalLinkSummary {
                total_notes: links.notes_scanned,
                total_external_links: links.total_links(),
                unique_external_links: links.links.len(),
                ..ExternalLinkSummary::default()
            },
            ..ExternalLinkReport::default()
        };
        let total = links.links.len();
        info!(unique = total, "Checking external links");

        for (position, (url, found_in_notes)) in links.links.into_iter().enumerate() {
            if cancel.is_cancelled() {
                warn!(remaining = total - position, "Link check cancelled");
                report.cancelled = true;
                break;
            }

            info!(url = %url, "Checking link {}/{}", position + 1, total);
            let result = self.check_url(&url).await;
            if result.status != LinkStatus::Ok {
                debug!(url = %url, status = ?result.status, "Problem link");
            }
            report.record(LinkCheck {
                url,
                result,
                found_in_notes,
            });

            if !self.delay.is_zero() && position + 1 < total {
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = tokio::time::sleep(self.delay) => {}
                }
            }
        }
        report
    }
}

fn describe(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "Timeout".to_string()
    } else if err.is_connect() {
        "Connection Error".to_string()
    } else if err.is_redirect() {
        "Too Many Redirects".to_string()
    } else {
        err.to_string()
    }
}
