//! git-backed edit history
//!
//! One `git log --format=%ci` subprocess per file, run from the file's
//! directory so nested repositories resolve naturally. The newest commit date
//! is the last modification, the oldest is the creation date and the number
//! of commits is the edit count.

use crate::error::{EnrichmentError, EnrichmentResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use garden_core::{EditHistory, HistoryProvider};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Committer date format produced by `%ci`
const GIT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// [`HistoryProvider`] that shells out to `git log`
#[derive(Debug, Clone)]
pub struct GitHistoryProvider {
    program: PathBuf,
}

impl GitHistoryProvider {
    /// Provider using the `git` found on `PATH`
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("git"),
        }
    }

    /// Provider using a specific git binary
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn log(&self, path: &Path) -> EnrichmentResult<String> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let file = path.file_name().map(Path::new).unwrap_or(path);

        let output = Command::new(&self.program)
            .arg("log")
            .arg("--format=%ci")
            .arg("--")
            .arg(file)
            .current_dir(dir)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| EnrichmentError::Spawn {
                command: "git",
                source,
            })?;

        if !output.status.success() {
            return Err(EnrichmentError::GitFailed {
                path: path.to_path_buf(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for GitHistoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoryProvider for GitHistoryProvider {
    async fn history(&self, path: &Path) -> anyhow::Result<EditHistory> {
        let stdout = self.log(path).await?;
        let history =
            parse_log(&stdout)?.ok_or_else(|| EnrichmentError::Untracked(path.to_path_buf()))?;
        debug!(
            path = %path.display(),
            edits = history.edit_count,
            "Collected git history"
        );
        Ok(history)
    }

    fn name(&self) -> &'static str {
        "git"
    }
}

/// Parse `git log --format=%ci` output (newest first).
///
/// `Ok(None)` when there are no commits.
pub fn parse_log(stdout: &str) -> EnrichmentResult<Option<EditHistory>> {
    let lines: Vec<&str> = stdout
        .lines()
        .map(|line| line.trim().trim_matches('"'))
        .filter(|line| !line.is_empty())
        .collect();
    let (Some(newest), Some(oldest)) = (lines.first(), lines.last()) else {
        return Ok(None);
    };

    let last_modified = parse_git_date(newest)?;
    let created = parse_git_date(oldest)?;
    let edit_count = u32::try_from(lines.len()).unwrap_or(u32::MAX);
    Ok(Some(EditHistory::new(
        Some(created),
        Some(last_modified),
        edit_count,
    )))
}

fn parse_git_date(text: &str) -> EnrichmentResult<DateTime<Utc>> {
    DateTime::parse_from_str(text, GIT_DATE_FORMAT)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| EnrichmentError::InvalidDate(text.to_string()))
}
