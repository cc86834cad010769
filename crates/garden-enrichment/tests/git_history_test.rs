//! git provider against a real repository
//!
//! Skipped when no `git` binary is available.

use garden_core::HistoryProvider;
use garden_enrichment::GitHistoryProvider;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn git(dir: &Path, args: &[&str]) -> bool {
    Command::new("git")
        .args([
            "-c",
            "user.name=Gardener",
            "-c",
            "user.email=gardener@example.org",
            "-c",
            "commit.gpgsign=false",
        ])
        .args(args)
        .current_dir(dir)
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

#[tokio::test]
async fn test_history_from_commits() {
    let dir = TempDir::new().unwrap();
    if !git(dir.path(), &["init", "-q"]) {
        eprintln!("git unavailable, skipping");
        return;
    }

    let note = dir.path().join("note.md");
    std::fs::write(&note, "first").unwrap();
    assert!(git(dir.path(), &["add", "note.md"]));
    assert!(git(
        dir.path(),
        &["commit", "-q", "-m", "one", "--date", "2021-03-14T09:00:00+00:00"]
    ));
    std::fs::write(&note, "second").unwrap();
    assert!(git(dir.path(), &["commit", "-q", "-am", "two"]));

    std::fs::write(dir.path().join("untracked.md"), "new").unwrap();

    let provider = GitHistoryProvider::new();
    let history = provider.history(&note).await.unwrap();
    assert_eq!(history.edit_count, 2);
    assert!(history.created.is_some());
    assert!(history.created <= history.last_modified);

    assert!(provider
        .history(&dir.path().join("untracked.md"))
        .await
        .is_err());
}

#[tokio::test]
async fn test_outside_repository_is_error() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("loose.md");
    std::fs::write(&file, "x").unwrap();

    let provider = GitHistoryProvider::with_program("git-binary-that-does-not-exist");
    assert!(provider.history(&file).await.is_err());
}
