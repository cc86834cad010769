//! Manifest render dispatcher
//!
//! Writes the closed graph as `graph.json`: one record per registry entry,
//! in URL order, carrying the rendered body and frontmatter. Wikilinks whose
//! target ended up as a dangling stub get the extra `wikilink-missing` class.
//! HTML templating is left to downstream tools that read the manifest.

use anyhow::{Context, Result};
use async_trait::async_trait;
use garden_core::{NoteGraph, NoteSnapshot, RenderDispatcher, RenderSummary};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Manifest file name inside the output directory
pub const MANIFEST_FILE: &str = "graph.json";

const WIKILINK_ANCHOR: &str = r#"<a class="wikilink" href=""#;
const MISSING_ANCHOR: &str = r#"<a class="wikilink wikilink-missing" href=""#;

#[derive(Debug, Serialize)]
struct Manifest<'a> {
    base_url: &'a str,
    notes: Vec<NoteSnapshot>,
}

/// Renders the graph into a JSON manifest
#[derive(Debug, Clone)]
pub struct ManifestRenderer {
    output: PathBuf,
    base_url: String,
}

impl ManifestRenderer {
    /// Renderer writing into `output`
    pub fn new(output: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            base_url: base_url.into(),
        }
    }

    /// Path of the manifest this renderer writes
    pub fn manifest_path(&self) -> PathBuf {
        self.output.join(MANIFEST_FILE)
    }

    /// Output directory
    pub fn output(&self) -> &Path {
        &self.output
    }
}

#[async_trait]
impl RenderDispatcher for ManifestRenderer {
    async fn render(&self, graph: &NoteGraph) -> Result<RenderSummary> {
        let notes: Vec<NoteSnapshot> = graph
            .closed_notes()?
            .iter()
            .map(|note| {
                let mut snapshot = note.snapshot();
                snapshot.content = mark_missing_links(&snapshot.content, graph);
                snapshot
            })
            .collect();
        let rendered = notes.len();

        let manifest = Manifest {
            base_url: &self.base_url,
            notes,
        };
        let json = serde_json::to_vec_pretty(&manifest).context("Failed to serialize manifest")?;

        tokio::fs::create_dir_all(&self.output)
            .await
            .with_context(|| format!("Failed to create {}", self.output.display()))?;
        let path = self.manifest_path();
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        info!(path = %path.display(), notes = rendered, "Wrote manifest");
        Ok(RenderSummary {
            rendered,
            outputs: vec![path],
        })
    }
}

/// Add `wikilink-missing` to anchors pointing at dangling stubs
pub fn mark_missing_links(content: &str, graph: &NoteGraph) -> String {
    let mut marked = String::with_capacity(content.len());
    let mut rest = content;
    while let Some(pos) = rest.find(WIKILINK_ANCHOR) {
        marked.push_str(&rest[..pos]);
        rest = &rest[pos + WIKILINK_ANCHOR.len()..];
        let href = rest.find('"').map_or(rest, |end| &rest[..end]);
        let dangling = graph
            .get(&unescape_attr(href))
            .is_some_and(|note| note.is_dangling());
        marked.push_str(if dangling { MISSING_ANCHOR } else { WIKILINK_ANCHOR });
    }
    marked.push_str(rest);
    marked
}

fn unescape_attr(value: &str) -> String {
    value
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
