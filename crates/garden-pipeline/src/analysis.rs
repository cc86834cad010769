//! Link analysis and garden statistics over a built graph
//!
//! Both functions are read-only and work on any phase, but only give
//! meaningful backlink numbers once the graph is closed.

use garden_core::parser::word_count;
use garden_core::{AggregateKind, Note, NoteGraph, NoteOrigin};
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Identifies a note in reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteRef {
    /// Canonical URL
    pub url: String,
    /// Display title
    pub title: String,
    /// Source file, if any
    pub path: Option<PathBuf>,
}

impl NoteRef {
    pub(crate) fn of(note: &Note) -> Self {
        Self {
            url: note.url().to_string(),
            title: note.title(),
            path: note.path().map(|p| p.to_path_buf()),
        }
    }
}

/// A dangling link target and the notes pointing at it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrokenLink {
    /// URL no source file provides
    pub target: String,
    /// URLs of the notes linking to it
    pub referrers: Vec<String>,
}

/// A note with a count attached
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedNote {
    /// The note
    pub note: NoteRef,
    /// Backlinks, words or connections, depending on the ranking
    pub count: usize,
}

/// Link health of the garden
#[derive(Debug, Clone, Default, Serialize)]
pub struct LinkAnalysis {
    /// Source notes nothing links to (index pages excluded)
    pub orphans: Vec<NoteRef>,
    /// Source notes without outgoing links
    pub without_links: Vec<NoteRef>,
    /// Links to notes that do not exist
    pub broken: Vec<BrokenLink>,
    /// Source notes with the most backlinks
    pub most_linked: Vec<RankedNote>,
}

/// Analyze orphans, broken links and the most linked notes.
///
/// `top` bounds the length of `most_linked`.
pub fn analyze_links(graph: &NoteGraph, top: usize) -> LinkAnalysis {
    let mut analysis = LinkAnalysis::default();
    let mut ranked = Vec::new();

    for note in graph.notes() {
        match note.origin() {
            NoteOrigin::Source => {
                if note.backlink_count() == 0 && !is_index_page(&note, graph.index_name()) {
                    analysis.orphans.push(NoteRef::of(&note));
                }
                if note.links().is_empty() {
                    analysis.without_links.push(NoteRef::of(&note));
                }
                if note.backlink_count() > 0 {
                    ranked.push(RankedNote {
                        count: note.backlink_count(),
                        note: NoteRef::of(&note),
                    });
                }
            }
            NoteOrigin::Dangling => analysis.broken.push(BrokenLink {
                target: note.url().to_string(),
                referrers: note.backlinks(),
            }),
            NoteOrigin::Aggregate(_) => {}
        }
    }

    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.note.url.cmp(&b.note.url)));
    ranked.truncate(top);
    analysis.most_linked = ranked;
    analysis
}

fn is_index_page(note: &Note, index_name: &str) -> bool {
    note.path()
        .and_then(|p| p.file_stem())
        .and_then(|stem| stem.to_str())
        .is_some_and(|stem| stem.eq_ignore_ascii_case(index_name))
}

/// Counts and records describing the garden
#[derive(Debug, Clone, Default, Serialize)]
pub struct GardenStats {
    /// Registry entries of any kind
    pub total_notes: usize,
    /// Notes backed by a file
    pub source_notes: usize,
    /// Placeholders for dangling links
    pub stubs: usize,
    /// Synthesized tag pages
    pub tag_pages: usize,
    /// Synthesized citation pages
    pub citation_pages: usize,
    /// Source notes with rendered content
    pub notes_with_content: usize,
    /// Words across all notes with content
    pub total_words: usize,
    /// Outgoing links across notes with content
    pub total_links: usize,
    /// Backlinks across notes with content
    pub total_backlinks: usize,
    /// Distinct tag keys
    pub total_tags: usize,
    /// Distinct citation keys
    pub total_citations: usize,
    /// Mean words per note with content
    pub avg_words_per_note: f64,
    /// Mean outgoing links per note with content
    pub avg_links_per_note: f64,
    /// Mean backlinks per note with content
    pub avg_backlinks_per_note: f64,
    /// Note with the most words
    pub longest_note: Option<RankedNote>,
    /// Note with the fewest (but some) words
    pub shortest_note: Option<RankedNote>,
    /// Note with the most links plus backlinks
    pub most_connected_note: Option<RankedNote>,
    /// Note with the most backlinks
    pub most_linked_note: Option<RankedNote>,
    /// Notes with content but no backlinks
    pub orphaned_notes: usize,
    /// Notes with content but no outgoing links
    pub notes_without_links: usize,
    /// Tag key to number of tagged notes, most used first
    pub tag_distribution: Vec<(String, usize)>,
    /// Creation day (`YYYY-MM-DD`) to number of notes created
    pub notes_by_date: BTreeMap<String, usize>,
}

/// Compute [`GardenStats`] for `graph`
pub fn garden_stats(graph: &NoteGraph) -> GardenStats {
    let mut stats = GardenStats {
        total_notes: graph.len(),
        total_tags: graph.tags().len(),
        total_citations: graph.citations().len(),
        ..GardenStats::default()
    };

    let notes = graph.notes();
    let mut with_content: Vec<(&Arc<Note>, usize)> = Vec::new();
    for note in &notes {
        match note.origin() {
            NoteOrigin::Source => stats.source_notes += 1,
            NoteOrigin::Dangling => stats.stubs += 1,
            NoteOrigin::Aggregate(AggregateKind::Tag) => stats.tag_pages += 1,
            NoteOrigin::Aggregate(AggregateKind::Citation) => stats.citation_pages += 1,
        }
        if note.is_stub() || note.content().is_empty() {
            continue;
        }
        with_content.push((note, word_count(note.content())));
    }

    for (note, words) in &with_content {
        let links = note.links().len();
        let backlinks = note.backlink_count();
        stats.notes_with_content += 1;
        stats.total_words += words;
        stats.total_links += links;
        stats.total_backlinks += backlinks;
        if backlinks == 0 {
            stats.orphaned_notes += 1;
        }
        if links == 0 {
            stats.notes_without_links += 1;
        }
        if let Some(created) = note.history().and_then(|h| h.created) {
            *stats
                .notes_by_date
                .entry(created.format("%Y-%m-%d").to_string())
                .or_default() += 1;
        }
    }

    // Ties go to the smaller URL
    let best = |score: &dyn Fn(&Note, usize) -> usize| -> Option<RankedNote> {
        with_content
            .iter()
            .map(|(note, words)| (note, score(note, *words)))
            .filter(|(_, count)| *count > 0)
            .min_by_key(|(note, count)| (Reverse(*count), note.url().to_string()))
            .map(|(note, count)| RankedNote {
                note: NoteRef::of(note),
                count,
            })
    };
    stats.longest_note = best(&|_, words| words);
    stats.most_connected_note = best(&|note, _| note.links().len() + note.backlink_count());
    stats.most_linked_note = best(&|note, _| note.backlink_count());
    stats.shortest_note = with_content
        .iter()
        .filter(|(_, words)| *words > 0)
        .min_by_key(|(note, words)| (*words, note.url().to_string()))
        .map(|(note, words)| RankedNote {
            note: NoteRef::of(note),
            count: *words,
        });

    if stats.notes_with_content > 0 {
        let n = stats.notes_with_content as f64;
        stats.avg_words_per_note = round2(stats.total_words as f64 / n);
        stats.avg_links_per_note = round2(stats.total_links as f64 / n);
        stats.avg_backlinks_per_note = round2(stats.total_backlinks as f64 / n);
    }

    stats.tag_distribution = graph.tags().counts();
    stats
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
