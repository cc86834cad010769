//! Table and JSON output for command results

use crate::cli::OutputFormat;
use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use garden_pipeline::{
    BuildReport, ExternalLinkReport, GardenStats, LinkAnalysis, LinkStatus, NoteRef, RankedNote,
};
use serde::Serialize;

/// Print `value` as pretty JSON, or run `table` to build the text output
pub fn emit<T, F>(format: OutputFormat, value: &T, table: F) -> Result<()>
where
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Table => println!("{}", table(value)),
    }
    Ok(())
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn key_values(rows: Vec<(&str, String)>) -> Table {
    let mut table = new_table(vec!["Metric", "Value"]);
    for (key, value) in rows {
        table.add_row(vec![Cell::new(key), Cell::new(value)]);
    }
    table
}

fn ranked(note: &Option<RankedNote>) -> String {
    match note {
        Some(r) => format!("{} ({})", r.note.url, r.count),
        None => "-".to_string(),
    }
}

/// Build summary plus one row per diagnostic
pub fn build_report(report: &BuildReport) -> String {
    let summary = key_values(vec![
        ("Notes discovered", report.notes_discovered.to_string()),
        ("Notes created", report.notes_created.to_string()),
        ("Lost URL collisions", report.notes_rejected.to_string()),
        ("Stubs", report.resolution.stubs_created.len().to_string()),
        ("Tag pages", report.aggregates.tag_pages.to_string()),
        ("Citation pages", report.aggregates.citation_pages.to_string()),
        ("Backlinks", report.resolution.edges_added.to_string()),
        ("Total pages", report.total_notes.to_string()),
        ("Assets (not copied)", report.assets.len().to_string()),
        ("Skipped symlinks", report.symlinks.len().to_string()),
        (
            "History lookups",
            format!(
                "{} ok, {} failed, {} timed out, {} cancelled",
                report.enrichment.succeeded,
                report.enrichment.failed,
                report.enrichment.timed_out,
                report.enrichment.cancelled
            ),
        ),
        ("Elapsed", format!("{} ms", report.elapsed.as_millis())),
    ]);

    if report.diagnostics.is_empty() {
        return summary.to_string();
    }

    let mut problems = new_table(vec!["File", "URL", "Problem"]);
    for diagnostic in &report.diagnostics {
        problems.add_row(vec![
            Cell::new(diagnostic.path.display()),
            Cell::new(&diagnostic.url),
            Cell::new(&diagnostic.message).fg(Color::Yellow),
        ]);
    }
    format!("{summary}\n\nNotes with problems\n{problems}")
}

fn note_list(title: &str, notes: &[NoteRef]) -> String {
    let mut table = new_table(vec!["URL", "Title", "File"]);
    for note in notes {
        table.add_row(vec![
            Cell::new(&note.url),
            Cell::new(&note.title),
            Cell::new(
                note.path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
            ),
        ]);
    }
    format!("{title} ({})\n{table}", notes.len())
}

/// Orphans, broken links and the most linked notes
pub fn link_analysis(analysis: &LinkAnalysis) -> String {
    let mut broken = new_table(vec!["Missing page", "Linked from"]);
    for link in &analysis.broken {
        broken.add_row(vec![
            Cell::new(&link.target).fg(Color::Red),
            Cell::new(link.referrers.join(", ")),
        ]);
    }

    let mut linked = new_table(vec!["URL", "Title", "Backlinks"]);
    for entry in &analysis.most_linked {
        linked.add_row(vec![
            Cell::new(&entry.note.url),
            Cell::new(&entry.note.title),
            Cell::new(entry.count),
        ]);
    }

    [
        note_list("Orphaned notes", &analysis.orphans),
        note_list("Notes without links", &analysis.without_links),
        format!("Broken links ({})\n{broken}", analysis.broken.len()),
        format!("Most linked\n{linked}"),
    ]
    .join("\n\n")
}

/// Garden statistics
pub fn garden_stats(stats: &GardenStats) -> String {
    let summary = key_values(vec![
        ("Total pages", stats.total_notes.to_string()),
        ("Source notes", stats.source_notes.to_string()),
        ("Stubs", stats.stubs.to_string()),
        ("Tag pages", stats.tag_pages.to_string()),
        ("Citation pages", stats.citation_pages.to_string()),
        ("Notes with content", stats.notes_with_content.to_string()),
        ("Total words", stats.total_words.to_string()),
        ("Total links", stats.total_links.to_string()),
        ("Total backlinks", stats.total_backlinks.to_string()),
        ("Distinct tags", stats.total_tags.to_string()),
        ("Distinct citations", stats.total_citations.to_string()),
        ("Words per note", stats.avg_words_per_note.to_string()),
        ("Links per note", stats.avg_links_per_note.to_string()),
        ("Backlinks per note", stats.avg_backlinks_per_note.to_string()),
        ("Longest note", ranked(&stats.longest_note)),
        ("Shortest note", ranked(&stats.shortest_note)),
        ("Most connected", ranked(&stats.most_connected_note)),
        ("Most linked", ranked(&stats.most_linked_note)),
        ("Orphaned notes", stats.orphaned_notes.to_string()),
        ("Notes without links", stats.notes_without_links.to_string()),
    ]);

    let mut tags = new_table(vec!["Tag", "Notes"]);
    for (tag, count) in stats.tag_distribution.iter().take(10) {
        tags.add_row(vec![Cell::new(format!("#{tag}")), Cell::new(count)]);
    }
    format!("Garden Statistics\n{summary}\n\nTop tags\n{tags}")
}

const PROBLEM_ROWS: usize = 30;
const REFERRERS_SHOWN: usize = 3;

/// External link summary plus the links that did not answer 200
pub fn external_links(report: &ExternalLinkReport) -> String {
    let s = &report.summary;
    let summary = key_values(vec![
        ("Notes with content", s.total_notes.to_string()),
        ("External links", s.total_external_links.to_string()),
        ("Unique links", s.unique_external_links.to_string()),
        ("OK (200)", s.ok_links.to_string()),
        ("Warning (non-200)", s.warning_links.to_string()),
        ("Error", s.error_links.to_string()),
    ]);
    let mut text = format!("External Links\n{summary}");
    if report.cancelled {
        text.push_str("\n\nCheck cancelled before every link was tried");
    }

    let problems: Vec<_> = report.problems().collect();
    if problems.is_empty() {
        text.push_str("\n\nAll checked links are reachable");
        return text;
    }

    let mut table = new_table(vec!["URL", "Result", "Found in"]);
    for link in problems.iter().take(PROBLEM_ROWS) {
        let result = &link.result;
        let mut outcome = match (result.status_code, &result.error) {
            (Some(code), _) => code.to_string(),
            (None, Some(error)) => error.clone(),
            (None, None) => "-".to_string(),
        };
        if let Some(final_url) = result.final_url.as_ref().filter(|u| **u != link.url) {
            outcome.push_str(&format!(" -> {final_url}"));
        }
        let color = match result.status {
            LinkStatus::Error => Color::Red,
            _ => Color::Yellow,
        };

        let mut found_in: Vec<String> = link
            .found_in_notes
            .iter()
            .take(REFERRERS_SHOWN)
            .map(|note| note.url.clone())
            .collect();
        if link.found_in_notes.len() > REFERRERS_SHOWN {
            found_in.push(format!(
                "and {} more",
                link.found_in_notes.len() - REFERRERS_SHOWN
            ));
        }

        table.add_row(vec![
            Cell::new(&link.url),
            Cell::new(outcome).fg(color),
            Cell::new(found_in.join(", ")),
        ]);
    }
    text.push_str(&format!("\n\nProblem links ({})\n{table}", problems.len()));
    if problems.len() > PROBLEM_ROWS {
        text.push_str(&format!("\n... and {} more", problems.len() - PROBLEM_ROWS));
    }
    text
}

/// Results of the `all` command
#[derive(Debug, Serialize)]
pub struct AllReports {
    pub stats: GardenStats,
    pub links: LinkAnalysis,
    pub external: ExternalLinkReport,
}

/// Statistics, link analysis and external links, one after another
pub fn all_reports(reports: &AllReports) -> String {
    [
        garden_stats(&reports.stats),
        link_analysis(&reports.links),
        external_links(&reports.external),
    ]
    .join("\n\n")
}
