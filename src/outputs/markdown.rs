//! Markdown rendering of a report.
//!
//! Produces a single document with a summary table linking to each category,
//! then one section per source. Snippets are written in full;
//! only the console output truncates.

use crate::error::OutputError;
use crate::models::Record;
use crate::report::{CategoryOutcome, NoticeKind, Report, SourceOutcome};
use crate::utils::{slugify_title, source_label};
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

/// Render `report` as Markdown.
pub fn render(report: &Report) -> String {
    let mut md = String::new();
    let _ = writeln!(md, "# Search results: {}\n", report.query());
    let _ = writeln!(md, "_Captured {}_\n", report.timestamp().format("%Y-%m-%d %H:%M:%S %Z"));

    let sections = [
        ("Academic Papers", report.summary().papers),
        ("News Articles", report.summary().news),
        ("Web Results", report.summary().web),
    ];
    let _ = writeln!(md, "| Category | Results |");
    let _ = writeln!(md, "|----------|---------|");
    for (title, count) in sections {
        let _ = writeln!(md, "| [{title}](#{}) | {count} |", slugify_title(title));
    }

    if !report.notices().is_empty() {
        let _ = writeln!(md, "\n## Notices\n");
        for notice in report.notices() {
            let marker = match notice.kind {
                NoticeKind::Degraded => "Degraded",
                NoticeKind::Advisory => "Note",
            };
            let _ = writeln!(
                md,
                "- **{marker}** ({} / {}): {}",
                notice.category,
                source_label(&notice.source),
                escape(&notice.message)
            );
        }
    }

    section(&mut md, sections[0].0, report.papers());
    section(&mut md, sections[1].0, report.news());
    section(&mut md, sections[2].0, report.web());
    md
}

fn section<T: Record>(md: &mut String, title: &str, outcome: &CategoryOutcome<T>) {
    let _ = writeln!(md, "\n## {title}\n");
    let result = match outcome {
        CategoryOutcome::Failed(failure) => {
            let _ = writeln!(md, "> Category failed: {}", escape(&failure.error));
            return;
        }
        CategoryOutcome::Completed(result) => result,
    };
    if result.is_empty() {
        let _ = writeln!(md, "_Not searched._");
        return;
    }

    for (name, source) in result.iter() {
        let _ = writeln!(md, "### {}\n", source_label(name));
        if let SourceOutcome::Failure(failure) = source {
            let _ = writeln!(md, "> Failed: {}\n", escape(&failure.error));
            continue;
        }
        let items = source.items();
        if items.is_empty() {
            let _ = writeln!(md, "_No results._\n");
            continue;
        }
        for (i, item) in items.iter().enumerate() {
            let _ = writeln!(md, "{}. [{}]({})", i + 1, escape(item.title()), item.url());
            for (label, value) in item.details() {
                let _ = writeln!(md, "   - {label}: {}", escape(&value));
            }
            if let Some(snippet) = item.snippet().as_option() {
                let _ = writeln!(md, "   - {}", escape(snippet));
            }
        }
        md.push('\n');
    }
}

/// Neutralize characters that would break list items and link text.
fn escape(s: &str) -> String {
    s.replace('\n', " ")
        .replace('[', "\\[")
        .replace(']', "\\]")
}

/// Write the Markdown rendering to `path`.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_markdown(report: &Report, path: &Path) -> Result<PathBuf, OutputError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.map_err(|source| OutputError::Io {
            path: parent.display().to_string(),
            source,
        })?;
    }
    fs::write(path, render(report)).await.map_err(|source| OutputError::Io {
        path: path.display().to_string(),
        source,
    })?;
    info!("Wrote Markdown report");
    Ok(path.to_path_buf())
}
