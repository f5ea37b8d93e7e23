//! Plain-text renderings of a report for the terminal.
//!
//! Both functions return the text instead of printing it so callers decide
//! where it goes.

use crate::models::Record;
use crate::report::{CategoryOutcome, NoticeKind, Report};
use crate::utils::{source_label, truncate_display};
use std::fmt::Write;

const RULE_WIDTH: usize = 80;

fn rule(c: char) -> String {
    c.to_string().repeat(RULE_WIDTH)
}

/// Counts per category and per source, followed by any notices.
pub fn render_summary(report: &Report) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", rule('='));
    let _ = writeln!(out, "SEARCH SUMMARY FOR: {}", report.query());
    let _ = writeln!(out, "{}", rule('='));

    summary_block(&mut out, "Academic Papers", report.summary().papers, report.papers());
    summary_block(&mut out, "News Articles", report.summary().news, report.news());
    summary_block(&mut out, "Web Results", report.summary().web, report.web());

    if !report.notices().is_empty() {
        let _ = writeln!(out, "\nNotices:");
        for notice in report.notices() {
            let kind = match notice.kind {
                NoticeKind::Degraded => "degraded",
                NoticeKind::Advisory => "advisory",
            };
            let _ = writeln!(
                out,
                "   [{kind}] {}/{}: {}",
                notice.category,
                source_label(&notice.source),
                notice.message
            );
        }
    }
    let _ = writeln!(out, "\n{}", rule('='));
    out
}

fn summary_block<T>(out: &mut String, heading: &str, total: usize, outcome: &CategoryOutcome<T>) {
    let _ = writeln!(out, "\n{heading}: {total}");
    if let Some(failure) = outcome.failure() {
        let _ = writeln!(out, "   category failed: {}", failure.error);
    }
    for (name, source) in outcome.result().into_iter().flat_map(|result| result.iter()) {
        if source.is_failure() {
            let _ = writeln!(out, "   • {}: failed", source_label(name));
        } else {
            let _ = writeln!(out, "   • {}: {}", source_label(name), source.count());
        }
    }
}

/// The first `max_display` items of every source, snippets truncated to the
/// record type's display width.
pub fn render_details(report: &Report, max_display: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", rule('='));
    let _ = writeln!(out, "DETAILED RESULTS FOR: {}", report.query());
    let _ = writeln!(out, "{}", rule('='));

    details_block(&mut out, "ACADEMIC PAPERS", "Abstract", report.papers(), max_display);
    details_block(&mut out, "NEWS ARTICLES", "Snippet", report.news(), max_display);
    details_block(&mut out, "WEB RESULTS", "Snippet", report.web(), max_display);

    let _ = writeln!(out, "\n{}", rule('='));
    out
}

fn details_block<T: Record>(
    out: &mut String,
    heading: &str,
    snippet_label: &str,
    outcome: &CategoryOutcome<T>,
    max_display: usize,
) {
    let result = match outcome {
        CategoryOutcome::Failed(failure) => {
            let _ = writeln!(out, "\n{heading}\n{}", rule('-'));
            let _ = writeln!(out, "category failed: {}", failure.error);
            return;
        }
        CategoryOutcome::Completed(result) if result.total() == 0 => return,
        CategoryOutcome::Completed(result) => result,
    };

    let _ = writeln!(out, "\n{heading}\n{}", rule('-'));
    for (name, source) in result.iter() {
        let items = source.items();
        if items.is_empty() {
            continue;
        }
        let _ = writeln!(out, "\n{}:", source_label(name).to_uppercase());
        for (i, item) in items.iter().take(max_display).enumerate() {
            let _ = writeln!(out, "\n{}. {}", i + 1, item.title());
            for (label, value) in item.details() {
                let _ = writeln!(out, "   {label}: {value}");
            }
            let _ = writeln!(out, "   URL: {}", item.url());
            let _ = writeln!(out, "   Via: {}", item.source_label());
            if let Some(snippet) = item.snippet().as_option() {
                let _ = writeln!(out, "   {snippet_label}: {}", truncate_display(snippet, T::SNIPPET_WIDTH));
            }
        }
    }
}
