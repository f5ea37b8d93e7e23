//! JSON persistence of a search report.
//!
//! The report is written as pretty-printed JSON. Unless an explicit file name
//! is given, the name is derived from the query and the report timestamp:
//!
//! ```text
//! output_dir/
//! └── search_results_jane_doe_20261019_142501.json
//! ```
//!
//! The file carries the query, the timestamp (RFC 3339), the three category
//! maps, the summary counts and any notices.

use crate::error::OutputError;
use crate::report::Report;
use crate::utils::sanitize_query;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Default file name: `search_results_{sanitized query}_{YYYYMMDD_HHMMSS}.json`.
pub fn default_file_name(report: &Report) -> String {
    format!(
        "search_results_{}_{}.json",
        sanitize_query(report.query()),
        report.timestamp().format("%Y%m%d_%H%M%S")
    )
}

/// Write `report` into `output_dir` and return the path written.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display()))]
pub async fn write_report(
    report: &Report,
    output_dir: &Path,
    file_name: Option<&str>,
) -> Result<PathBuf, OutputError> {
    let json = serde_json::to_string_pretty(report)?;

    if let Err(e) = fs::create_dir_all(output_dir).await {
        error!(error = %e, "Failed to create output dir");
        return Err(OutputError::Io {
            path: output_dir.display().to_string(),
            source: e,
        });
    }

    let path = output_dir.join(file_name.map_or_else(|| default_file_name(report), String::from));
    info!(path = %path.display(), "Writing JSON");
    fs::write(&path, json).await.map_err(|source| OutputError::Io {
        path: path.display().to_string(),
        source,
    })?;
    info!(path = %path.display(), "Wrote search results");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Field, Paper};
    use crate::report::{CategoryOutcome, CategoryResult, ReportBuilder, SourceOutcome};
    use chrono::{Local, TimeZone};

    fn report() -> Report {
        let ts = Local.with_ymd_and_hms(2026, 10, 19, 14, 25, 1).unwrap();
        let mut papers = CategoryResult::new();
        papers.insert(
            "arxiv",
            SourceOutcome::Results(vec![Paper {
                title: "Sparse Attention".to_string(),
                url: "http://arxiv.org/abs/2401.00001v2".to_string(),
                snippet: Field::NotAvailable,
                source_label: "arXiv".to_string(),
                authors: Field::Value("Jane Doe".to_string()),
                year: Field::Value(2024),
                venue: Field::Value("arXiv".to_string()),
                citation_count: Field::NotAvailable,
            }]),
        );
        let mut builder = ReportBuilder::at("Jane Doe", ts);
        builder.papers(CategoryOutcome::Completed(papers));
        builder.finish()
    }

    #[test]
    fn test_default_file_name() {
        assert_eq!(default_file_name(&report()), "search_results_jane_doe_20261019_142501.json");
    }

    #[tokio::test]
    async fn test_write_report_round_trips_as_json() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_report(&report(), tmp.path(), None).await.unwrap();
        assert_eq!(path.file_name().unwrap(), "search_results_jane_doe_20261019_142501.json");

        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["query"], "Jane Doe");
        assert_eq!(value["summary"]["papers"], 1);
        assert_eq!(value["papers"]["arxiv"][0]["citation_count"], "N/A");
        assert_eq!(value["papers"]["arxiv"][0]["year"], 2024);
        assert!(value["news"].as_object().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_explicit_file_name_and_nested_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("out/nested");
        let path = write_report(&report(), &dir, Some("custom.json")).await.unwrap();
        assert_eq!(path, dir.join("custom.json"));
        assert!(path.is_file());
    }

    #[tokio::test]
    async fn test_unwritable_target_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let err = write_report(&report(), &blocker, None).await.unwrap_err();
        assert!(matches!(err, OutputError::Io { .. }));
    }
}
