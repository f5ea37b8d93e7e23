//! Normalized search records.
//!
//! Every provider, whatever its transport, maps its native response into one of
//! three fixed record types:
//! - [`Paper`]: academic publications (scholarly index, preprint feed)
//! - [`NewsItem`]: news and institutional press coverage
//! - [`WebResult`]: general, news-flavoured, academic-flavoured and social web hits
//!
//! Fields a source cannot supply are [`Field::NotAvailable`], which serializes as
//! the `"N/A"` sentinel. Every record of a category therefore carries the same
//! field set, and renderers never branch on missing keys.

use serde::{Serialize, Serializer};
use std::fmt;

/// Sentinel written in place of unavailable values.
pub const NOT_AVAILABLE: &str = "N/A";

/// A record field that is either known or explicitly not available.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Field<T> {
    Value(T),
    #[default]
    NotAvailable,
}

impl<T> Field<T> {
    pub fn as_option(&self) -> Option<&T> {
        match self {
            Field::Value(v) => Some(v),
            Field::NotAvailable => None,
        }
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Field::Value(v),
            None => Field::NotAvailable,
        }
    }
}

impl Field<String> {
    /// Blank or whitespace-only text counts as not available.
    pub fn text(value: Option<impl Into<String>>) -> Self {
        match value.map(Into::into) {
            Some(s) if !s.trim().is_empty() => Field::Value(s.trim().to_string()),
            _ => Field::NotAvailable,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Value(v) => v.fmt(f),
            Field::NotAvailable => f.write_str(NOT_AVAILABLE),
        }
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Field::Value(v) => v.serialize(serializer),
            Field::NotAvailable => serializer.serialize_str(NOT_AVAILABLE),
        }
    }
}

/// Shared view over the three record types, used by the renderers.
pub trait Record {
    /// Width that snippets are truncated to in detailed console output.
    const SNIPPET_WIDTH: usize;

    fn title(&self) -> &str;
    fn url(&self) -> &str;
    fn snippet(&self) -> &Field<String>;
    fn source_label(&self) -> &str;

    /// Category-specific `(label, value)` lines for detailed rendering.
    fn details(&self) -> Vec<(&'static str, String)>;
}

/// An academic publication.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paper {
    pub title: String,
    pub url: String,
    /// Abstract, when the source exposes one.
    pub snippet: Field<String>,
    pub source_label: String,
    /// Comma-separated author list as published by the source.
    pub authors: Field<String>,
    pub year: Field<i32>,
    pub venue: Field<String>,
    pub citation_count: Field<u64>,
}

impl Record for Paper {
    const SNIPPET_WIDTH: usize = 200;

    fn title(&self) -> &str {
        &self.title
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn snippet(&self) -> &Field<String> {
        &self.snippet
    }

    fn source_label(&self) -> &str {
        &self.source_label
    }

    fn details(&self) -> Vec<(&'static str, String)> {
        let mut lines = vec![
            ("Authors", self.authors.to_string()),
            ("Year", self.year.to_string()),
            ("Venue", self.venue.to_string()),
        ];
        // Preprint feeds have no citation data; omit the line instead of printing N/A.
        if let Field::Value(count) = self.citation_count {
            lines.push(("Citations", count.to_string()));
        }
        lines
    }
}

/// A news article or institutional press mention.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsItem {
    pub title: String,
    pub url: String,
    pub snippet: Field<String>,
    pub source_label: String,
    pub published_date: Field<String>,
    pub publisher_name: Field<String>,
    pub thumbnail: Field<String>,
}

impl Record for NewsItem {
    const SNIPPET_WIDTH: usize = 150;

    fn title(&self) -> &str {
        &self.title
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn snippet(&self) -> &Field<String> {
        &self.snippet
    }

    fn source_label(&self) -> &str {
        &self.source_label
    }

    fn details(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Source", self.publisher_name.to_string()),
            ("Date", self.published_date.to_string()),
        ]
    }
}

/// A general web search hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebResult {
    pub title: String,
    pub url: String,
    pub snippet: Field<String>,
    pub source_label: String,
    pub relevance_score: Field<f64>,
}

impl Record for WebResult {
    const SNIPPET_WIDTH: usize = 150;

    fn title(&self) -> &str {
        &self.title
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn snippet(&self) -> &Field<String> {
        &self.snippet
    }

    fn source_label(&self) -> &str {
        &self.source_label
    }

    fn details(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn arxiv_paper() -> Paper {
        Paper {
            title: "Sparse Attention at Scale".to_string(),
            url: "http://arxiv.org/abs/2401.00001v1".to_string(),
            snippet: Field::Value("We study sparse attention.".to_string()),
            source_label: "arXiv".to_string(),
            authors: Field::Value("Jane Doe, John Roe".to_string()),
            year: Field::Value(2024),
            venue: Field::Value("arXiv".to_string()),
            citation_count: Field::NotAvailable,
        }
    }

    #[test]
    fn test_not_available_serializes_as_sentinel() {
        let value = serde_json::to_value(arxiv_paper()).unwrap();
        assert_eq!(value["citation_count"], json!("N/A"));
        assert_eq!(value["year"], json!(2024));
        assert_eq!(value["authors"], json!("Jane Doe, John Roe"));
    }

    #[test]
    fn test_every_field_is_present_when_unavailable() {
        let item = NewsItem {
            title: "Profile".to_string(),
            url: "https://news.example.edu/profile".to_string(),
            snippet: Field::NotAvailable,
            source_label: "Google News (Basic)".to_string(),
            published_date: Field::NotAvailable,
            publisher_name: Field::NotAvailable,
            thumbnail: Field::NotAvailable,
        };
        let value = serde_json::to_value(item).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        for key in [
            "title",
            "url",
            "snippet",
            "source_label",
            "published_date",
            "publisher_name",
            "thumbnail",
        ] {
            assert!(keys.contains(&key), "missing {key}");
        }
        assert_eq!(value["publisher_name"], json!("N/A"));
    }

    #[test]
    fn test_field_text_treats_blank_as_missing() {
        assert_eq!(Field::text(Some("   ")), Field::NotAvailable);
        assert_eq!(Field::text(None::<String>), Field::NotAvailable);
        assert_eq!(Field::text(Some(" Nature ")), Field::Value("Nature".to_string()));
    }

    #[test]
    fn test_paper_details_skip_missing_citations() {
        let labels: Vec<&str> = arxiv_paper().details().into_iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec!["Authors", "Year", "Venue"]);

        let mut cited = arxiv_paper();
        cited.citation_count = Field::Value(12);
        let details = cited.details();
        assert_eq!(details.last().unwrap(), &("Citations", "12".to_string()));
    }

    #[test]
    fn test_field_display() {
        assert_eq!(Field::<u64>::NotAvailable.to_string(), "N/A");
        assert_eq!(Field::Value(0.85).to_string(), "0.85");
    }
}
