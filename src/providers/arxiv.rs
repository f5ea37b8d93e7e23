//! arXiv preprint search.
//!
//! Queries the public [arXiv API](https://info.arxiv.org/help/api/) by author
//! (`au:"First Last"`) and maps the Atom feed entries to [`Paper`] records.
//! arXiv has no citation data, so `citation_count` is always not available.

use crate::error::SourceError;
use crate::http::Http;
use crate::models::{Field, Paper};
use crate::sources::{Provider, Query, Retrieval};
use crate::utils::{collapse_whitespace, truncate_for_log};
use async_trait::async_trait;
use itertools::Itertools;
use serde::Deserialize;
use tracing::{info, instrument, warn};
use url::Url;

const LABEL: &str = "arXiv";

pub struct Arxiv {
    http: Http,
    endpoint: Url,
}

impl Arxiv {
    pub fn new(http: Http, endpoint: Url) -> Self {
        Self { http, endpoint }
    }

    fn query_url(&self, query: &Query, limit: usize) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("search_query", &format!("au:{}", query.quoted()))
            .append_pair("start", "0")
            .append_pair("max_results", &limit.to_string());
        url
    }
}

#[async_trait]
impl Provider<Paper> for Arxiv {
    fn name(&self) -> &str {
        LABEL
    }

    #[instrument(level = "info", skip_all, fields(name = %query.name, limit))]
    async fn search(&self, query: &Query, limit: usize) -> Result<Retrieval<Paper>, SourceError> {
        let body = self.http.get_text(&self.query_url(query, limit)).await?;
        let papers = parse_feed(&body).inspect_err(|e| {
            warn!(error = %e, body_preview = %truncate_for_log(&body, 300), "arXiv feed did not parse");
        })?;
        info!(count = papers.len(), "Parsed arXiv feed");
        Ok(Retrieval::hits(papers))
    }
}

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(rename = "entry", default)]
    entries: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    id: String,
    title: String,
    #[serde(default)]
    published: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(rename = "author", default)]
    authors: Vec<Author>,
}

#[derive(Debug, Deserialize)]
struct Author {
    name: String,
}

/// Map an arXiv Atom feed to papers, in feed order.
pub fn parse_feed(xml: &str) -> Result<Vec<Paper>, SourceError> {
    let feed: Feed = quick_xml::de::from_str(xml)?;
    let papers = feed
        .entries
        .into_iter()
        // The API reports query errors as a single entry titled "Error".
        .filter(|e| !(e.title.trim() == "Error" && e.id.contains("api/errors")))
        .map(|entry| {
            let authors = entry
                .authors
                .iter()
                .map(|a| collapse_whitespace(&a.name))
                .filter(|n| !n.is_empty())
                .join(", ");
            let year = entry
                .published
                .as_deref()
                .and_then(|p| p.get(..4))
                .and_then(|y| y.parse::<i32>().ok());
            Paper {
                title: collapse_whitespace(&entry.title),
                url: entry.id.trim().to_string(),
                snippet: Field::text(entry.summary.as_deref().map(collapse_whitespace)),
                source_label: LABEL.to_string(),
                authors: Field::text(Some(authors)),
                year: year.into(),
                venue: Field::Value(LABEL.to_string()),
                citation_count: Field::NotAvailable,
            }
        })
        .collect();
    Ok(papers)
}
