//! University news site scan.
//!
//! Each configured institution has a site-search URL prefix; the person's name
//! is appended (`+` between words) and the result page is scanned for article
//! links that mention the name. The markup differs per site, so only a generic
//! heuristic is applied: among the first [`SCANNED_ANCHORS`] links, keep those
//! whose text is longer than [`MIN_TITLE_CHARS`] characters and contains the
//! name, case-insensitively.
//!
//! With an affiliation hint only that institution is scanned. Without one, all
//! sites are fetched with bounded concurrency; results keep configuration
//! order. A failing site is reported as an advisory unless every site failed.

use super::element_text;
use crate::error::SourceError;
use crate::http::Http;
use crate::models::{Field, NewsItem};
use crate::sources::{Provider, Query, Retrieval};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use indexmap::IndexMap;
use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

pub const LABEL: &str = "University News";
pub const SCANNED_ANCHORS: usize = 20;
pub const MIN_TITLE_CHARS: usize = 20;
const SNIPPET_CHARS: usize = 200;

static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("valid selector"));

pub struct Institutions {
    http: Http,
    sites: IndexMap<String, String>,
    concurrency: usize,
}

impl Institutions {
    pub fn new(http: Http, sites: IndexMap<String, String>, concurrency: usize) -> Self {
        Self {
            http,
            sites,
            concurrency: concurrency.max(1),
        }
    }

    /// Sites to scan for this query, or `None` when the hint names an unknown
    /// institution.
    fn targets(&self, affiliation: Option<&str>) -> Option<Vec<(&str, &str)>> {
        match affiliation.map(|a| a.trim().to_lowercase()) {
            Some(hint) if !hint.is_empty() => self
                .sites
                .get_key_value(hint.as_str())
                .map(|(name, url)| vec![(name.as_str(), url.as_str())]),
            _ => Some(
                self.sites
                    .iter()
                    .map(|(name, url)| (name.as_str(), url.as_str()))
                    .collect(),
            ),
        }
    }

    async fn scan_site(&self, site: &str, prefix: &str, query: &Query, limit: usize) -> Result<Vec<NewsItem>, SourceError> {
        let url = search_url(prefix, &query.name)?;
        let html = self.http.get_text(&url).await?;
        let items = parse_site_results(&html, &url, site, &query.name, limit);
        debug!(site, count = items.len(), "Scanned institution site");
        Ok(items)
    }
}

#[async_trait]
impl Provider<NewsItem> for Institutions {
    fn name(&self) -> &str {
        "institutions"
    }

    #[instrument(level = "info", skip_all, fields(name = %query.name, affiliation = ?query.affiliation))]
    async fn search(&self, query: &Query, limit: usize) -> Result<Retrieval<NewsItem>, SourceError> {
        let Some(targets) = self.targets(query.affiliation.as_deref()) else {
            let hint = query.affiliation.as_deref().unwrap_or_default();
            warn!(%hint, "University not recognized; skipping institution scan");
            return Ok(Retrieval::skipped(format!(
                "university '{hint}' not recognized; known: {}",
                self.sites.keys().join(", ")
            )));
        };
        if targets.is_empty() {
            return Ok(Retrieval::skipped("no institution sites configured"));
        }

        let targets: Vec<(String, String)> = targets
            .into_iter()
            .map(|(site, prefix)| (site.to_string(), prefix.to_string()))
            .collect();
        let outcomes: Vec<(String, Result<Vec<NewsItem>, SourceError>)> = stream::iter(targets)
            .map(|(site, prefix)| async move {
                let outcome = self.scan_site(&site, &prefix, query, limit).await;
                (site, outcome)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let scanned = outcomes.len();
        let mut hits = Vec::new();
        let mut errors = Vec::new();
        for (site, outcome) in outcomes {
            match outcome {
                Ok(items) => hits.extend(items),
                Err(e) => {
                    warn!(%site, error = %e, "Institution site failed");
                    errors.push((site, e));
                }
            }
        }

        if errors.len() == scanned {
            if scanned == 1 {
                let (_, e) = errors.remove(0);
                return Err(e);
            }
            let attempts = errors.iter().map(|(site, e)| format!("{site}: {e}")).collect();
            return Err(SourceError::Exhausted { attempts });
        }

        info!(count = hits.len(), failed = errors.len(), scanned, "Institution scan done");
        let mut retrieval = Retrieval::hits(hits);
        if !errors.is_empty() {
            retrieval = retrieval.with_advisory(format!(
                "{} of {scanned} institution sites failed: {}",
                errors.len(),
                errors.iter().map(|(site, e)| format!("{site}: {e}")).join("; ")
            ));
        }
        Ok(retrieval)
    }
}

/// Site search URL: the prefix followed by the name words joined with `+`.
pub fn search_url(prefix: &str, name: &str) -> Result<Url, SourceError> {
    let terms = name
        .split_whitespace()
        .map(|w| urlencoding::encode(w).into_owned())
        .join("+");
    Ok(Url::parse(&format!("{prefix}{terms}"))?)
}

/// Article links on a site search page that mention `name`.
pub fn parse_site_results(html: &str, page: &Url, site: &str, name: &str, limit: usize) -> Vec<NewsItem> {
    let document = Html::parse_document(html);
    let needle = name.to_lowercase();
    document
        .select(&ANCHOR)
        .take(SCANNED_ANCHORS)
        .filter_map(|a| {
            let text = element_text(a);
            if text.chars().count() <= MIN_TITLE_CHARS || !text.to_lowercase().contains(&needle) {
                return None;
            }
            let url = page.join(a.value().attr("href")?).ok()?;
            Some(NewsItem {
                snippet: Field::Value(truncate_snippet(&text)),
                title: text,
                url: url.to_string(),
                source_label: LABEL.to_string(),
                published_date: Field::NotAvailable,
                publisher_name: Field::Value(format!("{} News", site.to_uppercase())),
                thumbnail: Field::NotAvailable,
            })
        })
        .take(limit)
        .collect()
}

fn truncate_snippet(text: &str) -> String {
    text.chars().take(SNIPPET_CHARS).collect()
}
