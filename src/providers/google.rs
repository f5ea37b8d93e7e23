//! Basic Google scrapes, used when no API key is configured.
//!
//! Google serves different markup depending on the client; the selectors below
//! cover both the regular results page and the lightweight no-JS variant.
//! Results are best-effort and may be empty when Google answers with a consent
//! or captcha page.

use super::{element_text, resolve_google_href};
use crate::error::SourceError;
use crate::http::Http;
use crate::models::{Field, NewsItem, WebResult};
use crate::sources::{Provider, Query, Retrieval};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::{debug, info, instrument};
use url::Url;

pub const WEB_LABEL: &str = "Basic Search";
pub const NEWS_LABEL: &str = "Google News (Basic)";

static WEB_RESULT: Lazy<Selector> = Lazy::new(|| Selector::parse("div.g, div.Gx5Zad").expect("valid selector"));
static NEWS_RESULT: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.SoaBEf, div.Gx5Zad").expect("valid selector"));
static TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h3, div[role=heading], div.vvjwJb").expect("valid selector"));
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("valid selector"));
static WEB_SNIPPET: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.VwiC3b, div.s3v9rd, span.aCOpRe").expect("valid selector"));
static NEWS_SNIPPET: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.GI74Re, div.s3v9rd").expect("valid selector"));
static NEWS_PUBLISHER: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.NUnG9d span, div.UPmit").expect("valid selector"));
static NEWS_DATE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.OSrXXb span, span.r0bn4c").expect("valid selector"));

/// Organic web results for the quoted name plus optional keywords.
pub struct GoogleWeb {
    http: Http,
    endpoint: Url,
    keywords: Option<String>,
}

impl GoogleWeb {
    pub fn new(http: Http, endpoint: Url) -> Self {
        Self {
            http,
            endpoint,
            keywords: None,
        }
    }

    /// Append keywords (or a `site:` filter) after the quoted name.
    pub fn keywords(mut self, keywords: impl Into<String>) -> Self {
        self.keywords = Some(keywords.into());
        self
    }

    fn query_url(&self, query: &Query, limit: usize) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("q", &query.quoted_with(self.keywords.as_deref()))
            .append_pair("num", &limit.to_string())
            .append_pair("hl", "en");
        url
    }
}

#[async_trait]
impl Provider<WebResult> for GoogleWeb {
    fn name(&self) -> &str {
        "google_basic"
    }

    #[instrument(level = "info", skip_all, fields(name = %query.name, limit))]
    async fn search(&self, query: &Query, limit: usize) -> Result<Retrieval<WebResult>, SourceError> {
        let html = self.http.get_text(&self.query_url(query, limit)).await?;
        let results = parse_web_results(&html, limit);
        info!(count = results.len(), keywords = ?self.keywords, "Parsed Google results");
        Ok(Retrieval::hits(results))
    }
}

/// Google News tab (`tbm=nws`) results.
pub struct GoogleNews {
    http: Http,
    endpoint: Url,
}

impl GoogleNews {
    pub fn new(http: Http, endpoint: Url) -> Self {
        Self { http, endpoint }
    }

    fn query_url(&self, query: &Query, limit: usize) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("q", &query.quoted())
            .append_pair("tbm", "nws")
            .append_pair("num", &limit.to_string())
            .append_pair("hl", "en");
        url
    }
}

#[async_trait]
impl Provider<NewsItem> for GoogleNews {
    fn name(&self) -> &str {
        "google_news_basic"
    }

    #[instrument(level = "info", skip_all, fields(name = %query.name, limit))]
    async fn search(&self, query: &Query, limit: usize) -> Result<Retrieval<NewsItem>, SourceError> {
        let html = self.http.get_text(&self.query_url(query, limit)).await?;
        let items = parse_news_results(&html, limit);
        info!(count = items.len(), "Parsed Google News results");
        Ok(Retrieval::hits(items))
    }
}

/// Title and resolved target of one result block.
fn title_and_url(block: ElementRef<'_>) -> Option<(String, String)> {
    let url = block
        .select(&LINK)
        .filter_map(|a| a.value().attr("href"))
        .find_map(resolve_google_href)?;
    let title = block.select(&TITLE).next().map(element_text)?;
    if title.is_empty() {
        return None;
    }
    Some((title, url))
}

/// Organic results in page order, deduplicated by URL.
///
/// Relevance is rank-based: the first result scores 0.95, each following one
/// 0.05 less, never below zero.
pub fn parse_web_results(html: &str, limit: usize) -> Vec<WebResult> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let results: Vec<WebResult> = document
        .select(&WEB_RESULT)
        .filter_map(|block| {
            let (title, url) = title_and_url(block)?;
            let snippet = block.select(&WEB_SNIPPET).next().map(element_text);
            Some((title, url, snippet))
        })
        .filter(|(_, url, _)| seen.insert(url.clone()))
        .take(limit)
        .enumerate()
        .map(|(i, (title, url, snippet))| WebResult {
            title,
            url,
            snippet: Field::text(snippet),
            source_label: WEB_LABEL.to_string(),
            relevance_score: Field::Value((1.0 - (i + 1) as f64 * 0.05).max(0.0)),
        })
        .collect();
    debug!(count = results.len(), "Google web blocks");
    results
}

/// News tab results in page order, deduplicated by URL.
pub fn parse_news_results(html: &str, limit: usize) -> Vec<NewsItem> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    document
        .select(&NEWS_RESULT)
        .filter_map(|block| {
            let (title, url) = title_and_url(block)?;
            if !seen.insert(url.clone()) {
                return None;
            }
            Some(NewsItem {
                title,
                url,
                snippet: Field::text(block.select(&NEWS_SNIPPET).next().map(element_text)),
                source_label: NEWS_LABEL.to_string(),
                published_date: Field::text(block.select(&NEWS_DATE).next().map(element_text)),
                publisher_name: Field::text(block.select(&NEWS_PUBLISHER).next().map(element_text)),
                thumbnail: Field::NotAvailable,
            })
        })
        .take(limit)
        .collect()
}
