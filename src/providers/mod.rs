//! Concrete providers behind each result source.
//!
//! Every provider implements [`Provider`](crate::sources::Provider) for one
//! record type and goes through the shared [`Http`](crate::http::Http) client,
//! so requests are paced per host and status codes map to the same errors.
//!
//! # Supported Providers
//!
//! | Provider | Module | Method | Records | Notes |
//! |----------|--------|--------|---------|-------|
//! | arXiv | [`arxiv`] | Atom API | papers | No citation data |
//! | Scholar profile | [`scholar`] | HTML scraping | papers | Author card, then publication table |
//! | Scholar search | [`scholar`] | HTML scraping | papers | `author:"…"` search; fallback |
//! | SerpAPI news | [`serpapi`] | JSON API | news | Requires `SERPAPI_KEY` |
//! | Google news (basic) | [`google`] | HTML scraping | news | `tbm=nws`; fallback |
//! | Institution news | [`institutions`] | HTML scraping | news | Site search pages from config |
//! | Tavily | [`tavily`] | JSON API | web, news | Requires `TAVILY_API_KEY` |
//! | Google (basic) | [`google`] | HTML scraping | web | Fallback for every web source |
//!
//! Parsing is done in plain functions over the response body, so fixtures can
//! be tested without a network.

pub mod arxiv;
pub mod google;
pub mod institutions;
pub mod scholar;
pub mod serpapi;
pub mod tavily;

use crate::utils::collapse_whitespace;
use scraper::ElementRef;
use url::Url;

/// Visible text of an element with whitespace collapsed.
pub(crate) fn element_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}

/// Resolve a result link found on a Google page.
///
/// Google wraps organic links as `/url?q=<target>&sa=…`; those are unwrapped.
/// Other relative links and absolute links to Google pages are internal
/// navigation and yield `None`.
pub(crate) fn resolve_google_href(href: &str) -> Option<String> {
    if href.starts_with("http://") || href.starts_with("https://") {
        let url = Url::parse(href).ok()?;
        let host = url.host_str().unwrap_or_default();
        if host == "google.com" || host.ends_with(".google.com") {
            // Only redirects lead off Google; other Google pages are navigation.
            return if url.path() == "/url" { target_param(&url) } else { None };
        }
        return Some(url.to_string());
    }
    if href.starts_with("/url?") {
        let url = Url::parse("https://www.google.com").ok()?.join(href).ok()?;
        return target_param(&url);
    }
    None
}

fn target_param(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == "q" || k == "url")
        .map(|(_, v)| v.into_owned())
        .filter(|v| v.starts_with("http://") || v.starts_with("https://"))
}
