//! Google Scholar scrapers.
//!
//! Two strategies, tried in this order by the papers adapter:
//!
//! | Provider | Page | Notes |
//! |----------|------|-------|
//! | [`ScholarProfile`] | author search, then the first profile's publication table | citation counts, no abstracts |
//! | [`ScholarSearch`] | `author:"…"` publication search | snippets, byline-derived venue and year |
//!
//! Both are best-effort HTML scrapes; Scholar markup changes and throttles
//! unauthenticated clients.

use super::element_text;
use crate::error::SourceError;
use crate::http::Http;
use crate::models::{Field, Paper};
use crate::sources::{Provider, Query, Retrieval};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument};
use url::Url;

const LABEL: &str = "Google Scholar";

static AUTHOR_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".gsc_1usr h3.gs_ai_name a[href]").expect("valid selector"));
static PUB_ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr.gsc_a_tr").expect("valid selector"));
static PUB_TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("a.gsc_a_at").expect("valid selector"));
static PUB_GRAY: Lazy<Selector> = Lazy::new(|| Selector::parse("div.gs_gray").expect("valid selector"));
static PUB_CITES: Lazy<Selector> = Lazy::new(|| Selector::parse("a.gsc_a_ac").expect("valid selector"));
static PUB_YEAR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span.gsc_a_h, td.gsc_a_y span").expect("valid selector"));

static RESULT: Lazy<Selector> = Lazy::new(|| Selector::parse("div.gs_ri").expect("valid selector"));
static RESULT_TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("h3.gs_rt a[href]").expect("valid selector"));
static RESULT_BYLINE: Lazy<Selector> = Lazy::new(|| Selector::parse("div.gs_a").expect("valid selector"));
static RESULT_SNIPPET: Lazy<Selector> = Lazy::new(|| Selector::parse("div.gs_rs").expect("valid selector"));
static RESULT_LINKS: Lazy<Selector> = Lazy::new(|| Selector::parse("div.gs_fl a").expect("valid selector"));

static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(19|20)\d{2}\b").expect("valid regex"));
static CITED_BY: Lazy<Regex> = Lazy::new(|| Regex::new(r"Cited by (\d+)").expect("valid regex"));

/// Author profile strategy: find the author, then read their publication table.
pub struct ScholarProfile {
    http: Http,
    base: Url,
}

impl ScholarProfile {
    pub fn new(http: Http, base: Url) -> Self {
        Self { http, base }
    }
}

#[async_trait]
impl Provider<Paper> for ScholarProfile {
    fn name(&self) -> &str {
        "scholar_profile"
    }

    #[instrument(level = "info", skip_all, fields(name = %query.name, limit))]
    async fn search(&self, query: &Query, limit: usize) -> Result<Retrieval<Paper>, SourceError> {
        let mut search_url = self.base.join("/citations")?;
        search_url
            .query_pairs_mut()
            .append_pair("view_op", "search_authors")
            .append_pair("mauthors", &query.quoted())
            .append_pair("hl", "en");

        let html = self.http.get_text(&search_url).await?;
        let Some(profile) = first_author_profile(&html, &self.base) else {
            return Err(SourceError::NoMatch(format!(
                "no Google Scholar author profile for {}",
                query.quoted()
            )));
        };
        info!(%profile, "Found author profile");

        let mut profile_url = profile;
        profile_url
            .query_pairs_mut()
            .append_pair("cstart", "0")
            .append_pair("pagesize", &limit.max(1).to_string());
        let html = self.http.get_text(&profile_url).await?;
        let papers = parse_profile_publications(&html, &self.base, limit);
        info!(count = papers.len(), "Parsed profile publications");
        Ok(Retrieval::hits(papers))
    }
}

/// Absolute URL of the first author card on a Scholar author-search page.
pub fn first_author_profile(html: &str, base: &Url) -> Option<Url> {
    let document = Html::parse_document(html);
    document
        .select(&AUTHOR_LINK)
        .filter_map(|a| a.value().attr("href"))
        .find_map(|href| base.join(href).ok())
}

/// Rows of a Scholar profile publication table.
pub fn parse_profile_publications(html: &str, base: &Url, limit: usize) -> Vec<Paper> {
    let document = Html::parse_document(html);
    document
        .select(&PUB_ROW)
        .filter_map(|row| {
            let title_el = row.select(&PUB_TITLE).next()?;
            let title = element_text(title_el);
            if title.is_empty() {
                return None;
            }
            let url = title_el
                .value()
                .attr("href")
                .and_then(|h| base.join(h).ok())
                .map(|u| u.to_string())?;

            let mut gray = row.select(&PUB_GRAY).map(element_text);
            let authors = Field::text(gray.next());
            // Venue lines end with ", <year>"; the year has its own column.
            let venue = Field::text(gray.next().map(|v| {
                YEAR.replace(&v, "").trim().trim_end_matches(',').trim().to_string()
            }));

            // An empty citation cell means zero citations.
            let citation_count = row
                .select(&PUB_CITES)
                .next()
                .map(|c| element_text(c).parse::<u64>().unwrap_or(0))
                .unwrap_or(0);
            let year = row
                .select(&PUB_YEAR)
                .map(element_text)
                .find_map(|y| y.parse::<i32>().ok());

            Some(Paper {
                title,
                url,
                snippet: Field::NotAvailable,
                source_label: LABEL.to_string(),
                authors,
                year: year.into(),
                venue,
                citation_count: Field::Value(citation_count),
            })
        })
        .take(limit)
        .collect()
}

/// Publication search strategy: `author:"First Last"` on the Scholar results page.
pub struct ScholarSearch {
    http: Http,
    base: Url,
}

impl ScholarSearch {
    pub fn new(http: Http, base: Url) -> Self {
        Self { http, base }
    }
}

#[async_trait]
impl Provider<Paper> for ScholarSearch {
    fn name(&self) -> &str {
        "scholar_search"
    }

    #[instrument(level = "info", skip_all, fields(name = %query.name, limit))]
    async fn search(&self, query: &Query, limit: usize) -> Result<Retrieval<Paper>, SourceError> {
        let mut url = self.base.join("/scholar")?;
        url.query_pairs_mut()
            .append_pair("q", &format!("author:{}", query.quoted()))
            .append_pair("hl", "en")
            .append_pair("num", &limit.to_string());
        let html = self.http.get_text(&url).await?;
        let papers = parse_search_results(&html, limit);
        debug!(count = papers.len(), "Parsed Scholar search results");
        Ok(Retrieval::hits(papers))
    }
}

/// Organic results of a Scholar search page. Citation-only entries without a
/// link are skipped.
pub fn parse_search_results(html: &str, limit: usize) -> Vec<Paper> {
    let document = Html::parse_document(html);
    document
        .select(&RESULT)
        .filter_map(|result| {
            let title_el = result.select(&RESULT_TITLE).next()?;
            let title = element_text(title_el);
            let url = title_el.value().attr("href")?.to_string();
            if title.is_empty() {
                return None;
            }

            let byline = result.select(&RESULT_BYLINE).next().map(element_text);
            let (authors, venue, year) = byline.as_deref().map(split_byline).unwrap_or_default();

            let citation_count = result
                .select(&RESULT_LINKS)
                .map(element_text)
                .find_map(|t| CITED_BY.captures(&t).and_then(|c| c[1].parse::<u64>().ok()))
                .unwrap_or(0);

            Some(Paper {
                title,
                url,
                snippet: Field::text(result.select(&RESULT_SNIPPET).next().map(element_text)),
                source_label: LABEL.to_string(),
                authors,
                year,
                venue,
                citation_count: Field::Value(citation_count),
            })
        })
        .take(limit)
        .collect()
}

/// Split a Scholar byline `"J Doe, J Roe - Nature, 2021 - nature.com"` into
/// authors, venue and year.
fn split_byline(byline: &str) -> (Field<String>, Field<String>, Field<i32>) {
    let mut parts = byline.split(" - ");
    let authors = Field::text(parts.next().map(|a| a.trim_end_matches('…').trim().to_string()));
    let middle = parts.next().unwrap_or_default();
    let year = YEAR
        .find(middle)
        .and_then(|m| m.as_str().parse::<i32>().ok())
        .into();
    let venue = Field::text(Some(
        YEAR.replace(middle, "").trim().trim_end_matches(',').trim().to_string(),
    ));
    (authors, venue, year)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://scholar.google.com").unwrap()
    }

    const AUTHOR_SEARCH: &str = r#"
<html><body>
  <div class="gsc_1usr">
    <h3 class="gs_ai_name"><a href="/citations?hl=en&amp;user=AbC123xyz">Jane Doe</a></h3>
    <div class="gs_ai_aff">Columbia University</div>
  </div>
  <div class="gsc_1usr">
    <h3 class="gs_ai_name"><a href="/citations?hl=en&amp;user=Other999">Jane A. Doe</a></h3>
  </div>
</body></html>"#;

    const PROFILE: &str = r#"
<table><tbody id="gsc_a_b">
  <tr class="gsc_a_tr">
    <td class="gsc_a_t">
      <a href="/citations?view_op=view_citation&amp;citation_for_view=AbC123xyz:u5HHmVD_uO8C" class="gsc_a_at">Learning Sparse
        Representations</a>
      <div class="gs_gray">J Doe, J Roe, A Smith</div>
      <div class="gs_gray">NeurIPS 35, 1-12<span class="gs_oph">, 2022</span></div>
    </td>
    <td class="gsc_a_c"><a href="https://scholar.google.com/scholar?cites=1" class="gsc_a_ac gs_ibl">148</a></td>
    <td class="gsc_a_y"><span class="gsc_a_h gsc_a_hc gs_ibl">2022</span></td>
  </tr>
  <tr class="gsc_a_tr">
    <td class="gsc_a_t">
      <a href="/citations?view_op=view_citation&amp;citation_for_view=AbC123xyz:2osOgNQ5qMEC" class="gsc_a_at">A Workshop Note</a>
      <div class="gs_gray">J Doe</div>
      <div class="gs_gray"></div>
    </td>
    <td class="gsc_a_c"><a href="javascript:void(0)" class="gsc_a_ac gs_ibl gsc_a_acm"></a></td>
    <td class="gsc_a_y"><span class="gsc_a_h gsc_a_hc gs_ibl"></span></td>
  </tr>
</tbody></table>"#;

    const SEARCH: &str = r#"
<div class="gs_r gs_or gs_scl">
  <div class="gs_ri">
    <h3 class="gs_rt"><a href="https://example.org/paper.pdf">Graph Methods for <b>Doe</b> Problems</a></h3>
    <div class="gs_a">J Doe, J Roe - Journal of Graphs, 2019 - example.org</div>
    <div class="gs_rs">We propose graph methods…</div>
    <div class="gs_fl"><a href="/scholar?cites=9">Cited by 37</a><a href="/scholar?related">Related articles</a></div>
  </div>
</div>
<div class="gs_r gs_or gs_scl">
  <div class="gs_ri">
    <h3 class="gs_rt"><span class="gs_ctc">[CITATION]</span> Unlinked Entry</h3>
    <div class="gs_a">J Doe - 2018</div>
  </div>
</div>"#;

    #[test]
    fn test_first_author_profile() {
        let url = first_author_profile(AUTHOR_SEARCH, &base()).unwrap();
        assert_eq!(url.as_str(), "https://scholar.google.com/citations?hl=en&user=AbC123xyz");
    }

    #[test]
    fn test_no_author_profile() {
        assert!(first_author_profile("<html><body>No results</body></html>", &base()).is_none());
    }

    #[test]
    fn test_parse_profile_publications() {
        let papers = parse_profile_publications(PROFILE, &base(), 10);
        assert_eq!(papers.len(), 2);

        let first = &papers[0];
        assert_eq!(first.title, "Learning Sparse Representations");
        assert!(first.url.starts_with("https://scholar.google.com/citations?view_op=view_citation"));
        assert_eq!(first.authors, Field::Value("J Doe, J Roe, A Smith".to_string()));
        assert_eq!(first.venue, Field::Value("NeurIPS 35, 1-12".to_string()));
        assert_eq!(first.year, Field::Value(2022));
        assert_eq!(first.citation_count, Field::Value(148));
        assert_eq!(first.snippet, Field::NotAvailable);

        let second = &papers[1];
        assert_eq!(second.venue, Field::NotAvailable);
        assert_eq!(second.year, Field::NotAvailable);
        assert_eq!(second.citation_count, Field::Value(0));
    }

    #[test]
    fn test_profile_respects_limit() {
        assert_eq!(parse_profile_publications(PROFILE, &base(), 1).len(), 1);
    }

    #[test]
    fn test_parse_search_results() {
        let papers = parse_search_results(SEARCH, 10);
        assert_eq!(papers.len(), 1);
        let paper = &papers[0];
        assert_eq!(paper.title, "Graph Methods for Doe Problems");
        assert_eq!(paper.url, "https://example.org/paper.pdf");
        assert_eq!(paper.authors, Field::Value("J Doe, J Roe".to_string()));
        assert_eq!(paper.venue, Field::Value("Journal of Graphs".to_string()));
        assert_eq!(paper.year, Field::Value(2019));
        assert_eq!(paper.citation_count, Field::Value(37));
        assert_eq!(paper.snippet, Field::Value("We propose graph methods…".to_string()));
    }

    #[test]
    fn test_split_byline_without_venue() {
        let (authors, venue, year) = split_byline("J Doe");
        assert_eq!(authors, Field::Value("J Doe".to_string()));
        assert_eq!(venue, Field::NotAvailable);
        assert_eq!(year, Field::NotAvailable);
    }
}
