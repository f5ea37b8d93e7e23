//! SerpAPI Google News client.
//!
//! Requires a `SERPAPI_KEY`. Without one the provider reports a missing
//! credential and the news chain falls back to the basic Google scrape.

use crate::error::SourceError;
use crate::http::Http;
use crate::models::{Field, NewsItem};
use crate::sources::{Provider, Query, Retrieval};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, instrument};
use url::Url;

pub struct SerpApiNews {
    http: Http,
    endpoint: Url,
    api_key: Option<String>,
}

impl SerpApiNews {
    pub fn new(http: Http, endpoint: Url, api_key: Option<String>) -> Self {
        Self {
            http,
            endpoint,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    fn query_url(&self, api_key: &str, query: &Query, limit: usize) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("engine", "google")
            .append_pair("q", &query.quoted())
            .append_pair("tbm", "nws")
            .append_pair("num", &limit.to_string())
            .append_pair("api_key", api_key);
        url
    }
}

#[async_trait]
impl Provider<NewsItem> for SerpApiNews {
    fn name(&self) -> &str {
        "serpapi"
    }

    #[instrument(level = "info", skip_all, fields(name = %query.name, limit))]
    async fn search(&self, query: &Query, limit: usize) -> Result<Retrieval<NewsItem>, SourceError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(SourceError::MissingCredential { credential: "SERPAPI_KEY" });
        };
        let response: SerpResponse = self.http.get_json(&self.query_url(api_key, query, limit)).await?;
        if let Some(error) = response.error {
            // "Google hasn't returned any results" is an empty search, not a failure.
            if error.contains("hasn't returned any results") {
                return Ok(Retrieval::hits(Vec::new()));
            }
            return Err(SourceError::Parse(format!("SerpAPI error: {error}")));
        }
        let items = to_news_items(response.news_results, limit);
        info!(count = items.len(), "SerpAPI news results");
        Ok(Retrieval::hits(items))
    }
}

#[derive(Debug, Deserialize)]
struct SerpResponse {
    #[serde(default)]
    news_results: Vec<SerpNews>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SerpNews {
    title: Option<String>,
    link: Option<String>,
    #[serde(default)]
    source: Option<SerpSource>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    snippet: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
}

/// The news engine reports `source` as a plain string; newer responses use an
/// object with a `name`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SerpSource {
    Name(String),
    Detailed { name: Option<String> },
}

impl SerpSource {
    fn into_name(self) -> Option<String> {
        match self {
            SerpSource::Name(name) => Some(name),
            SerpSource::Detailed { name } => name,
        }
    }
}

fn to_news_items(results: Vec<SerpNews>, limit: usize) -> Vec<NewsItem> {
    results
        .into_iter()
        .filter_map(|r| {
            let title = r.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())?;
            let url = r.link.filter(|l| !l.trim().is_empty())?;
            Some(NewsItem {
                title,
                url,
                snippet: Field::text(r.snippet),
                source_label: "Google News".to_string(),
                published_date: Field::text(r.date),
                publisher_name: Field::text(r.source.and_then(SerpSource::into_name)),
                thumbnail: Field::text(r.thumbnail),
            })
        })
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn parse_news_json(body: &str, limit: usize) -> Result<Vec<NewsItem>, SourceError> {
        let response: SerpResponse = serde_json::from_str(body)?;
        Ok(to_news_items(response.news_results, limit))
    }

    const BODY: &str = r#"{
      "search_metadata": {"status": "Success"},
      "news_results": [
        {
          "position": 1,
          "link": "https://news.example.com/jane-doe",
          "title": "Jane Doe named fellow",
          "source": "Example Times",
          "date": "3 days ago",
          "snippet": "The society announced...",
          "thumbnail": "https://img.example.com/t.jpg"
        },
        {
          "position": 2,
          "link": "https://other.example.com/x",
          "title": "Profile: Jane Doe",
          "source": {"name": "Other Daily", "icon": "https://other.example.com/i.png"}
        },
        {"position": 3, "title": "No link here"}
      ]
    }"#;

    fn provider(key: Option<&str>) -> SerpApiNews {
        let config = Config::default();
        SerpApiNews::new(
            Http::new(&config).unwrap(),
            Url::parse(&config.endpoints.serpapi).unwrap(),
            key.map(String::from),
        )
    }

    #[test]
    fn test_parse_news_json() {
        let items = parse_news_json(BODY, 10).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].publisher_name, Field::Value("Example Times".to_string()));
        assert_eq!(items[0].published_date, Field::Value("3 days ago".to_string()));
        assert_eq!(items[0].thumbnail, Field::Value("https://img.example.com/t.jpg".to_string()));
        assert_eq!(items[1].publisher_name, Field::Value("Other Daily".to_string()));
        assert_eq!(items[1].snippet, Field::NotAvailable);
        assert_eq!(items[1].source_label, "Google News");
    }

    #[test]
    fn test_parse_news_json_respects_limit() {
        assert_eq!(parse_news_json(BODY, 1).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_news_results_is_empty() {
        assert!(parse_news_json(r#"{"search_metadata": {}}"#, 10).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_key_is_missing_credential() {
        let err = provider(None).search(&Query::new("Jane Doe"), 5).await.unwrap_err();
        assert!(matches!(err, SourceError::MissingCredential { credential: "SERPAPI_KEY" }));

        let err = provider(Some("  ")).search(&Query::new("Jane Doe"), 5).await.unwrap_err();
        assert!(matches!(err, SourceError::MissingCredential { .. }));
    }

    #[test]
    fn test_query_url_targets_news() {
        let url = provider(Some("k")).query_url("k", &Query::new("Jane Doe"), 4);
        assert!(url.query_pairs().any(|(k, v)| k == "tbm" && v == "nws"));
        assert!(url.query_pairs().any(|(k, v)| k == "q" && v == "\"Jane Doe\""));
    }
}
