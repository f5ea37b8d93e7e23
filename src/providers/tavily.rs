//! Tavily search API client.
//!
//! Every web source uses the same client with different keywords: the quoted
//! name plus `research OR paper…` for academic results, a `site:` filter per
//! social platform, and the `news` topic for the news-flavoured search.

use crate::error::SourceError;
use crate::http::Http;
use crate::models::{Field, WebResult};
use crate::sources::{Provider, Query, Retrieval};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use url::Url;

pub const SEARCH_LABEL: &str = "Tavily Search";
pub const NEWS_LABEL: &str = "Tavily News";

pub struct Tavily {
    http: Http,
    endpoint: Url,
    api_key: Option<String>,
    keywords: Option<String>,
    topic: Option<&'static str>,
    label: &'static str,
}

impl Tavily {
    pub fn new(http: Http, endpoint: Url, api_key: Option<String>) -> Self {
        Self {
            http,
            endpoint,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            keywords: None,
            topic: None,
            label: SEARCH_LABEL,
        }
    }

    pub fn keywords(mut self, keywords: impl Into<String>) -> Self {
        self.keywords = Some(keywords.into());
        self
    }

    /// Restrict to news content.
    pub fn news(mut self) -> Self {
        self.topic = Some("news");
        self.label = NEWS_LABEL;
        self
    }

    fn request<'a>(&'a self, api_key: &'a str, query: &Query, limit: usize) -> SearchRequest<'a> {
        SearchRequest {
            api_key,
            query: query.quoted_with(self.keywords.as_deref()),
            max_results: limit,
            search_depth: "advanced",
            include_raw_content: false,
            topic: self.topic,
        }
    }
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: String,
    max_results: usize,
    search_depth: &'static str,
    include_raw_content: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    topic: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    title: Option<String>,
    url: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    score: Option<f64>,
}

#[async_trait]
impl Provider<WebResult> for Tavily {
    fn name(&self) -> &str {
        if self.topic.is_some() { "tavily_news" } else { "tavily" }
    }

    #[instrument(level = "info", skip_all, fields(name = %query.name, limit, topic = ?self.topic))]
    async fn search(&self, query: &Query, limit: usize) -> Result<Retrieval<WebResult>, SourceError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(SourceError::MissingCredential { credential: "TAVILY_API_KEY" });
        };
        let body = self.request(api_key, query, limit);
        let response: SearchResponse = self.http.post_json(&self.endpoint, &body).await?;
        let results = to_web_results(response.results, self.label, limit);
        info!(count = results.len(), keywords = ?self.keywords, "Tavily results");
        Ok(Retrieval::hits(results))
    }
}

fn to_web_results(results: Vec<TavilyResult>, label: &str, limit: usize) -> Vec<WebResult> {
    results
        .into_iter()
        .filter_map(|r| {
            let title = r.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())?;
            let url = r.url.filter(|u| !u.trim().is_empty())?;
            Some(WebResult {
                title,
                url,
                snippet: Field::text(r.content),
                source_label: label.to_string(),
                relevance_score: r.score.into(),
            })
        })
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn parse_response(body: &str, label: &str, limit: usize) -> Result<Vec<WebResult>, SourceError> {
        let response: SearchResponse = serde_json::from_str(body)?;
        Ok(to_web_results(response.results, label, limit))
    }

    const BODY: &str = r#"{
      "query": "\"Jane Doe\"",
      "response_time": 1.2,
      "results": [
        {"title": "Jane Doe | Lab", "url": "https://lab.example.edu/jane", "content": "Jane Doe leads the lab.", "score": 0.91},
        {"title": "Talk by Jane Doe", "url": "https://talks.example.com/1", "content": "", "score": 0.5, "published_date": "2025-01-01"},
        {"title": "", "url": "https://empty.example.com"}
      ]
    }"#;

    fn tavily(key: Option<&str>) -> Tavily {
        let config = Config::default();
        Tavily::new(
            Http::new(&config).unwrap(),
            Url::parse(&config.endpoints.tavily).unwrap(),
            key.map(String::from),
        )
    }

    #[test]
    fn test_parse_response() {
        let results = parse_response(BODY, SEARCH_LABEL, 10).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Jane Doe | Lab");
        assert_eq!(results[0].relevance_score, Field::Value(0.91));
        assert_eq!(results[0].source_label, "Tavily Search");
        assert_eq!(results[1].snippet, Field::NotAvailable);
    }

    #[test]
    fn test_missing_score_is_not_available() {
        let body = r#"{"results": [{"title": "T", "url": "https://t.example.com"}]}"#;
        let results = parse_response(body, NEWS_LABEL, 10).unwrap();
        assert_eq!(results[0].relevance_score, Field::NotAvailable);
    }

    #[test]
    fn test_request_body() {
        let provider = tavily(Some("tvly-key"))
            .keywords("podcast OR interview OR talk OR guest OR speaker");
        let body = serde_json::to_value(provider.request("tvly-key", &Query::new("Jane Doe"), 5)).unwrap();
        assert_eq!(body["query"], "\"Jane Doe\" podcast OR interview OR talk OR guest OR speaker");
        assert_eq!(body["max_results"], 5);
        assert_eq!(body["search_depth"], "advanced");
        assert!(body.get("topic").is_none());
    }

    #[test]
    fn test_news_topic() {
        let provider = tavily(Some("k")).news();
        assert_eq!(provider.name(), "tavily_news");
        let body = serde_json::to_value(provider.request("k", &Query::new("Jane Doe"), 5)).unwrap();
        assert_eq!(body["topic"], "news");
    }

    #[tokio::test]
    async fn test_missing_key_is_missing_credential() {
        let err = tavily(None).search(&Query::new("Jane Doe"), 5).await.unwrap_err();
        assert!(matches!(err, SourceError::MissingCredential { credential: "TAVILY_API_KEY" }));
    }
}
