//! Top-level search orchestration.
//!
//! The [`Aggregator`] runs the three category adapters in a fixed order
//! (papers, news, web) and assembles one [`Report`]. A disabled category stays
//! empty. An adapter that errors or panics becomes a category-wide failure; the
//! other categories still run, so a search always produces a report.

use crate::adapters::{self, Adapter};
use crate::config::Config;
use crate::error::{CategoryError, ConfigError, RequestError};
use crate::http::Http;
use crate::models::{NewsItem, Paper, WebResult};
use crate::report::{Category, CategoryOutcome, Failure, Report, ReportBuilder};
use crate::sources::Query;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;
use tracing::{error, info, instrument};

pub const DEFAULT_PER_SOURCE_LIMIT: usize = 10;

/// One search invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub name: String,
    pub university_hint: Option<String>,
    pub per_source_limit: usize,
    pub include_social: bool,
    pub enable_papers: bool,
    pub enable_news: bool,
    pub enable_web: bool,
}

impl SearchRequest {
    /// All categories enabled, no hint, no social platforms.
    pub fn new(name: impl Into<String>) -> Result<Self, RequestError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(RequestError::EmptyName);
        }
        Ok(Self {
            name,
            university_hint: None,
            per_source_limit: DEFAULT_PER_SOURCE_LIMIT,
            include_social: false,
            enable_papers: true,
            enable_news: true,
            enable_web: true,
        })
    }

    pub fn university(mut self, hint: Option<String>) -> Self {
        self.university_hint = hint.map(|h| h.trim().to_string()).filter(|h| !h.is_empty());
        self
    }

    pub fn limit(mut self, per_source_limit: usize) -> Result<Self, RequestError> {
        if per_source_limit == 0 {
            return Err(RequestError::ZeroLimit);
        }
        self.per_source_limit = per_source_limit;
        Ok(self)
    }

    pub fn social(mut self, include_social: bool) -> Self {
        self.include_social = include_social;
        self
    }

    pub fn categories(mut self, papers: bool, news: bool, web: bool) -> Self {
        self.enable_papers = papers;
        self.enable_news = news;
        self.enable_web = web;
        self
    }

    fn query(&self) -> Query {
        let mut query = Query::new(self.name.clone());
        query.affiliation = self.university_hint.clone();
        query.include_social = self.include_social;
        query
    }
}

pub struct Aggregator {
    papers: Box<dyn Adapter<Paper>>,
    news: Box<dyn Adapter<NewsItem>>,
    web: Box<dyn Adapter<WebResult>>,
}

impl Aggregator {
    /// Validate the configuration and wire the standard adapters to one
    /// shared, paced HTTP client.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let http = Http::new(config)?;
        Ok(Self::with_adapters(
            adapters::papers::build(config, &http)?,
            adapters::news::build(config, &http)?,
            adapters::web::build(config, &http)?,
        ))
    }

    pub fn with_adapters(
        papers: impl Adapter<Paper> + 'static,
        news: impl Adapter<NewsItem> + 'static,
        web: impl Adapter<WebResult> + 'static,
    ) -> Self {
        Self {
            papers: Box::new(papers),
            news: Box::new(news),
            web: Box::new(web),
        }
    }

    /// Run every enabled category and assemble the report. Never fails.
    #[instrument(level = "info", skip_all, fields(name = %request.name, limit = request.per_source_limit))]
    pub async fn search(&self, request: &SearchRequest) -> Report {
        let t0 = Instant::now();
        let query = request.query();
        let limit = request.per_source_limit;
        let mut report = ReportBuilder::new(request.name.clone());

        if request.enable_papers {
            report.papers(run_phase(self.papers.as_ref(), &query, limit).await);
        } else {
            info!(category = %Category::Papers, "Phase skipped");
        }
        if request.enable_news {
            report.news(run_phase(self.news.as_ref(), &query, limit).await);
        } else {
            info!(category = %Category::News, "Phase skipped");
        }
        if request.enable_web {
            report.web(run_phase(self.web.as_ref(), &query, limit).await);
        } else {
            info!(category = %Category::Web, "Phase skipped");
        }

        let report = report.finish();
        info!(
            papers = report.summary().papers,
            news = report.summary().news,
            web = report.summary().web,
            notices = report.notices().len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Search assembled"
        );
        report
    }
}

async fn run_phase<T>(adapter: &dyn Adapter<T>, query: &Query, limit: usize) -> CategoryOutcome<T> {
    let category = adapter.category();
    info!(%category, "Phase started");
    let outcome = AssertUnwindSafe(adapter.search_all(query, limit)).catch_unwind().await;
    match outcome {
        Ok(Ok(result)) => {
            info!(
                %category,
                total = result.total(),
                sources = ?result.source_names().collect::<Vec<_>>(),
                "Phase done"
            );
            CategoryOutcome::Completed(result)
        }
        Ok(Err(e)) => {
            error!(%category, error = %e, "Phase failed");
            CategoryOutcome::Failed(Failure::new(e.to_string()))
        }
        Err(panic) => {
            let e = CategoryError::Panicked(panic_message(panic.as_ref()));
            error!(%category, error = %e, "Phase panicked");
            CategoryOutcome::Failed(Failure::new(e.to_string()))
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::SourceAdapter;
    use crate::error::SourceError;
    use crate::models::Field;
    use crate::report::{CategoryResult, SourceOutcome};
    use crate::sources::Source;
    use crate::sources::testing::StubProvider;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Adapter with a fixed behavior and a call counter.
    struct StubAdapter {
        category: Category,
        calls: Arc<AtomicUsize>,
        panics: bool,
    }

    impl StubAdapter {
        fn new(category: Category) -> Self {
            Self {
                category,
                calls: Arc::new(AtomicUsize::new(0)),
                panics: false,
            }
        }

        fn panicking(category: Category) -> Self {
            Self {
                panics: true,
                ..Self::new(category)
            }
        }
    }

    #[async_trait]
    impl<T: Send + 'static> Adapter<T> for StubAdapter {
        fn category(&self) -> Category {
            self.category
        }

        async fn search_all(&self, _query: &Query, _limit: usize) -> Result<CategoryResult<T>, CategoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.panics {
                panic!("selector exploded");
            }
            Ok(CategoryResult::new())
        }
    }

    fn paper(title: &str) -> Paper {
        Paper {
            title: title.to_string(),
            url: format!("https://example.org/{title}"),
            snippet: Field::NotAvailable,
            source_label: "arXiv".to_string(),
            authors: Field::Value("Jane Doe".to_string()),
            year: Field::Value(2024),
            venue: Field::Value("arXiv".to_string()),
            citation_count: Field::NotAvailable,
        }
    }

    fn blocked() -> SourceError {
        SourceError::Status {
            status: 403,
            url: "https://scholar.google.com/scholar".to_string(),
        }
    }

    fn papers_adapter() -> SourceAdapter<Paper> {
        SourceAdapter::new(
            Category::Papers,
            vec![
                Source::new("google_scholar").provider(StubProvider::hits("scholar_profile", vec![paper("a")])),
                Source::new("arxiv").provider(StubProvider::hits("arXiv", vec![paper("b")])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_request_validation() {
        assert!(matches!(SearchRequest::new("   "), Err(RequestError::EmptyName)));
        let request = SearchRequest::new(" Jane Doe ").unwrap();
        assert_eq!(request.name, "Jane Doe");
        assert!(matches!(request.clone().limit(0), Err(RequestError::ZeroLimit)));
        assert_eq!(request.limit(3).unwrap().per_source_limit, 3);
    }

    #[test]
    fn test_blank_hint_is_no_hint() {
        let request = SearchRequest::new("Jane Doe").unwrap().university(Some(" ".to_string()));
        assert_eq!(request.university_hint, None);
    }

    #[tokio::test]
    async fn test_papers_only_search() {
        let aggregator = Aggregator::with_adapters(
            papers_adapter(),
            StubAdapter::new(Category::News),
            StubAdapter::new(Category::Web),
        );
        let request = SearchRequest::new("Jane Doe")
            .unwrap()
            .limit(5)
            .unwrap()
            .categories(true, false, false);

        let report = aggregator.search(&request).await;
        let papers = report.papers().result().unwrap();
        assert_eq!(papers.source_names().collect::<Vec<_>>(), vec!["google_scholar", "arxiv"]);
        assert_eq!(report.summary().papers, 2);
        assert_eq!(report.summary().news, 0);
        assert!(report.news().result().unwrap().is_empty());
        assert!(report.web().result().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_disabled_categories_are_not_invoked() {
        let papers = StubAdapter::new(Category::Papers);
        let news = StubAdapter::new(Category::News);
        let web = StubAdapter::new(Category::Web);
        let counters = [papers.calls.clone(), news.calls.clone(), web.calls.clone()];
        let aggregator = Aggregator::with_adapters(papers, news, web);

        let request = SearchRequest::new("Jane Doe").unwrap().categories(false, false, false);
        let report = aggregator.search(&request).await;
        assert_eq!(*report.summary(), Default::default());
        for counter in &counters {
            assert_eq!(counter.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn test_panicking_adapter_fails_only_its_category() {
        let aggregator = Aggregator::with_adapters(
            papers_adapter(),
            StubAdapter::panicking(Category::News),
            StubAdapter::new(Category::Web),
        );
        let report = aggregator.search(&SearchRequest::new("Jane Doe").unwrap()).await;

        let failure = report.news().failure().unwrap();
        assert!(failure.error.contains("selector exploded"));
        assert_eq!(report.summary().news, 0);
        assert_eq!(report.summary().papers, 2);
        assert!(report.web().result().is_some());
    }

    #[tokio::test]
    async fn test_failing_source_does_not_block_siblings() {
        let papers = SourceAdapter::new(
            Category::Papers,
            vec![
                Source::new("google_scholar").provider(StubProvider::<Paper>::failing("scholar_profile", blocked)),
                Source::new("arxiv").provider(StubProvider::hits("arXiv", vec![paper("b"), paper("c")])),
            ],
        )
        .unwrap();
        let aggregator = Aggregator::with_adapters(
            papers,
            StubAdapter::new(Category::News),
            StubAdapter::new(Category::Web),
        );
        let report = aggregator.search(&SearchRequest::new("Jane Doe").unwrap()).await;

        let papers = report.papers().result().unwrap();
        assert!(papers.get("google_scholar").unwrap().is_failure());
        assert_eq!(papers.len(), 2);
        assert_eq!(papers.get("arxiv").map(SourceOutcome::count), Some(2));
        assert_eq!(report.summary().papers, 2);
    }

    #[tokio::test]
    async fn test_repeated_searches_agree() {
        let aggregator = Aggregator::with_adapters(
            papers_adapter(),
            StubAdapter::new(Category::News),
            StubAdapter::new(Category::Web),
        );
        let request = SearchRequest::new("Jane Doe").unwrap();
        let first = aggregator.search(&request).await;
        let second = aggregator.search(&request).await;
        assert_eq!(first.papers(), second.papers());
        assert_eq!(first.news(), second.news());
        assert_eq!(first.web(), second.web());
        assert_eq!(first.summary(), second.summary());
    }

    #[test]
    fn test_default_aggregator_builds() {
        assert!(Aggregator::new(&Config::default()).is_ok());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = Config {
            politeness_interval_ms: 10,
            ..Config::default()
        };
        assert!(Aggregator::new(&config).is_err());
    }
}
