//! The aggregate report and its per-category result maps.
//!
//! A [`Report`] is assembled once per search by the aggregator through a
//! [`ReportBuilder`] and is read-only afterwards. Each category holds a
//! [`CategoryResult`]: an insertion-ordered map from source name to either the
//! source's hits or a [`Failure`] marker. A category whose adapter failed as a
//! whole is recorded as [`CategoryOutcome::Failed`].

use crate::models::{NewsItem, Paper, WebResult};
use chrono::{DateTime, Local};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::fmt;

/// The three result categories, in the order the aggregator runs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Papers,
    News,
    Web,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Papers => "papers",
            Category::News => "news",
            Category::Web => "web",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diagnostic message recorded in place of results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Failure {
    pub error: String,
}

impl Failure {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}

/// What one source produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SourceOutcome<T> {
    Results(Vec<T>),
    Failure(Failure),
}

impl<T> SourceOutcome<T> {
    /// Number of hits; failures count as zero.
    pub fn count(&self) -> usize {
        match self {
            SourceOutcome::Results(items) => items.len(),
            SourceOutcome::Failure(_) => 0,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, SourceOutcome::Failure(_))
    }

    pub fn items(&self) -> &[T] {
        match self {
            SourceOutcome::Results(items) => items,
            SourceOutcome::Failure(_) => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    /// A preferred access path was unavailable and a weaker one was used.
    Degraded,
    /// Something worth knowing that is neither a result nor a failure.
    Advisory,
}

/// A non-fatal diagnostic attached to the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub category: Category,
    pub source: String,
    pub kind: NoticeKind,
    pub message: String,
}

/// Results of one category keyed by source name.
///
/// Serializes as the plain source map; notices are lifted into the report.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryResult<T> {
    sources: IndexMap<String, SourceOutcome<T>>,
    notices: Vec<Notice>,
}

impl<T> Default for CategoryResult<T> {
    fn default() -> Self {
        Self {
            sources: IndexMap::new(),
            notices: Vec::new(),
        }
    }
}

impl<T> CategoryResult<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a source's outcome. Returns `false` and keeps the first outcome
    /// if the source was already recorded.
    pub fn insert(&mut self, source: impl Into<String>, outcome: SourceOutcome<T>) -> bool {
        let source = source.into();
        if self.sources.contains_key(&source) {
            return false;
        }
        self.sources.insert(source, outcome);
        true
    }

    pub fn push_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    #[cfg(test)]
    pub fn get(&self, source: &str) -> Option<&SourceOutcome<T>> {
        self.sources.get(source)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SourceOutcome<T>)> {
        self.sources.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn source_names(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Sum of hits across sources, failures excluded.
    pub fn total(&self) -> usize {
        self.sources.values().map(SourceOutcome::count).sum()
    }
}

impl<T: Serialize> Serialize for CategoryResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.sources.serialize(serializer)
    }
}

/// A category either completed (possibly with per-source failures) or failed outright.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CategoryOutcome<T> {
    Completed(CategoryResult<T>),
    Failed(Failure),
}

impl<T> Default for CategoryOutcome<T> {
    fn default() -> Self {
        CategoryOutcome::Completed(CategoryResult::new())
    }
}

impl<T> CategoryOutcome<T> {
    pub fn total(&self) -> usize {
        match self {
            CategoryOutcome::Completed(result) => result.total(),
            CategoryOutcome::Failed(_) => 0,
        }
    }

    pub fn result(&self) -> Option<&CategoryResult<T>> {
        match self {
            CategoryOutcome::Completed(result) => Some(result),
            CategoryOutcome::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            CategoryOutcome::Completed(_) => None,
            CategoryOutcome::Failed(failure) => Some(failure),
        }
    }

    fn notices(&self) -> &[Notice] {
        match self {
            CategoryOutcome::Completed(result) => result.notices(),
            CategoryOutcome::Failed(_) => &[],
        }
    }
}

/// Total hit count per category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub papers: usize,
    pub news: usize,
    pub web: usize,
}

/// Everything one search produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    query: String,
    timestamp: DateTime<Local>,
    papers: CategoryOutcome<Paper>,
    news: CategoryOutcome<NewsItem>,
    web: CategoryOutcome<WebResult>,
    summary: Summary,
    notices: Vec<Notice>,
}

impl Report {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    pub fn papers(&self) -> &CategoryOutcome<Paper> {
        &self.papers
    }

    pub fn news(&self) -> &CategoryOutcome<NewsItem> {
        &self.news
    }

    pub fn web(&self) -> &CategoryOutcome<WebResult> {
        &self.web
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }
}

/// In-progress report owned by the aggregator.
///
/// Categories start out empty, so a skipped phase needs no write at all. Each
/// category is set at most once; a second write is ignored.
#[derive(Debug)]
pub struct ReportBuilder {
    report: Report,
    written: Vec<Category>,
}

impl ReportBuilder {
    pub fn new(query: impl Into<String>) -> Self {
        Self::at(query, Local::now())
    }

    pub fn at(query: impl Into<String>, timestamp: DateTime<Local>) -> Self {
        Self {
            report: Report {
                query: query.into(),
                timestamp,
                papers: CategoryOutcome::default(),
                news: CategoryOutcome::default(),
                web: CategoryOutcome::default(),
                summary: Summary::default(),
                notices: Vec::new(),
            },
            written: Vec::new(),
        }
    }

    fn claim(&mut self, category: Category) -> bool {
        if self.written.contains(&category) {
            tracing::error!(%category, "category written twice; keeping first outcome");
            return false;
        }
        self.written.push(category);
        true
    }

    pub fn papers(&mut self, outcome: CategoryOutcome<Paper>) {
        if self.claim(Category::Papers) {
            self.report.summary.papers = outcome.total();
            self.report.notices.extend_from_slice(outcome.notices());
            self.report.papers = outcome;
        }
    }

    pub fn news(&mut self, outcome: CategoryOutcome<NewsItem>) {
        if self.claim(Category::News) {
            self.report.summary.news = outcome.total();
            self.report.notices.extend_from_slice(outcome.notices());
            self.report.news = outcome;
        }
    }

    pub fn web(&mut self, outcome: CategoryOutcome<WebResult>) {
        if self.claim(Category::Web) {
            self.report.summary.web = outcome.total();
            self.report.notices.extend_from_slice(outcome.notices());
            self.report.web = outcome;
        }
    }

    pub fn finish(self) -> Report {
        self.report
    }
}
