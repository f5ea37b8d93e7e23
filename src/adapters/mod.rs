//! Category adapters.
//!
//! An adapter owns the named sources of one category and turns a query into a
//! [`CategoryResult`]: one entry per enabled source, each either a result
//! sequence or a failure marker. A failing source never prevents its siblings
//! from running.
//!
//! | Category | Module | Sources |
//! |----------|--------|---------|
//! | papers | [`papers`] | `google_scholar`, `arxiv` |
//! | news | [`news`] | `google_news`, `university_news` |
//! | web | [`web`] | `general_search`, `news`, `academic`, `podcasts_interviews`, `social:<platform>` |

pub mod news;
pub mod papers;
pub mod web;

use crate::error::{CategoryError, ConfigError};
use crate::report::{Category, CategoryResult};
use crate::sources::{Query, Source};
use async_trait::async_trait;
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info, instrument};
use url::Url;

/// Runs every source of one category for a query.
#[async_trait]
pub trait Adapter<T>: Send + Sync {
    fn category(&self) -> Category;

    /// `limit` bounds each source, not the category total.
    async fn search_all(&self, query: &Query, limit: usize) -> Result<CategoryResult<T>, CategoryError>;
}

/// The standard adapter: an ordered list of uniquely named sources.
pub struct SourceAdapter<T> {
    category: Category,
    sources: Vec<Source<T>>,
}

impl<T: Send + 'static> SourceAdapter<T> {
    pub fn new(category: Category, sources: Vec<Source<T>>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        for source in &sources {
            if !seen.insert(source.name()) {
                return Err(ConfigError::invalid(
                    format!("{category}.sources"),
                    format!("duplicate source name '{}'", source.name()),
                ));
            }
        }
        let adapter = Self { category, sources };
        debug!(%category, sources = ?adapter.source_names().collect::<Vec<_>>(), "Adapter ready");
        Ok(adapter)
    }

    pub fn source_names(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|s| s.name())
    }
}

#[async_trait]
impl<T: Send + Sync + 'static> Adapter<T> for SourceAdapter<T> {
    fn category(&self) -> Category {
        self.category
    }

    #[instrument(level = "info", skip_all, fields(category = %self.category, name = %query.name, limit))]
    async fn search_all(&self, query: &Query, limit: usize) -> Result<CategoryResult<T>, CategoryError> {
        let t0 = Instant::now();
        let mut result = CategoryResult::new();
        for source in self.sources.iter().filter(|s| s.enabled_for(query)) {
            let (outcome, notices) = source.run(self.category, query, limit).await;
            if !result.insert(source.name(), outcome) {
                return Err(CategoryError::Internal(format!(
                    "source '{}' produced two outcomes",
                    source.name()
                )));
            }
            for notice in notices {
                result.push_notice(notice);
            }
        }
        info!(
            sources = result.len(),
            total = result.total(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Category search finished"
        );
        Ok(result)
    }
}

/// Parse a configured endpoint, naming the field on error.
pub(crate) fn endpoint(field: &str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::invalid(format!("endpoints.{field}"), e.to_string()))
}
