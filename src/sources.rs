//! Providers, sources and fallback chains.
//!
//! - A [`Provider`] is one concrete way of fetching results (a typed API client,
//!   an HTML scrape, a feed). It returns normalized records or a [`SourceError`].
//! - A [`Source`] is a named entry in a category's results. It owns an ordered
//!   list of providers and tries them in turn: the first success wins, and every
//!   failure before it is kept for diagnostics.
//!
//! A provider that lacks its credential fails with
//! [`SourceError::MissingCredential`]. The chain then moves on to the next,
//! weaker provider and records a degraded notice. This is not a failure.

use crate::error::SourceError;
use crate::report::{Category, Failure, Notice, NoticeKind, SourceOutcome};
use async_trait::async_trait;
use tracing::{info, instrument, warn};

/// The person being searched for, plus the hints providers may use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub name: String,
    /// Institution hint for the news adapter's site scan.
    pub affiliation: Option<String>,
    pub include_social: bool,
}

impl Query {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            affiliation: None,
            include_social: false,
        }
    }

    /// The name in double quotes, to bias engines toward exact matches.
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.name)
    }

    /// The quoted name followed by extra keywords.
    pub fn quoted_with(&self, keywords: Option<&str>) -> String {
        match keywords {
            Some(k) if !k.trim().is_empty() => format!("{} {}", self.quoted(), k.trim()),
            _ => self.quoted(),
        }
    }
}

/// Records from one successful provider call, plus advisories worth surfacing.
#[derive(Debug, Clone, PartialEq)]
pub struct Retrieval<T> {
    pub hits: Vec<T>,
    pub advisories: Vec<String>,
}

impl<T> Retrieval<T> {
    pub fn hits(hits: Vec<T>) -> Self {
        Self {
            hits,
            advisories: Vec::new(),
        }
    }

    /// Nothing was searched, for a reason the caller should see.
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            hits: Vec::new(),
            advisories: vec![reason.into()],
        }
    }

    pub fn with_advisory(mut self, advisory: impl Into<String>) -> Self {
        self.advisories.push(advisory.into());
        self
    }
}

/// One concrete retrieval strategy.
#[async_trait]
pub trait Provider<T>: Send + Sync {
    /// Short label used in diagnostics and as the records' `source_label`.
    fn name(&self) -> &str;

    async fn search(&self, query: &Query, limit: usize) -> Result<Retrieval<T>, SourceError>;
}

/// A named result slot backed by an ordered provider chain.
pub struct Source<T> {
    name: String,
    cap: Option<usize>,
    social: bool,
    providers: Vec<Box<dyn Provider<T>>>,
}

impl<T: Send + 'static> Source<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cap: None,
            social: false,
            providers: Vec::new(),
        }
    }

    /// Append a provider to the chain; earlier providers are preferred.
    pub fn provider(mut self, provider: impl Provider<T> + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Never return more than `cap` results, whatever the caller's limit.
    pub fn cap(mut self, cap: usize) -> Self {
        self.cap = Some(cap);
        self
    }

    /// Only run when the query asks for social platforms.
    pub fn social(mut self) -> Self {
        self.social = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn enabled_for(&self, query: &Query) -> bool {
        !self.social || query.include_social
    }

    pub fn effective_limit(&self, limit: usize) -> usize {
        self.cap.map_or(limit, |cap| cap.min(limit))
    }

    /// Try each provider in order and settle this source's outcome.
    #[instrument(level = "info", skip_all, fields(%category, source = %self.name))]
    pub async fn run(
        &self,
        category: Category,
        query: &Query,
        limit: usize,
    ) -> (SourceOutcome<T>, Vec<Notice>) {
        let limit = self.effective_limit(limit);
        let mut notices = Vec::new();
        let mut attempts: Vec<String> = Vec::new();
        let mut skipped: Vec<String> = Vec::new();

        for provider in &self.providers {
            match provider.search(query, limit).await {
                Ok(retrieval) => {
                    if !attempts.is_empty() {
                        let message = format!(
                            "{}; used {}",
                            attempts.join("; "),
                            provider.name()
                        );
                        warn!(provider = provider.name(), %message, "Degraded result path");
                        notices.push(self.notice(category, NoticeKind::Degraded, message));
                    }
                    for advisory in retrieval.advisories {
                        warn!(provider = provider.name(), %advisory, "Advisory");
                        notices.push(self.notice(category, NoticeKind::Advisory, advisory));
                    }
                    let mut hits = retrieval.hits;
                    hits.truncate(limit);
                    info!(provider = provider.name(), count = hits.len(), "Source completed");
                    return (SourceOutcome::Results(hits), notices);
                }
                Err(SourceError::MissingCredential { credential }) => {
                    info!(provider = provider.name(), credential, "Credential absent; trying next provider");
                    let message = format!("{} skipped ({credential} not set)", provider.name());
                    skipped.push(message.clone());
                    attempts.push(message);
                }
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "Provider failed");
                    attempts.push(format!("{}: {e}", provider.name()));
                }
            }
        }

        if !attempts.is_empty() && skipped.len() == attempts.len() {
            // Nothing failed; there was simply no usable access path.
            let message = attempts.join("; ");
            warn!(%message, "No credentialed provider available; returning no results");
            notices.push(self.notice(category, NoticeKind::Degraded, message));
            return (SourceOutcome::Results(Vec::new()), notices);
        }

        if !skipped.is_empty() {
            notices.push(self.notice(category, NoticeKind::Degraded, skipped.join("; ")));
        }

        let error = if attempts.is_empty() {
            "no providers configured".to_string()
        } else if attempts.len() == 1 {
            attempts.remove(0)
        } else {
            SourceError::Exhausted { attempts }.to_string()
        };
        warn!(%error, "Source failed");
        (SourceOutcome::Failure(Failure::new(error)), notices)
    }

    fn notice(&self, category: Category, kind: NoticeKind, message: String) -> Notice {
        Notice {
            category,
            source: self.name.clone(),
            kind,
            message,
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Deterministic providers for tests.

    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub enum Behavior<T> {
        Hits(Vec<T>),
        Skip(String),
        Fail(fn() -> SourceError),
    }

    pub struct StubProvider<T> {
        pub name: String,
        pub behavior: Behavior<T>,
        pub calls: Arc<AtomicUsize>,
    }

    impl<T> StubProvider<T> {
        pub fn hits(name: &str, hits: Vec<T>) -> Self {
            Self::with(name, Behavior::Hits(hits))
        }

        pub fn failing(name: &str, error: fn() -> SourceError) -> Self {
            Self::with(name, Behavior::Fail(error))
        }

        pub fn skipping(name: &str, reason: &str) -> Self {
            Self::with(name, Behavior::Skip(reason.to_string()))
        }

        fn with(name: &str, behavior: Behavior<T>) -> Self {
            Self {
                name: name.to_string(),
                behavior,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn calls(&self) -> Arc<AtomicUsize> {
            Arc::clone(&self.calls)
        }
    }

    #[async_trait]
    impl<T: Clone + Send + Sync + 'static> Provider<T> for StubProvider<T> {
        fn name(&self) -> &str {
            &self.name
        }

        async fn search(&self, _query: &Query, limit: usize) -> Result<Retrieval<T>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                Behavior::Hits(hits) => Ok(Retrieval::hits(hits.iter().take(limit).cloned().collect())),
                Behavior::Skip(reason) => Ok(Retrieval::skipped(reason.clone())),
                Behavior::Fail(error) => Err(error()),
            }
        }
    }
}
