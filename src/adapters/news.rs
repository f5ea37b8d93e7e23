//! News: a news-search API (with a scrape fallback) and institution sites.

use super::{SourceAdapter, endpoint};
use crate::config::Config;
use crate::error::ConfigError;
use crate::http::Http;
use crate::models::NewsItem;
use crate::providers::google::GoogleNews;
use crate::providers::institutions::Institutions;
use crate::providers::serpapi::SerpApiNews;
use crate::report::Category;
use crate::retry::Retrying;
use crate::sources::Source;

pub const GOOGLE_NEWS: &str = "google_news";
pub const UNIVERSITY_NEWS: &str = "university_news";

pub fn build(config: &Config, http: &Http) -> Result<SourceAdapter<NewsItem>, ConfigError> {
    let serpapi = endpoint("serpapi", &config.endpoints.serpapi)?;
    let google = endpoint("google", &config.endpoints.google)?;

    SourceAdapter::new(
        Category::News,
        vec![
            Source::new(GOOGLE_NEWS)
                .provider(Retrying::from_config(
                    SerpApiNews::new(http.clone(), serpapi, config.credentials.serpapi_key.clone()),
                    config,
                ))
                .provider(GoogleNews::new(http.clone(), google)),
            Source::new(UNIVERSITY_NEWS).provider(Institutions::new(
                http.clone(),
                config.institutions.clone(),
                config.institution_concurrency,
            )),
        ],
    )
}
