//! Web: Tavily searches with different keyword sets, each falling back to a
//! basic Google scrape with the same keywords.

use super::{SourceAdapter, endpoint};
use crate::config::Config;
use crate::error::ConfigError;
use crate::http::Http;
use crate::models::WebResult;
use crate::providers::google::GoogleWeb;
use crate::providers::tavily::Tavily;
use crate::report::Category;
use crate::retry::Retrying;
use crate::sources::Source;
use url::Url;

pub const GENERAL_SEARCH: &str = "general_search";
pub const NEWS: &str = "news";
pub const ACADEMIC: &str = "academic";
pub const PODCASTS_INTERVIEWS: &str = "podcasts_interviews";

const NEWS_KEYWORDS: &str = "news OR article OR featured";
const ACADEMIC_KEYWORDS: &str = "research OR paper OR publication OR scholar OR university";
const PODCAST_KEYWORDS: &str = "podcast OR interview OR talk OR guest OR speaker";

/// Source key for one social platform.
pub fn social_key(platform: &str) -> String {
    format!("social:{platform}")
}

struct Clients<'a> {
    config: &'a Config,
    http: &'a Http,
    tavily: Url,
    google: Url,
}

impl Clients<'_> {
    fn tavily(&self) -> Tavily {
        Tavily::new(
            self.http.clone(),
            self.tavily.clone(),
            self.config.credentials.tavily_api_key.clone(),
        )
    }

    fn google(&self) -> GoogleWeb {
        GoogleWeb::new(self.http.clone(), self.google.clone())
    }

    /// Tavily with retries, then the scrape, both with the same keywords.
    fn chain(&self, name: impl Into<String>, tavily: Tavily, google: GoogleWeb) -> Source<WebResult> {
        Source::new(name)
            .provider(Retrying::from_config(tavily, self.config))
            .provider(google)
    }
}

pub fn build(config: &Config, http: &Http) -> Result<SourceAdapter<WebResult>, ConfigError> {
    let ep = Clients {
        config,
        http,
        tavily: endpoint("tavily", &config.endpoints.tavily)?,
        google: endpoint("google", &config.endpoints.google)?,
    };
    let caps = &config.caps;

    let mut sources = vec![
        ep.chain(GENERAL_SEARCH, ep.tavily(), ep.google()),
        ep.chain(NEWS, ep.tavily().news().keywords(NEWS_KEYWORDS), ep.google().keywords(NEWS_KEYWORDS))
            .cap(caps.web_news),
        ep.chain(ACADEMIC, ep.tavily().keywords(ACADEMIC_KEYWORDS), ep.google().keywords(ACADEMIC_KEYWORDS))
            .cap(caps.web_academic),
        ep.chain(
            PODCASTS_INTERVIEWS,
            ep.tavily().keywords(PODCAST_KEYWORDS),
            ep.google().keywords(PODCAST_KEYWORDS),
        )
        .cap(caps.web_podcasts),
    ];

    for platform in &config.social_platforms {
        let site = format!("site:{platform}");
        sources.push(
            ep.chain(social_key(platform), ep.tavily().keywords(&site), ep.google().keywords(&site))
                .cap(caps.social)
                .social(),
        );
    }

    SourceAdapter::new(Category::Web, sources)
}
