//! Papers: Google Scholar and arXiv.

use super::{SourceAdapter, endpoint};
use crate::config::Config;
use crate::error::ConfigError;
use crate::http::Http;
use crate::models::Paper;
use crate::providers::arxiv::Arxiv;
use crate::providers::scholar::{ScholarProfile, ScholarSearch};
use crate::report::Category;
use crate::sources::Source;

pub const GOOGLE_SCHOLAR: &str = "google_scholar";
pub const ARXIV: &str = "arxiv";

/// Scholar tries the author profile first and falls back to a publication
/// search when no profile matches.
pub fn build(config: &Config, http: &Http) -> Result<SourceAdapter<Paper>, ConfigError> {
    let scholar = endpoint("scholar", &config.endpoints.scholar)?;
    let arxiv = endpoint("arxiv", &config.endpoints.arxiv)?;

    SourceAdapter::new(
        Category::Papers,
        vec![
            Source::new(GOOGLE_SCHOLAR)
                .provider(ScholarProfile::new(http.clone(), scholar.clone()))
                .provider(ScholarSearch::new(http.clone(), scholar)),
            Source::new(ARXIV).provider(Arxiv::new(http.clone(), arxiv)),
        ],
    )
}
