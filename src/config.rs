//! Search configuration.
//!
//! A single [`Config`] value is built in `main` (optional YAML file, then CLI and
//! environment credentials) and handed to the aggregator. Nothing below the
//! aggregator reads the environment. Every field has a default, so an empty or
//! absent file yields a working configuration.
//!
//! ```yaml
//! request_timeout_secs: 10
//! politeness_interval_ms: 1000
//! institutions:
//!   columbia: "https://news.columbia.edu/?s="
//!   mit: "https://news.mit.edu/search/"
//! social_platforms: ["medium.com", "reddit.com"]
//! ```

use crate::error::ConfigError;
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Pacing below this is not polite enough for scraped hosts.
pub const MIN_POLITENESS_INTERVAL_MS: u64 = 500;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Per-request transport timeout.
    pub request_timeout_secs: u64,
    /// Minimum spacing between two requests to the same host.
    pub politeness_interval_ms: u64,
    /// How many institution sites are fetched at once when no hint is given.
    pub institution_concurrency: usize,
    pub user_agent: String,
    pub retry: RetryConfig,
    pub endpoints: Endpoints,
    /// Institution name (lowercase) to news-search URL prefix; the encoded
    /// person name is appended.
    pub institutions: IndexMap<String, String>,
    pub social_platforms: Vec<String>,
    pub caps: SourceCaps,
    #[serde(skip)]
    pub credentials: Credentials,
}

impl Default for Config {
    fn default() -> Self {
        let institutions = [
            ("columbia", "https://news.columbia.edu/?s="),
            ("mit", "https://news.mit.edu/search/"),
            ("stanford", "https://news.stanford.edu/search/"),
            ("harvard", "https://news.harvard.edu/gazette/?s="),
            ("yale", "https://news.yale.edu/search/"),
            ("princeton", "https://www.princeton.edu/search?q="),
            ("cornell", "https://news.cornell.edu/?s="),
            ("upenn", "https://penntoday.upenn.edu/?s="),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            request_timeout_secs: 10,
            politeness_interval_ms: 1000,
            institution_concurrency: 4,
            user_agent: BROWSER_USER_AGENT.to_string(),
            retry: RetryConfig::default(),
            endpoints: Endpoints::default(),
            institutions,
            social_platforms: ["medium.com", "dev.to", "stackoverflow.com", "reddit.com", "youtube.com"]
                .into_iter()
                .map(String::from)
                .collect(),
            caps: SourceCaps::default(),
            credentials: Credentials::default(),
        }
    }
}

/// Retry policy for credentialed API providers.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub arxiv: String,
    pub scholar: String,
    pub google: String,
    pub tavily: String,
    pub serpapi: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            arxiv: "http://export.arxiv.org/api/query".to_string(),
            scholar: "https://scholar.google.com".to_string(),
            google: "https://www.google.com/search".to_string(),
            tavily: "https://api.tavily.com/search".to_string(),
            serpapi: "https://serpapi.com/search.json".to_string(),
        }
    }
}

/// Upper bounds applied on top of the caller's per-source limit.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceCaps {
    pub web_news: usize,
    pub web_academic: usize,
    pub web_podcasts: usize,
    pub social: usize,
}

impl Default for SourceCaps {
    fn default() -> Self {
        Self {
            web_news: 5,
            web_academic: 5,
            web_podcasts: 5,
            social: 3,
        }
    }
}

/// Optional API keys. Absent keys put the affected sources in degraded mode.
#[derive(Clone, Default)]
pub struct Credentials {
    pub tavily_api_key: Option<String>,
    pub serpapi_key: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = |k: &Option<String>| k.as_ref().map(|_| "<set>").unwrap_or("<unset>");
        f.debug_struct("Credentials")
            .field("tavily_api_key", &mask(&self.tavily_api_key))
            .field("serpapi_key", &mask(&self.serpapi_key))
            .finish()
    }
}

impl Config {
    /// Load from a YAML file, or defaults when no path is given.
    #[instrument(level = "info")]
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            info!("No config file given; using defaults");
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        let config = Self::from_yaml(&raw)?;
        info!(path, "Loaded configuration");
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn politeness_interval(&self) -> Duration {
        Duration::from_millis(self.politeness_interval_ms)
    }

    /// Reject configurations that cannot produce a sensible run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::invalid("request_timeout_secs", "must be greater than 0"));
        }
        if self.politeness_interval_ms < MIN_POLITENESS_INTERVAL_MS {
            return Err(ConfigError::invalid(
                "politeness_interval_ms",
                format!("must be at least {MIN_POLITENESS_INTERVAL_MS}"),
            ));
        }
        if self.institution_concurrency == 0 {
            return Err(ConfigError::invalid("institution_concurrency", "must be greater than 0"));
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::invalid("user_agent", "must not be empty"));
        }

        for (field, value) in [
            ("endpoints.arxiv", &self.endpoints.arxiv),
            ("endpoints.scholar", &self.endpoints.scholar),
            ("endpoints.google", &self.endpoints.google),
            ("endpoints.tavily", &self.endpoints.tavily),
            ("endpoints.serpapi", &self.endpoints.serpapi),
        ] {
            check_url(field, value)?;
        }

        for (name, prefix) in &self.institutions {
            if name.trim().is_empty() || *name != name.to_lowercase() {
                return Err(ConfigError::invalid(
                    "institutions",
                    format!("institution key `{name}` must be non-empty lowercase"),
                ));
            }
            check_url(&format!("institutions.{name}"), prefix)?;
        }

        let mut seen = HashSet::new();
        for platform in &self.social_platforms {
            if platform.trim().is_empty() || platform.contains(char::is_whitespace) {
                return Err(ConfigError::invalid(
                    "social_platforms",
                    format!("`{platform}` is not a domain"),
                ));
            }
            if !seen.insert(platform.to_lowercase()) {
                return Err(ConfigError::invalid(
                    "social_platforms",
                    format!("`{platform}` is listed twice"),
                ));
            }
        }

        let caps = &self.caps;
        if [caps.web_news, caps.web_academic, caps.web_podcasts, caps.social].contains(&0) {
            return Err(ConfigError::invalid("caps", "every cap must be at least 1"));
        }
        Ok(())
    }
}

fn check_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let parsed = Url::parse(value).map_err(|e| ConfigError::invalid(field, e.to_string()))?;
    if parsed.host_str().is_none() {
        return Err(ConfigError::invalid(field, "URL has no host"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.institutions.len(), 8);
        assert_eq!(config.institutions.get_index(0).unwrap().0, "columbia");
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml(
            r#"
politeness_interval_ms: 750
institutions:
  mit: "https://news.mit.edu/search/"
"#,
        )
        .unwrap();
        assert_eq!(config.politeness_interval_ms, 750);
        assert_eq!(config.institutions.len(), 1);
        assert_eq!(config.request_timeout_secs, 10);
        assert_eq!(config.social_platforms.len(), 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config = Config::from_yaml("  \n").unwrap();
        assert_eq!(config.politeness_interval_ms, 1000);
    }

    #[test]
    fn test_malformed_yaml_is_rejected() {
        assert!(matches!(
            Config::from_yaml("request_timeout_secs: [oops"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn test_validate_rejects_fast_pacing() {
        let config = Config {
            politeness_interval_ms: 100,
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("politeness_interval_ms"));
    }

    #[test]
    fn test_validate_rejects_bad_institution_url() {
        let mut config = Config::default();
        config
            .institutions
            .insert("nowhere".to_string(), "not a url".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("institutions.nowhere"));
    }

    #[test]
    fn test_validate_rejects_duplicate_platform() {
        let mut config = Config::default();
        config.social_platforms.push("Reddit.com".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_credentials_debug_masks_keys() {
        let creds = Credentials {
            tavily_api_key: Some("tvly-secret".to_string()),
            serpapi_key: None,
        };
        let shown = format!("{creds:?}");
        assert!(!shown.contains("tvly-secret"));
        assert!(shown.contains("<set>"));
        assert!(shown.contains("<unset>"));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        assert!(matches!(
            Config::load(Some("/definitely/not/here.yaml")),
            Err(ConfigError::Read { .. })
        ));
    }
}
