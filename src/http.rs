//! Shared HTTP access for all providers.
//!
//! One [`reqwest::Client`] (timeout and user agent from [`Config`]) is wrapped
//! together with the per-host [`Pacer`]. Providers never talk to `reqwest`
//! directly, so every request is paced and every non-success status maps to the
//! same [`SourceError`] variants.

use crate::config::Config;
use crate::error::{ConfigError, SourceError};
use crate::pacing::Pacer;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Instant;
use tracing::{debug, instrument, warn};
use url::Url;

#[derive(Debug, Clone)]
pub struct Http {
    client: Client,
    pacer: Pacer,
}

impl Http {
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ConfigError::invalid("http client", e.to_string()))?;
        Ok(Self {
            client,
            pacer: Pacer::new(config.politeness_interval())?,
        })
    }

    /// GET a page or feed and return its body as text.
    #[instrument(level = "debug", skip_all, fields(url = %url))]
    pub async fn get_text(&self, url: &Url) -> Result<String, SourceError> {
        self.pace(url).await;
        let t0 = Instant::now();
        let response = self.client.get(url.clone()).send().await.map_err(reqwest::Error::without_url)?;
        let response = check_status(url, response)?;
        let body = response.text().await.map_err(reqwest::Error::without_url)?;
        debug!(bytes = body.len(), elapsed_ms = t0.elapsed().as_millis() as u64, "Fetched");
        Ok(body)
    }

    /// GET a JSON API.
    #[instrument(level = "debug", skip_all, fields(host = url.host_str().unwrap_or_default()))]
    pub async fn get_json<R: DeserializeOwned>(&self, url: &Url) -> Result<R, SourceError> {
        self.pace(url).await;
        let response = self.client.get(url.clone()).send().await.map_err(reqwest::Error::without_url)?;
        let response = check_status(url, response)?;
        let body = response.text().await.map_err(reqwest::Error::without_url)?;
        Ok(serde_json::from_str(&body)?)
    }

    /// POST a JSON body to an API and decode the JSON answer.
    #[instrument(level = "debug", skip_all, fields(url = %url))]
    pub async fn post_json<B, R>(&self, url: &Url, body: &B) -> Result<R, SourceError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        self.pace(url).await;
        let response = self.client.post(url.clone()).json(body).send().await.map_err(reqwest::Error::without_url)?;
        let response = check_status(url, response)?;
        let body = response.text().await.map_err(reqwest::Error::without_url)?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn pace(&self, url: &Url) {
        if let Some(host) = url.host_str() {
            self.pacer.wait(host).await;
        }
    }
}

fn check_status(url: &Url, response: Response) -> Result<Response, SourceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let host = url.host_str().unwrap_or_default().to_string();
    warn!(%host, status = status.as_u16(), "Request rejected");
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(SourceError::RateLimited { host });
    }
    Err(SourceError::Status {
        status: status.as_u16(),
        // Query strings may carry API keys.
        url: redact(url),
    })
}

/// Scheme, host and path only.
pub fn redact(url: &Url) -> String {
    format!(
        "{}://{}{}",
        url.scheme(),
        url.host_str().unwrap_or_default(),
        url.path()
    )
}
