//! HTTP access to the episode site and the third-party hosters.
//!
//! Every request carries the same browser-like header set; the referrer is
//! overridden per stage.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, REFERER, USER_AGENT};
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;

/// Transport-level failure; callers degrade it to "nothing found"
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error: {0}")]
    Status(u16),
    #[error("parse error: {0}")]
    Parse(String),
}

/// Shared HTTP client with the site's fixed header set
#[derive(Clone)]
pub struct SiteFetcher {
    http: Client,
    base_url: String,
    user_agent: String,
    accept_language: String,
}

impl SiteFetcher {
    /// Create a new fetcher from config
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let mut defaults = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&config.accept_language) {
            defaults.insert(ACCEPT_LANGUAGE, value);
        }

        let http = Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(defaults)
            .timeout(Duration::from_millis(config.fetch_timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(10))
            .gzip(true)
            .build()?;

        Ok(Self {
            http,
            base_url: config.site_base_url.clone(),
            user_agent: config.user_agent.clone(),
            accept_language: config.accept_language.clone(),
        })
    }

    /// Site root, without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Header set reported back to callers so they can replay the requests
    pub fn request_headers(&self) -> HashMap<String, String> {
        HashMap::from([
            (USER_AGENT.as_str().to_string(), self.user_agent.clone()),
            (REFERER.as_str().to_string(), format!("{}/", self.base_url)),
            (ACCEPT_LANGUAGE.as_str().to_string(), self.accept_language.clone()),
        ])
    }

    /// GET a page as text. `referer` defaults to the site root.
    pub async fn get_text(&self, url: &str, referer: Option<&str>) -> Result<String, FetchError> {
        let referer = referer
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}/", self.base_url));

        debug!("GET {} (referer {})", url, referer);

        let response = self.http.get(url).header(REFERER, referer).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }

    /// GET and parse a JSON body
    pub async fn get_json(
        &self,
        url: &str,
        referer: Option<&str>,
    ) -> Result<serde_json::Value, FetchError> {
        let text = self.get_text(url, referer).await?;
        serde_json::from_str(&text).map_err(|e| {
            let preview: String = text.chars().take(500).collect();
            debug!("Response text: {}", preview);
            FetchError::Parse(e.to_string())
        })
    }
}
