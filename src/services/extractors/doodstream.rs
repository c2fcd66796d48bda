use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;
use url::Url;

use super::{ExtractContext, Extractor};
use crate::services::fetcher::FetchError;

const RANDOM_SUFFIX_LEN: usize = 10;

lazy_static! {
    static ref PASS_MD5: Regex = Regex::new(r#"/pass_md5/[^'"\s<>]+"#).unwrap();
}

/// Doodstream hands out a URL prefix through `/pass_md5/...`; the client
/// completes it with a random suffix, the token and an expiry.
pub struct DoodstreamExtractor;

impl DoodstreamExtractor {
    fn pass_path(page: &str) -> Option<&str> {
        PASS_MD5.find(page).map(|m| m.as_str())
    }

    /// Token is the last path segment of the pass path
    fn token(pass_path: &str) -> Option<&str> {
        pass_path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|t| !t.is_empty())
    }

    /// Lowercase hex taken from a v4 UUID, so always alphanumeric
    fn random_suffix() -> String {
        uuid::Uuid::new_v4()
            .simple()
            .to_string()
            .chars()
            .take(RANDOM_SUFFIX_LEN)
            .collect()
    }

    fn signed_url(prefix: &str, suffix: &str, token: &str, expiry_ms: i64) -> String {
        format!("{}{}?token={}&expiry={}", prefix, suffix, token, expiry_ms)
    }
}

#[async_trait]
impl Extractor for DoodstreamExtractor {
    fn name(&self) -> &'static str {
        "doodstream"
    }

    async fn extract(
        &self,
        page: &str,
        ctx: &ExtractContext<'_>,
    ) -> Result<Option<String>, FetchError> {
        let Some(pass_path) = Self::pass_path(page) else {
            return Ok(None);
        };
        let Some(token) = Self::token(pass_path) else {
            return Ok(None);
        };

        let pass_url = Url::parse(ctx.embed_url)
            .and_then(|base| base.join(pass_path))
            .map_err(|e| FetchError::Parse(e.to_string()))?;

        debug!("Doodstream pass request {}", pass_url);
        let body = ctx.fetcher.get_text(pass_url.as_str(), Some(ctx.embed_url)).await?;
        let prefix = body.trim();
        if !prefix.starts_with("http") {
            return Ok(None);
        }

        Ok(Some(Self::signed_url(
            prefix,
            &Self::random_suffix(),
            token,
            chrono::Utc::now().timestamp_millis(),
        )))
    }
}
