use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use super::{decode_base64_lossy, ExtractContext, Extractor, BARE_MEDIA_URL};
use crate::services::fetcher::FetchError;

/// Real player pages are far larger than this; anything smaller is a shell
const MIN_PLAYER_PAGE_LEN: usize = 500;

lazy_static! {
    static ref JS_REDIRECT: Regex = Regex::new(
        r#"(?:window\.)?location(?:\.href)?\s*=\s*['"]([^'"]+)['"]"#
    )
    .unwrap();
    static ref HLS_FIELD: Regex =
        Regex::new(r#"['"]?hls['"]?\s*:\s*['"]([^'"]+)['"]"#).unwrap();
    static ref MP4_FIELD: Regex =
        Regex::new(r#"['"]?mp4['"]?\s*:\s*['"]([^'"]+)['"]"#).unwrap();
    static ref REFRESH_URL: Regex = Regex::new(r"(?i)url\s*=\s*['\x22]?([^'\x22;\s]+)").unwrap();
}

/// Voe serves a redirect shell first, then a player with `hls`/`mp4` fields
pub struct VoeExtractor;

impl VoeExtractor {
    fn is_redirect_shell(page: &str) -> bool {
        let lower = page.to_lowercase();
        page.len() < MIN_PLAYER_PAGE_LEN
            || lower.contains("window.location")
            || lower.contains("http-equiv=\"refresh\"")
            || lower.contains("http-equiv='refresh'")
    }

    /// Target of a meta refresh or a JS location assignment
    fn redirect_target(page: &str) -> Option<String> {
        let document = Html::parse_document(page);
        if let Ok(selector) = Selector::parse("meta[http-equiv]") {
            let refresh = document
                .select(&selector)
                .filter(|meta| {
                    meta.value()
                        .attr("http-equiv")
                        .is_some_and(|v| v.eq_ignore_ascii_case("refresh"))
                })
                .filter_map(|meta| meta.value().attr("content"))
                .find_map(|content| {
                    REFRESH_URL
                        .captures(content)
                        .and_then(|c| c.get(1))
                        .map(|m| m.as_str().to_string())
                });
            if refresh.is_some() {
                return refresh;
            }
        }

        JS_REDIRECT
            .captures(page)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// A field value that is either an absolute URL or base64 of one
    fn media_value(raw: &str) -> Option<String> {
        if raw.starts_with("http://") || raw.starts_with("https://") {
            return Some(raw.to_string());
        }
        decode_base64_lossy(raw)
            .map(|decoded| decoded.trim().to_string())
            .filter(|decoded| decoded.starts_with("http"))
    }

    fn find_stream(page: &str) -> Option<String> {
        let field = |re: &Regex| {
            re.captures_iter(page)
                .filter_map(|c| c.get(1))
                .find_map(|m| Self::media_value(m.as_str()))
        };

        field(&*HLS_FIELD)
            .or_else(|| field(&*MP4_FIELD))
            .or_else(|| BARE_MEDIA_URL.find(page).map(|m| m.as_str().to_string()))
    }
}

#[async_trait]
impl Extractor for VoeExtractor {
    fn name(&self) -> &'static str {
        "voe"
    }

    async fn extract(
        &self,
        page: &str,
        ctx: &ExtractContext<'_>,
    ) -> Result<Option<String>, FetchError> {
        let target = if Self::is_redirect_shell(page) {
            Self::redirect_target(page)
        } else {
            None
        };

        let Some(target) = target else {
            return Ok(Self::find_stream(page));
        };

        let target = Url::parse(ctx.embed_url)
            .and_then(|base| base.join(&target))
            .map(|u| u.to_string())
            .map_err(|e| FetchError::Parse(e.to_string()))?;

        debug!("Following Voe redirect to {}", target);
        let player = ctx.fetcher.get_text(&target, Some(ctx.embed_url)).await?;

        Ok(Self::find_stream(&player))
    }
}
