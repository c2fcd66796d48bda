use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;

use super::{capture_first, decode_base64_lossy, ExtractContext, Extractor, BARE_MEDIA_URL};
use crate::services::fetcher::FetchError;

lazy_static! {
    static ref DIRECT_M3U8: Regex =
        Regex::new(r#"(?:file|src)['"]?\s*:\s*['"](https?://[^'"]+\.m3u8[^'"]*)['"]"#).unwrap();
    static ref ATOB: Regex = Regex::new(r#"atob\(\s*['"]([A-Za-z0-9+/=_-]+)['"]\s*\)"#).unwrap();
    static ref PLAYER_SRC: Regex =
        Regex::new(r#"player\.src\(\s*\{\s*src\s*:\s*['"]([^'"]+)['"]"#).unwrap();
}

/// Netu (hqq) exposes the playlist directly, base64-wrapped, or via `player.src`
pub struct NetuExtractor;

impl NetuExtractor {
    fn from_atob(page: &str) -> Option<String> {
        ATOB.captures_iter(page)
            .filter_map(|c| c.get(1))
            .filter_map(|m| decode_base64_lossy(m.as_str()))
            .find_map(|decoded| {
                let decoded = decoded.trim();
                if decoded.starts_with("http") && (decoded.contains(".m3u8") || decoded.contains(".mp4")) {
                    return Some(decoded.to_string());
                }
                BARE_MEDIA_URL.find(decoded).map(|m| m.as_str().to_string())
            })
    }

    fn find_stream(page: &str) -> Option<String> {
        capture_first(page, &[&*DIRECT_M3U8])
            .or_else(|| Self::from_atob(page))
            .or_else(|| capture_first(page, &[&*PLAYER_SRC]))
    }
}

#[async_trait]
impl Extractor for NetuExtractor {
    fn name(&self) -> &'static str {
        "netu"
    }

    async fn extract(
        &self,
        page: &str,
        _ctx: &ExtractContext<'_>,
    ) -> Result<Option<String>, FetchError> {
        Ok(Self::find_stream(page))
    }
}
