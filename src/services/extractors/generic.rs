use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;

use super::{capture_first, ExtractContext, Extractor, BARE_MEDIA_URL};
use crate::services::fetcher::FetchError;
use crate::services::packer;

lazy_static! {
    static ref FILE_M3U8: Regex =
        Regex::new(r#"file['"]?\s*:\s*['"](https?://[^'"]+\.m3u8[^'"]*)['"]"#).unwrap();
    static ref SOURCE_M3U8: Regex =
        Regex::new(r#"source['"]?\s*:\s*['"](https?://[^'"]+\.m3u8[^'"]*)['"]"#).unwrap();
    static ref SRC_M3U8: Regex =
        Regex::new(r#"src['"]?\s*:\s*['"](https?://[^'"]+\.m3u8[^'"]*)['"]"#).unwrap();
    static ref FILE_MP4: Regex =
        Regex::new(r#"file['"]?\s*:\s*['"](https?://[^'"]+\.mp4[^'"]*)['"]"#).unwrap();
    static ref SOURCE_MP4: Regex =
        Regex::new(r#"source['"]?\s*:\s*['"](https?://[^'"]+\.mp4[^'"]*)['"]"#).unwrap();
    static ref SRC_MP4: Regex =
        Regex::new(r#"src['"]?\s*:\s*['"](https?://[^'"]+\.mp4[^'"]*)['"]"#).unwrap();
    static ref SOURCES_FILE: Regex =
        Regex::new(r#"sources\s*:\s*\[\s*\{\s*['"]?file['"]?\s*:\s*['"]([^'"]+)['"]"#).unwrap();
}

/// Ordered pattern cascade for hosters without a dedicated decoder
pub struct GenericExtractor;

impl GenericExtractor {
    fn find_stream(text: &str) -> Option<String> {
        capture_first(
            text,
            &[
                &*FILE_M3U8,
                &*SOURCE_M3U8,
                &*SRC_M3U8,
                &*FILE_MP4,
                &*SOURCE_MP4,
                &*SRC_MP4,
                &*SOURCES_FILE,
            ],
        )
        .or_else(|| BARE_MEDIA_URL.find(text).map(|m| m.as_str().to_string()))
    }
}

#[async_trait]
impl Extractor for GenericExtractor {
    fn name(&self) -> &'static str {
        "generic"
    }

    async fn extract(
        &self,
        page: &str,
        _ctx: &ExtractContext<'_>,
    ) -> Result<Option<String>, FetchError> {
        if let Some(url) = Self::find_stream(page) {
            return Ok(Some(url));
        }

        // StreamWish/FileLions-style players pack their setup too
        Ok(packer::unpack_scripts(page)
            .iter()
            .find_map(|script| Self::find_stream(script)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_m3u8_preferred_over_mp4() {
        let page = r#"setup({ file: "https://cdn.example/low.mp4", src: "https://cdn.example/master.m3u8" })"#;
        assert_eq!(
            GenericExtractor::find_stream(page).as_deref(),
            Some("https://cdn.example/master.m3u8")
        );
    }

    #[test]
    fn test_source_key() {
        let page = r#"{"source": "https://cdn.example/v.mp4"}"#;
        assert_eq!(GenericExtractor::find_stream(page).as_deref(), Some("https://cdn.example/v.mp4"));
    }

    #[test]
    fn test_sources_array_without_extension() {
        let page = r#"sources: [{file: "https://cdn.example/stream/abc"}]"#;
        assert_eq!(
            GenericExtractor::find_stream(page).as_deref(),
            Some("https://cdn.example/stream/abc")
        );
    }

    #[test]
    fn test_bare_url() {
        let page = r#"<a href="https://cdn.example/dl/video.mp4?k=1">Download</a>"#;
        assert_eq!(
            GenericExtractor::find_stream(page).as_deref(),
            Some("https://cdn.example/dl/video.mp4?k=1")
        );
        assert_eq!(GenericExtractor::find_stream("<p>nothing</p>"), None);
    }
}
