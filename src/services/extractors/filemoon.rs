use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use super::{capture_first, ExtractContext, Extractor};
use crate::services::fetcher::FetchError;
use crate::services::packer;

lazy_static! {
    static ref SOURCES_FILE: Regex = Regex::new(
        r#"sources\s*:\s*\[\s*\{\s*["']?file["']?\s*:\s*["']([^"']+\.(?:m3u8|mp4)[^"']*)["']"#
    )
    .unwrap();
    static ref FILE_FIELD: Regex =
        Regex::new(r#"["']?file["']?\s*:\s*["']([^"']+\.(?:m3u8|mp4)[^"']*)["']"#).unwrap();
}

/// Filemoon hides its player setup behind P.A.C.K.E.R.
pub struct FilemoonExtractor;

impl FilemoonExtractor {
    fn find_file(text: &str) -> Option<String> {
        capture_first(text, &[&*SOURCES_FILE, &*FILE_FIELD])
    }
}

#[async_trait]
impl Extractor for FilemoonExtractor {
    fn name(&self) -> &'static str {
        "filemoon"
    }

    async fn extract(
        &self,
        page: &str,
        ctx: &ExtractContext<'_>,
    ) -> Result<Option<String>, FetchError> {
        for script in packer::unpack_scripts(page) {
            if let Some(url) = Self::find_file(&script) {
                return Ok(Some(url));
            }
        }

        debug!("No packed player setup on {} (via {})", ctx.embed_url, ctx.referer);
        Ok(Self::find_file(page))
    }
}
