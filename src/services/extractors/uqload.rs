use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;

use super::{capture_first, ExtractContext, Extractor};
use crate::services::fetcher::FetchError;

lazy_static! {
    static ref SINGLE_SOURCE: Regex =
        Regex::new(r#"sources\s*:\s*\[\s*['"]([^'"]+)['"]\s*\]"#).unwrap();
    static ref FILE_MP4: Regex =
        Regex::new(r#"(?:file|src)['"]?\s*:\s*['"](https?://[^'"]+\.mp4[^'"]*)['"]"#).unwrap();
}

/// Uqload lists a single progressive MP4
pub struct UqloadExtractor;

#[async_trait]
impl Extractor for UqloadExtractor {
    fn name(&self) -> &'static str {
        "uqload"
    }

    async fn extract(
        &self,
        page: &str,
        _ctx: &ExtractContext<'_>,
    ) -> Result<Option<String>, FetchError> {
        Ok(capture_first(page, &[&*SINGLE_SOURCE, &*FILE_MP4]))
    }
}
