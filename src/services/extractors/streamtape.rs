use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;

use super::{force_scheme, ExtractContext, Extractor};
use crate::services::fetcher::FetchError;

lazy_static! {
    /// `document.getElementById('robotlink').innerHTML = '<a>' + ('<b>').substring(n)...;`
    static ref ROBOTLINK: Regex = Regex::new(
        r#"getElementById\(\s*['"]robotlink['"]\s*\)\.innerHTML\s*=\s*['"]([^'"]*)['"]\s*\+\s*\(?\s*['"]([^'"]*)['"]\s*\)?((?:\s*\.substring\(\s*\d+\s*\))*)"#
    )
    .unwrap();
    static ref SUBSTRING: Regex = Regex::new(r"\.substring\(\s*(\d+)\s*\)").unwrap();
    static ref GET_VIDEO: Regex = Regex::new(
        r#"(?:https?:)?//[^"'\s<>]*streamtape[^"'\s<>]*/get_video\?[^"'\s<>]+"#
    )
    .unwrap();
}

/// Streamtape splits its download link across two string literals
pub struct StreamtapeExtractor;

impl StreamtapeExtractor {
    /// Rebuild the `/get_video` link from the `robotlink` assignment
    fn from_robotlink(page: &str) -> Option<String> {
        let caps = ROBOTLINK.captures(page)?;
        let head = caps.get(1)?.as_str();
        let tail = caps.get(2)?.as_str();

        // Chained `.substring(n)` calls each drop n more leading characters
        let skip: usize = caps
            .get(3)
            .map(|m| {
                SUBSTRING
                    .captures_iter(m.as_str())
                    .filter_map(|c| c.get(1)?.as_str().parse::<usize>().ok())
                    .sum()
            })
            .unwrap_or(0);

        let tail: String = tail.chars().skip(skip).collect();
        let link = force_scheme(&format!("{}{}", head, tail).replace("&amp;", "&"));

        link.contains("/get_video").then_some(link)
    }

    fn from_page_text(page: &str) -> Option<String> {
        GET_VIDEO
            .find(page)
            .map(|m| force_scheme(&m.as_str().replace("&amp;", "&")))
    }
}

#[async_trait]
impl Extractor for StreamtapeExtractor {
    fn name(&self) -> &'static str {
        "streamtape"
    }

    async fn extract(
        &self,
        page: &str,
        _ctx: &ExtractContext<'_>,
    ) -> Result<Option<String>, FetchError> {
        Ok(Self::from_robotlink(page).or_else(|| Self::from_page_text(page)))
    }
}
