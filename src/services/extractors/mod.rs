//! Provider extractors
//!
//! One decoder per known hoster, all behind the same capability: given the
//! fetched embed page and its context, produce a direct stream URL or nothing.
//! Unknown hosters fall through to a generic regex cascade.
//!
//! Adding a hoster means writing an [`Extractor`] and adding it to the
//! registry below.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

use crate::services::classifier::ProviderName;
use crate::services::fetcher::{FetchError, SiteFetcher};

mod doodstream;
mod filemoon;
mod generic;
mod netu;
mod streamtape;
mod uqload;
mod voe;

use doodstream::DoodstreamExtractor;
use filemoon::FilemoonExtractor;
use generic::GenericExtractor;
use netu::NetuExtractor;
use streamtape::StreamtapeExtractor;
use uqload::UqloadExtractor;
use voe::VoeExtractor;

/// Environment an extractor runs in
pub struct ExtractContext<'a> {
    pub fetcher: &'a SiteFetcher,
    /// Address of the embed page being decoded
    pub embed_url: &'a str,
    /// Referrer used to fetch the embed page
    pub referer: &'a str,
}

/// Turns an embed page into a direct stream URL
///
/// `Ok(None)` means the page did not match; `Err` is reserved for transport
/// failures of follow-up requests.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Name of the extractor (for logging)
    fn name(&self) -> &'static str;

    async fn extract(
        &self,
        page: &str,
        ctx: &ExtractContext<'_>,
    ) -> Result<Option<String>, FetchError>;
}

lazy_static! {
    static ref EXTRACTORS: HashMap<ProviderName, Box<dyn Extractor>> = {
        let mut map: HashMap<ProviderName, Box<dyn Extractor>> = HashMap::new();
        map.insert(ProviderName::Streamtape, Box::new(StreamtapeExtractor));
        map.insert(ProviderName::Filemoon, Box::new(FilemoonExtractor));
        map.insert(ProviderName::Voe, Box::new(VoeExtractor));
        map.insert(ProviderName::Doodstream, Box::new(DoodstreamExtractor));
        map.insert(ProviderName::Netu, Box::new(NetuExtractor));
        map.insert(ProviderName::Uqload, Box::new(UqloadExtractor));
        map
    };

    /// Absolute media address anywhere in a text
    pub(crate) static ref BARE_MEDIA_URL: Regex = Regex::new(
        r#"https?://[^"'\s<>\\]+\.(?:m3u8|mp4)(?:\?[^"'\s<>\\]*)?"#
    )
    .unwrap();
}

static GENERIC: GenericExtractor = GenericExtractor;

/// Extractor registered for a provider, or the generic cascade
pub fn extractor_for(provider: &ProviderName) -> &'static dyn Extractor {
    EXTRACTORS
        .get(provider)
        .map(|extractor| extractor.as_ref())
        .unwrap_or(&GENERIC)
}

/// Whether a provider has a dedicated decoder
pub fn has_decoder(provider: &ProviderName) -> bool {
    EXTRACTORS.contains_key(provider)
}

/// First non-empty capture group 1 across patterns, in order
pub(crate) fn capture_first(text: &str, patterns: &[&Regex]) -> Option<String> {
    patterns.iter().find_map(|pattern| {
        pattern
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|v| !v.is_empty())
    })
}

/// Lenient base64 decode: strips junk, repairs padding
pub(crate) fn decode_base64_lossy(encoded: &str) -> Option<String> {
    let mut clean: String = encoded
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '+' || *c == '/')
        .collect();

    let padding = clean.len() % 4;
    if padding == 1 {
        return None;
    }
    if padding > 0 {
        clean.push_str(&"=".repeat(4 - padding));
    }

    let bytes = STANDARD.decode(&clean).ok()?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

/// `//host/...` becomes `https://host/...`
pub(crate) fn force_scheme(url: &str) -> String {
    if url.starts_with("//") {
        format!("https:{}", url)
    } else {
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_dispatch() {
        assert_eq!(extractor_for(&ProviderName::Streamtape).name(), "streamtape");
        assert_eq!(extractor_for(&ProviderName::Filemoon).name(), "filemoon");
        assert_eq!(extractor_for(&ProviderName::Voe).name(), "voe");
        assert_eq!(extractor_for(&ProviderName::Doodstream).name(), "doodstream");
        assert_eq!(extractor_for(&ProviderName::Netu).name(), "netu");
        assert_eq!(extractor_for(&ProviderName::Uqload).name(), "uqload");
        assert_eq!(extractor_for(&ProviderName::Mixdrop).name(), "generic");
        assert_eq!(
            extractor_for(&ProviderName::Other("superplayer".to_string())).name(),
            "generic"
        );
    }

    #[test]
    fn test_has_decoder() {
        assert!(has_decoder(&ProviderName::Uqload));
        assert!(has_decoder(&ProviderName::Netu));
        assert!(!has_decoder(&ProviderName::Mixdrop));
        assert!(!has_decoder(&ProviderName::Other("player".to_string())));
    }

    #[test]
    fn test_decode_base64_lossy() {
        // "https://cdn.example/a.m3u8" without padding
        let encoded = STANDARD.encode("https://cdn.example/a.m3u8");
        let unpadded = encoded.trim_end_matches('=');
        assert_eq!(
            decode_base64_lossy(unpadded).as_deref(),
            Some("https://cdn.example/a.m3u8")
        );
        assert_eq!(decode_base64_lossy("a"), None);
    }

    #[test]
    fn test_force_scheme() {
        assert_eq!(force_scheme("//a.b/c"), "https://a.b/c");
        assert_eq!(force_scheme("http://a.b/c"), "http://a.b/c");
    }
}
