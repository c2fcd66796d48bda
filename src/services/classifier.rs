use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::EmbedCandidate;

/// Known video hosters, plus the first DNS label of anything else
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderName {
    Streamtape,
    Filemoon,
    Voe,
    Doodstream,
    Uqload,
    Netu,
    Mp4Upload,
    YourUpload,
    OkRu,
    Fembed,
    Mixdrop,
    Upstream,
    Vidlox,
    StreamWish,
    FileLions,
    Embedsito,
    Other(String),
}

impl std::fmt::Display for ProviderName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ProviderName::Streamtape => "Streamtape",
            ProviderName::Filemoon => "Filemoon",
            ProviderName::Voe => "Voe",
            ProviderName::Doodstream => "Doodstream",
            ProviderName::Uqload => "Uqload",
            ProviderName::Netu => "Netu",
            ProviderName::Mp4Upload => "Mp4Upload",
            ProviderName::YourUpload => "YourUpload",
            ProviderName::OkRu => "Ok.ru",
            ProviderName::Fembed => "Fembed",
            ProviderName::Mixdrop => "Mixdrop",
            ProviderName::Upstream => "Upstream",
            ProviderName::Vidlox => "Vidlox",
            ProviderName::StreamWish => "StreamWish",
            ProviderName::FileLions => "FileLions",
            ProviderName::Embedsito => "Embedsito",
            ProviderName::Other(label) => label,
        };
        write!(f, "{}", name)
    }
}

/// Audio language of a server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LanguageTag {
    Latino,
    Castellano,
    /// Original audio with subtitles
    Sub,
}

impl Default for LanguageTag {
    fn default() -> Self {
        Self::Sub
    }
}

impl std::fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LanguageTag::Latino => write!(f, "Latino"),
            LanguageTag::Castellano => write!(f, "Castellano"),
            LanguageTag::Sub => write!(f, "Sub"),
        }
    }
}

/// Provider + effective language of one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub provider: ProviderName,
    pub language: LanguageTag,
}

impl Classification {
    /// "<Provider> - <Language>", the dedup key of a resolution
    pub fn quality_label(&self) -> String {
        format!("{} - {}", self.provider, self.language)
    }
}

const LATINO_MARKERS: &[&str] = &["latino", "_lat_", "_lat."];
const CASTELLANO_MARKERS: &[&str] = &["castellano", "_cast_", "_cast.", "castell"];
const SUB_MARKERS: &[&str] = &["_sub_", "_sub.", "subtitulado"];

lazy_static! {
    static ref HOST_REGEX: Regex = Regex::new(r"(?i)^https?://([^/?#:]+)").unwrap();

    // Ordered: first match wins, alternatives separated by '|'
    static ref PROVIDER_TABLE: Vec<(&'static str, ProviderName)> = vec![
        ("streamtape", ProviderName::Streamtape),
        ("filemoon|filemooon", ProviderName::Filemoon),
        ("voe.sx|voe.", ProviderName::Voe),
        ("dood", ProviderName::Doodstream),
        ("uqload", ProviderName::Uqload),
        ("netu|hqq|netuplayer", ProviderName::Netu),
        ("mp4upload", ProviderName::Mp4Upload),
        ("yourupload", ProviderName::YourUpload),
        ("okru|ok.ru", ProviderName::OkRu),
        ("fembed|femax", ProviderName::Fembed),
        ("mixdrop", ProviderName::Mixdrop),
        ("upstream", ProviderName::Upstream),
        ("vidlox", ProviderName::Vidlox),
        ("streamwish", ProviderName::StreamWish),
        ("filelions", ProviderName::FileLions),
        ("embedsito", ProviderName::Embedsito),
    ];
}

/// URL-based hoster and language detection
pub struct HostClassifier;

impl HostClassifier {
    /// Map a URL to its hoster
    pub fn provider(url: &str) -> ProviderName {
        let lower = url.to_lowercase();

        for (needles, provider) in PROVIDER_TABLE.iter() {
            if needles.split('|').any(|n| lower.contains(n)) {
                return provider.clone();
            }
        }

        // Unknown hoster: first DNS label of the host
        HOST_REGEX
            .captures(url)
            .and_then(|caps| caps.get(1))
            .and_then(|host| host.as_str().split('.').next().map(str::to_string))
            .filter(|label| !label.is_empty())
            .map(ProviderName::Other)
            .unwrap_or_else(|| ProviderName::Other("Unknown".to_string()))
    }

    /// Detect an explicit language marker, if any
    pub fn language(text: &str) -> Option<LanguageTag> {
        let lower = text.to_lowercase();
        let has = |markers: &[&str]| markers.iter().any(|m| lower.contains(m));

        if has(LATINO_MARKERS) {
            return Some(LanguageTag::Latino);
        }
        if has(CASTELLANO_MARKERS) {
            return Some(LanguageTag::Castellano);
        }
        if has(SUB_MARKERS) {
            return Some(LanguageTag::Sub);
        }
        // Unlabeled BD releases are the original audio
        if lower.contains("_bd_") && !lower.contains("latino") && !lower.contains("castell") {
            return Some(LanguageTag::Sub);
        }
        None
    }

    /// One step of the language fold: returns the new "current language"
    /// together with the candidate's classification.
    pub fn classify_step(
        current: LanguageTag,
        candidate: &EmbedCandidate,
    ) -> (LanguageTag, Classification) {
        let detected = candidate
            .hint
            .as_deref()
            .and_then(Self::language)
            .or_else(|| Self::language(&candidate.url));
        let language = detected.unwrap_or(current);

        (
            language,
            Classification {
                provider: Self::provider(&candidate.url),
                language,
            },
        )
    }

    /// Classify candidates in harvest order.
    ///
    /// Servers of one language are listed contiguously and only the first of
    /// each group is labeled, so an unlabeled candidate inherits the language
    /// of the last labeled one.
    pub fn classify_all(candidates: &[EmbedCandidate]) -> Vec<Classification> {
        candidates
            .iter()
            .fold(
                (LanguageTag::default(), Vec::with_capacity(candidates.len())),
                |(current, mut out), candidate| {
                    let (next, classification) = Self::classify_step(current, candidate);
                    out.push(classification);
                    (next, out)
                },
            )
            .1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DiscoveredVia;

    fn raw(url: &str) -> EmbedCandidate {
        EmbedCandidate::new(url, DiscoveredVia::RawScan)
    }

    #[test]
    fn test_provider_table() {
        let cases = [
            ("https://streamtape.com/e/abc", ProviderName::Streamtape),
            ("https://filemoon.sx/e/abc", ProviderName::Filemoon),
            ("https://filemooon.to/e/abc", ProviderName::Filemoon),
            ("https://voe.sx/e/abc", ProviderName::Voe),
            ("https://dood.watch/e/abc", ProviderName::Doodstream),
            ("https://doodstream.com/e/abc", ProviderName::Doodstream),
            ("https://uqload.co/embed-abc.html", ProviderName::Uqload),
            ("https://netu.ac/e/abc", ProviderName::Netu),
            ("https://hqq.to/e/abc", ProviderName::Netu),
            ("https://mp4upload.com/embed-abc.html", ProviderName::Mp4Upload),
            ("https://www.yourupload.com/embed/abc", ProviderName::YourUpload),
            ("https://ok.ru/videoembed/1", ProviderName::OkRu),
            ("https://fembed.com/v/abc", ProviderName::Fembed),
            ("https://femax20.com/v/abc", ProviderName::Fembed),
            ("https://mixdrop.co/e/abc", ProviderName::Mixdrop),
            ("https://upstream.to/embed-abc.html", ProviderName::Upstream),
            ("https://vidlox.me/embed-abc", ProviderName::Vidlox),
            ("https://streamwish.to/e/abc", ProviderName::StreamWish),
            ("https://filelions.to/v/abc", ProviderName::FileLions),
            ("https://embedsito.com/v/abc", ProviderName::Embedsito),
        ];

        for (url, expected) in cases {
            assert_eq!(HostClassifier::provider(url), expected, "{}", url);
        }
    }

    #[test]
    fn test_provider_case_insensitive() {
        assert_eq!(HostClassifier::provider("https://STREAMTAPE.com/e/X"), ProviderName::Streamtape);
        assert_eq!(HostClassifier::provider("https://FileMoon.SX/e/X"), ProviderName::Filemoon);
    }

    #[test]
    fn test_provider_fallback_dns_label() {
        assert_eq!(
            HostClassifier::provider("https://superplayer.example.org/embed/1"),
            ProviderName::Other("superplayer".to_string())
        );
        assert_eq!(
            HostClassifier::provider("not a url"),
            ProviderName::Other("Unknown".to_string())
        );
    }

    #[test]
    fn test_language_markers() {
        assert_eq!(HostClassifier::language("https://x/e/ep1_latino"), Some(LanguageTag::Latino));
        assert_eq!(HostClassifier::language("https://x/e/ep1_lat_720"), Some(LanguageTag::Latino));
        assert_eq!(HostClassifier::language("https://x/e/ep1_cast.mp4"), Some(LanguageTag::Castellano));
        assert_eq!(HostClassifier::language("https://x/e/ep1_sub_hd"), Some(LanguageTag::Sub));
        assert_eq!(HostClassifier::language("https://x/e/ep1_bd_1080"), Some(LanguageTag::Sub));
        assert_eq!(HostClassifier::language("https://x/e/ep1"), None);
    }

    #[test]
    fn test_language_carry_over() {
        let candidates = vec![
            raw("https://streamtape.com/e/ep1_latino"),
            raw("https://filemoon.sx/e/abc"),
            raw("https://voe.sx/e/def"),
        ];
        let classes = HostClassifier::classify_all(&candidates);
        assert!(classes.iter().all(|c| c.language == LanguageTag::Latino));
    }

    #[test]
    fn test_language_switches_between_groups() {
        let candidates = vec![
            raw("https://streamtape.com/e/a"),
            raw("https://filemoon.sx/e/ep1_castellano"),
            raw("https://voe.sx/e/b"),
            raw("https://dood.watch/e/ep1_sub_x"),
        ];
        let labels: Vec<String> = HostClassifier::classify_all(&candidates)
            .iter()
            .map(Classification::quality_label)
            .collect();
        assert_eq!(
            labels,
            vec![
                "Streamtape - Sub",
                "Filemoon - Castellano",
                "Voe - Castellano",
                "Doodstream - Sub",
            ]
        );
    }

    #[test]
    fn test_hint_takes_precedence() {
        let candidate = raw("https://streamtape.com/e/a").with_hint(Some("Latino".to_string()));
        let (next, class) = HostClassifier::classify_step(LanguageTag::Sub, &candidate);
        assert_eq!(next, LanguageTag::Latino);
        assert_eq!(class.quality_label(), "Streamtape - Latino");
    }
}
