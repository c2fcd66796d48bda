use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Container type of a resolved stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerType {
    M3u8,
    Mp4,
    Unknown,
}

impl ContainerType {
    /// Guess container type from URL
    pub fn from_url(url: &str) -> Self {
        let lower = url.to_lowercase();
        if lower.contains(".m3u8") {
            Self::M3u8
        } else if lower.contains(".mp4") {
            Self::Mp4
        } else {
            Self::Unknown
        }
    }
}

impl Default for ContainerType {
    fn default() -> Self {
        Self::Unknown
    }
}

impl std::fmt::Display for ContainerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContainerType::M3u8 => write!(f, "m3u8"),
            ContainerType::Mp4 => write!(f, "mp4"),
            ContainerType::Unknown => write!(f, "unknown"),
        }
    }
}

/// Subtitle track attached to a source (the resolver never produces any)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtitle {
    pub url: String,
    pub language: String,
}

/// A directly playable stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSource {
    pub url: String,
    pub container_type: ContainerType,
    /// "<Provider> - <Language>", unique within one resolution
    pub quality_label: String,
    #[serde(default)]
    pub subtitle_tracks: Vec<Subtitle>,
}

impl VideoSource {
    pub fn new(url: impl Into<String>, quality_label: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            container_type: ContainerType::from_url(&url),
            url,
            quality_label: quality_label.into(),
            subtitle_tracks: Vec::new(),
        }
    }
}

/// Result of resolving one episode page
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeServer {
    pub server_name: String,
    pub request_headers: HashMap<String, String>,
    pub video_sources: Vec<VideoSource>,
}

/// Episode page handed over by the listing layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeRef {
    pub id: String,
    pub url: String,
}

/// Player selector attributes from the episode page (data-post / data-nume / data-type)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerToken {
    pub post_id: String,
    pub source_index: String,
    pub media_type: String,
}

/// Which harvesting strategy found a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiscoveredVia {
    Attribute,
    ScriptArray,
    Iframe,
    RawScan,
}

/// Embed URL harvested from a page, before classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedCandidate {
    pub url: String,
    pub discovered_via: DiscoveredVia,
    /// Server label found next to the URL (button text, `name` field, ...)
    pub hint: Option<String>,
}

impl EmbedCandidate {
    pub fn new(url: impl Into<String>, discovered_via: DiscoveredVia) -> Self {
        Self {
            url: url.into(),
            discovered_via,
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: Option<String>) -> Self {
        self.hint = hint.filter(|h| !h.trim().is_empty());
        self
    }
}
