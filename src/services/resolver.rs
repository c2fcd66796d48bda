//! End-to-end resolution: episode page -> multi-server embed -> candidates ->
//! classification -> extraction -> validated, deduplicated sources.
//!
//! Nothing in here fails outward. Transport and parse problems shrink the
//! result; an unreachable episode page yields an empty source list.

use futures::future::join_all;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::Config;
use crate::models::{ContainerType, DiscoveredVia, EmbedCandidate, EpisodeRef, EpisodeServer, VideoSource};
use crate::services::classifier::{Classification, HostClassifier};
use crate::services::extractors::{extractor_for, has_decoder, ExtractContext};
use crate::services::fetcher::{FetchError, SiteFetcher};
use crate::services::{harvester, metrics, multiserver};

/// Server hint that maps to the configured display name
pub const DEFAULT_SERVER_HINT: &str = "default";

/// Label of the "play the embed page itself" entry
pub const FALLBACK_LABEL: &str = "MULTISERVER";

/// Outcome of one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Direct media, either decoded or already a media address
    Decoded(VideoSource),
    /// Undecoded page of a hoster without a dedicated decoder
    Raw(VideoSource),
    /// A dedicated decoder ran and found nothing
    Missed,
}

/// Episode resolver
#[derive(Clone)]
pub struct Resolver {
    fetcher: SiteFetcher,
    default_server_name: String,
}

impl Resolver {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        Ok(Self {
            fetcher: SiteFetcher::new(config)?,
            default_server_name: config.default_server_name.clone(),
        })
    }

    pub fn fetcher(&self) -> &SiteFetcher {
        &self.fetcher
    }

    /// Display name for a server hint
    pub fn server_name(&self, hint: &str) -> String {
        if hint == DEFAULT_SERVER_HINT {
            self.default_server_name.clone()
        } else {
            hint.to_string()
        }
    }

    /// Resolve an episode descriptor produced by the listing stage
    pub async fn resolve_episode(&self, episode: &EpisodeRef, server_hint: &str) -> EpisodeServer {
        debug!("Resolving episode {}", episode.id);
        self.resolve(&episode.url, server_hint).await
    }

    /// Resolve one episode page into its direct stream sources
    pub async fn resolve(&self, episode_url: &str, server_hint: &str) -> EpisodeServer {
        metrics::RESOLUTIONS_TOTAL.inc();

        let mut server = EpisodeServer {
            server_name: self.server_name(server_hint),
            request_headers: self.fetcher.request_headers(),
            video_sources: Vec::new(),
        };

        let episode_html = match self.fetcher.get_text(episode_url, None).await {
            Ok(html) => html,
            Err(e) => {
                warn!("Episode page {} unreachable: {}", episode_url, e);
                return server;
            }
        };

        let embed_url =
            multiserver::resolve_embed_url(&self.fetcher, &episode_html, episode_url).await;

        let candidates = self
            .gather_candidates(&episode_html, episode_url, embed_url.as_deref())
            .await;

        // Language carry-over depends on harvest order: classify before dispatch
        let classifications = HostClassifier::classify_all(&candidates);

        let extracted = join_all(
            candidates
                .into_iter()
                .zip(classifications)
                .map(|(candidate, class)| self.extract_candidate(candidate, class, episode_url)),
        )
        .await;

        server.video_sources = finalize(extracted, embed_url.as_deref());

        for source in &server.video_sources {
            let provider = source
                .quality_label
                .split(" - ")
                .next()
                .unwrap_or(&source.quality_label);
            metrics::record_source(provider);
        }

        info!(
            "Resolved {} -> {} sources",
            episode_url,
            server.video_sources.len()
        );
        server
    }

    async fn gather_candidates(
        &self,
        episode_html: &str,
        episode_url: &str,
        embed_url: Option<&str>,
    ) -> Vec<EmbedCandidate> {
        let Some(embed_url) = embed_url else {
            let candidates = harvester::episode_iframes(episode_html);
            debug!("No multi-server embed, {} episode iframes", candidates.len());
            return candidates;
        };

        let embed_html = match self.fetcher.get_text(embed_url, Some(episode_url)).await {
            Ok(html) => html,
            Err(e) => {
                warn!("Embed page {} failed: {}", embed_url, e);
                String::new()
            }
        };

        let candidates = harvester::harvest(&embed_html);
        if candidates.is_empty() {
            debug!("Nothing harvested, using embed page as the only candidate");
            return vec![EmbedCandidate::new(embed_url, DiscoveredVia::Iframe)];
        }
        candidates
    }

    /// Turn one candidate into a source. Only hosters without a dedicated
    /// decoder fall back to the raw candidate URL.
    async fn extract_candidate(
        &self,
        candidate: EmbedCandidate,
        class: Classification,
        episode_url: &str,
    ) -> Extraction {
        let label = class.quality_label();
        debug!(
            "Candidate {} ({:?}) -> {}",
            candidate.url, candidate.discovered_via, label
        );

        if is_direct_media(&candidate.url) {
            return Extraction::Decoded(VideoSource::new(candidate.url, label));
        }

        let extractor = extractor_for(&class.provider);
        let page = match self.fetcher.get_text(&candidate.url, Some(episode_url)).await {
            Ok(page) => Some(page),
            Err(e) => {
                warn!("Candidate {} failed: {}", candidate.url, e);
                None
            }
        };

        let extracted = match page {
            Some(page) => {
                let ctx = ExtractContext {
                    fetcher: &self.fetcher,
                    embed_url: &candidate.url,
                    referer: episode_url,
                };
                match extractor.extract(&page, &ctx).await {
                    Ok(found) => found,
                    Err(e) => {
                        warn!("{} extractor failed on {}: {}", extractor.name(), candidate.url, e);
                        None
                    }
                }
            }
            None => None,
        };

        match extracted {
            Some(url) => Extraction::Decoded(VideoSource::new(url, label)),
            None => {
                debug!("{} extractor found nothing on {}", extractor.name(), candidate.url);
                metrics::record_miss(&class.provider.to_string());
                if has_decoder(&class.provider) {
                    Extraction::Missed
                } else {
                    Extraction::Raw(VideoSource::new(candidate.url, label))
                }
            }
        }
    }
}

/// Address already names a playable container
pub fn is_direct_media(url: &str) -> bool {
    ContainerType::from_url(url) != ContainerType::Unknown
}

/// Absolute http(s) address
pub fn is_absolute_http(url: &str) -> bool {
    Url::parse(url)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
        .unwrap_or(false)
}

/// Secondary player page rather than media
pub fn is_embed_wrapper(url: &str) -> bool {
    let lower = url.to_lowercase();
    lower.contains("/e/") || lower.contains("/embed/")
}

/// Validate, deduplicate by label and apply the embed fallback.
///
/// Decoded entries claim their labels first (in harvest order); raw entries
/// only fill labels nothing decoded.
pub fn finalize(outcomes: Vec<Extraction>, embed_url: Option<&str>) -> Vec<VideoSource> {
    let mut decoded = Vec::with_capacity(outcomes.len());
    let mut raw = Vec::new();
    for outcome in outcomes {
        match outcome {
            Extraction::Decoded(source) => decoded.push(source),
            Extraction::Raw(source) => raw.push(source),
            Extraction::Missed => {}
        }
    }

    let mut out: Vec<VideoSource> = Vec::with_capacity(decoded.len() + raw.len());
    for source in decoded.into_iter().chain(raw) {
        if !is_absolute_http(&source.url) {
            debug!("Dropping non-absolute source {}", source.url);
            continue;
        }
        if is_embed_wrapper(&source.url) {
            debug!("Dropping embed wrapper {}", source.url);
            continue;
        }
        if out.iter().any(|s| s.quality_label == source.quality_label) {
            continue;
        }
        out.push(source);
    }

    if out.is_empty() {
        if let Some(embed_url) = embed_url.filter(|u| is_absolute_http(u)) {
            out.push(VideoSource::new(embed_url, FALLBACK_LABEL));
        }
    }

    out
}
