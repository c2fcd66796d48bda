//! Multi-server embed discovery through the site's player API.
//!
//! The episode page only carries a player selector (`data-post`, `data-nume`,
//! `data-type`); the address of the page listing the actual servers comes
//! from `/wp-json/dooplayer/v1/post/<post>?type=<type>&source=<nume>`.

use scraper::{Html, Selector};
use tracing::{debug, warn};
use url::Url;

use crate::models::PlayerToken;
use crate::services::fetcher::SiteFetcher;

/// Media type assumed when the selector has no `data-type`
const DEFAULT_MEDIA_TYPE: &str = "tv";

/// Read the first player selector of an episode page
pub fn find_player_token(html: &str) -> Option<PlayerToken> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("[data-post][data-nume]").ok()?;

    let element = document.select(&selector).next()?;
    let attrs = element.value();

    let post_id = attrs.attr("data-post")?.trim();
    let source_index = attrs.attr("data-nume")?.trim();
    if post_id.is_empty() || source_index.is_empty() {
        return None;
    }

    let media_type = attrs
        .attr("data-type")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_MEDIA_TYPE);

    Some(PlayerToken {
        post_id: post_id.to_string(),
        source_index: source_index.to_string(),
        media_type: media_type.to_string(),
    })
}

/// Player API address for a token
pub fn player_api_url(base_url: &str, token: &PlayerToken) -> String {
    format!(
        "{}/wp-json/dooplayer/v1/post/{}?type={}&source={}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(&token.post_id),
        urlencoding::encode(&token.media_type),
        urlencoding::encode(&token.source_index)
    )
}

/// Unescape `\/`, turn `//host/...` into `https://host/...` and resolve
/// relative addresses against the page that asked for them
pub fn normalize_embed_url(raw: &str, page_url: &str) -> Option<String> {
    let url = raw.trim().replace("\\/", "/");
    if url.is_empty() {
        return None;
    }
    if url.starts_with("//") {
        return Some(format!("https:{}", url));
    }

    let parsed = Url::parse(&url)
        .or_else(|_| Url::parse(page_url).and_then(|base| base.join(&url)))
        .ok()?;
    matches!(parsed.scheme(), "http" | "https").then(|| parsed.to_string())
}

/// Pick `embed_url` (or `url`) out of the player API response
pub fn embed_url_from_response(body: &serde_json::Value, page_url: &str) -> Option<String> {
    ["embed_url", "url"]
        .iter()
        .filter_map(|key| body.get(*key).and_then(|v| v.as_str()))
        .find(|v| !v.trim().is_empty())
        .and_then(|v| normalize_embed_url(v, page_url))
}

/// Resolve the multi-server embed address for an episode page.
///
/// Never fails: a missing selector, HTTP error or unexpected body all mean
/// "no embed URL".
pub async fn resolve_embed_url(
    fetcher: &SiteFetcher,
    episode_html: &str,
    episode_url: &str,
) -> Option<String> {
    let Some(token) = find_player_token(episode_html) else {
        debug!("No player selector on {}", episode_url);
        return None;
    };

    let api_url = player_api_url(fetcher.base_url(), &token);
    debug!(
        "Player API request: post={} type={} source={}",
        token.post_id, token.media_type, token.source_index
    );

    match fetcher.get_json(&api_url, Some(episode_url)).await {
        Ok(body) => {
            let embed_url = embed_url_from_response(&body, episode_url);
            if embed_url.is_none() {
                debug!("Player API response has no embed_url/url field");
            }
            embed_url
        }
        Err(e) => {
            warn!("Player API failed for post {}: {}", token.post_id, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_player_token() {
        let html = r#"
            <ul id="playeroptionsul">
                <li id="player-option-trailer" class="dooplay_player_option">Trailer</li>
                <li id="player-option-1" class="dooplay_player_option" data-type="tv" data-post="42" data-nume="3">
                    <span class="title">MULTISERVER</span>
                </li>
                <li class="dooplay_player_option" data-type="tv" data-post="42" data-nume="4"></li>
            </ul>"#;

        let token = find_player_token(html).unwrap();
        assert_eq!(token.post_id, "42");
        assert_eq!(token.source_index, "3");
        assert_eq!(token.media_type, "tv");
    }

    #[test]
    fn test_find_player_token_default_type() {
        let html = r#"<li data-post="7" data-nume="1">Opción 1</li>"#;
        let token = find_player_token(html).unwrap();
        assert_eq!(token.media_type, DEFAULT_MEDIA_TYPE);
    }

    #[test]
    fn test_find_player_token_missing() {
        assert_eq!(find_player_token("<div data-post=\"7\">x</div>"), None);
        assert_eq!(find_player_token(""), None);
    }

    #[test]
    fn test_player_api_url() {
        let token = PlayerToken {
            post_id: "42".to_string(),
            source_index: "3".to_string(),
            media_type: "tv".to_string(),
        };
        assert_eq!(
            player_api_url("https://site.example/", &token),
            "https://site.example/wp-json/dooplayer/v1/post/42?type=tv&source=3"
        );
    }

    const EPISODE: &str = "https://site.example/episodio/ep-1/";

    #[test]
    fn test_embed_url_from_response() {
        let body: serde_json::Value =
            serde_json::from_str(r#"{"embed_url":"\/\/host\/embed\/abc","type":"iframe"}"#).unwrap();
        assert_eq!(
            embed_url_from_response(&body, EPISODE).as_deref(),
            Some("https://host/embed/abc")
        );

        let body = serde_json::json!({ "embed_url": "", "url": "https://host/e/x" });
        assert_eq!(
            embed_url_from_response(&body, EPISODE).as_deref(),
            Some("https://host/e/x")
        );

        let body = serde_json::json!({ "type": false });
        assert_eq!(embed_url_from_response(&body, EPISODE), None);
    }

    #[test]
    fn test_normalize_double_escaped() {
        assert_eq!(
            normalize_embed_url(r"https:\/\/host\/embed\/abc", EPISODE).as_deref(),
            Some("https://host/embed/abc")
        );
        assert_eq!(normalize_embed_url("  ", EPISODE), None);
    }

    #[test]
    fn test_normalize_relative_against_episode() {
        assert_eq!(
            normalize_embed_url(r"\/embed\/rel", EPISODE).as_deref(),
            Some("https://site.example/embed/rel")
        );
        assert_eq!(
            normalize_embed_url("player.php?id=9", EPISODE).as_deref(),
            Some("https://site.example/episodio/ep-1/player.php?id=9")
        );
        assert_eq!(normalize_embed_url("javascript:void(0)", EPISODE), None);
    }
}
