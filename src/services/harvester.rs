//! Embed candidate harvesting
//!
//! Four independent strategies run in priority order over an embed page; the
//! first one that finds anything wins:
//!
//! 1. `data-video` / `data-src` / `data-url` / `data-embed` attributes
//! 2. a `servers|videos|sources = [...]` JSON array in an inline script
//! 3. `<iframe>` sources
//! 4. any absolute `.m3u8` / `.mp4` / `/embed/` / `/e/` address in the text

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::models::{DiscoveredVia, EmbedCandidate};

/// Third-party widgets that show up as iframes on episode pages
const IFRAME_DENYLIST: &[&str] = &["google", "facebook", "twitter", "disqus"];

const ATTRIBUTE_KEYS: &[&str] = &["data-video", "data-src", "data-url", "data-embed"];
const ENTRY_URL_KEYS: &[&str] = &["url", "file", "src", "embed"];
const ENTRY_HINT_KEYS: &[&str] = &["name", "label", "server", "lang"];

lazy_static! {
    static ref SERVER_ARRAY: Regex =
        Regex::new(r"(?i)(?:servers|videos|sources)\s*[=:]\s*(\[[\s\S]*?\])").unwrap();
    static ref RAW_URL: Regex = Regex::new(
        r#"(?i)https?://[^"'\s<>\\]+(?:\.m3u8|\.mp4)(?:\?[^"'\s<>\\]*)?|https?://[^"'\s<>\\]+/(?:embed|e)/[^"'\s<>\\]+"#
    )
    .unwrap();
}

/// Harvest candidates from an embed page, short-circuiting after the first
/// strategy that yields anything.
pub fn harvest(embed_html: &str) -> Vec<EmbedCandidate> {
    if embed_html.trim().is_empty() {
        return Vec::new();
    }

    let strategies: [(&str, fn(&str) -> Vec<EmbedCandidate>); 4] = [
        ("attribute", attribute_scan),
        ("script array", script_array_scan),
        ("iframe", iframe_scan),
        ("raw url", raw_url_scan),
    ];

    for (name, strategy) in strategies {
        let candidates = dedup(strategy(embed_html));
        if !candidates.is_empty() {
            debug!("{} scan produced {} candidates", name, candidates.len());
            return candidates;
        }
    }

    Vec::new()
}

/// Iframes of the episode page itself, minus social/analytics widgets
pub fn episode_iframes(episode_html: &str) -> Vec<EmbedCandidate> {
    let candidates = iframe_scan(episode_html)
        .into_iter()
        .filter(|c| {
            let lower = c.url.to_lowercase();
            !IFRAME_DENYLIST.iter().any(|d| lower.contains(d))
        })
        .collect();
    dedup(candidates)
}

/// Strategy 1: player buttons carrying the embed address in a data attribute
pub fn attribute_scan(html: &str) -> Vec<EmbedCandidate> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("[data-video], [data-src], [data-url], [data-embed]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| {
            let url = ATTRIBUTE_KEYS
                .iter()
                .filter_map(|key| element.value().attr(key))
                .map(str::trim)
                .find(|v| !v.is_empty())?;
            if !is_absolute(url) {
                return None;
            }

            let hint = Some(element_text(&element))
                .filter(|t| !t.is_empty())
                .or_else(|| element.value().attr("title").map(str::to_string));

            Some(EmbedCandidate::new(url, DiscoveredVia::Attribute).with_hint(hint))
        })
        .collect()
}

/// Strategy 2: JSON server list assigned in an inline script
pub fn script_array_scan(html: &str) -> Vec<EmbedCandidate> {
    for caps in SERVER_ARRAY.captures_iter(html) {
        let Some(raw) = caps.get(1) else { continue };
        let Ok(serde_json::Value::Array(entries)) = serde_json::from_str(raw.as_str()) else {
            continue;
        };

        let candidates: Vec<EmbedCandidate> = entries
            .iter()
            .filter_map(|entry| {
                let url = first_string(entry, ENTRY_URL_KEYS)?;
                let url = normalize_candidate_url(&url)?;
                let hint = first_string(entry, ENTRY_HINT_KEYS);
                Some(EmbedCandidate::new(url, DiscoveredVia::ScriptArray).with_hint(hint))
            })
            .collect();

        if !candidates.is_empty() {
            return candidates;
        }
    }

    Vec::new()
}

/// Strategy 3: `<iframe src>` / `<iframe data-src>`
pub fn iframe_scan(html: &str) -> Vec<EmbedCandidate> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("iframe") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| {
            let src = element
                .value()
                .attr("src")
                .or_else(|| element.value().attr("data-src"))?;
            let url = normalize_candidate_url(src)?;
            Some(EmbedCandidate::new(url, DiscoveredVia::Iframe))
        })
        .collect()
}

/// Strategy 4: bare media/embed addresses anywhere in the page text
pub fn raw_url_scan(html: &str) -> Vec<EmbedCandidate> {
    let text = html.replace("\\/", "/");
    RAW_URL
        .find_iter(&text)
        .map(|m| EmbedCandidate::new(m.as_str().trim(), DiscoveredVia::RawScan))
        .collect()
}

fn is_absolute(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Accept absolute and protocol-relative addresses only
fn normalize_candidate_url(raw: &str) -> Option<String> {
    let url = raw.trim().replace("\\/", "/");
    if url.starts_with("//") {
        Some(format!("https:{}", url))
    } else if is_absolute(&url) {
        Some(url)
    } else {
        None
    }
}

fn first_string(entry: &serde_json::Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| entry.get(*key).and_then(|v| v.as_str()))
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Keep the first occurrence of each URL
fn dedup(candidates: Vec<EmbedCandidate>) -> Vec<EmbedCandidate> {
    let mut out: Vec<EmbedCandidate> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !out.iter().any(|c| c.url == candidate.url) {
            out.push(candidate);
        }
    }
    out
}
