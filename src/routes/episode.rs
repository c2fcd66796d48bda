//! Episode resolution route

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::models::EpisodeRef;
use crate::services::resolver::DEFAULT_SERVER_HINT;
use crate::AppState;

fn default_server() -> String {
    DEFAULT_SERVER_HINT.to_string()
}

/// Query parameters for source resolution
#[derive(Deserialize)]
pub struct SourcesQuery {
    pub url: String,
    /// Episode identifier from the listing; the URL stands in when absent
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default = "default_server")]
    pub server: String,
}

impl SourcesQuery {
    fn episode(&self) -> EpisodeRef {
        let url = self.url.trim().to_string();
        let id = self
            .id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| url.clone());
        EpisodeRef { id, url }
    }
}

/// Validate URL is HTTP/HTTPS
fn is_valid_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// GET /api/episode/sources?url=<episode page>&id=<episode id>&server=<hint>
pub async fn get_sources(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SourcesQuery>,
) -> impl IntoResponse {
    let episode = query.episode();
    if !is_valid_http_url(&episode.url) {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Invalid episode URL"})),
        )
            .into_response();
    }

    let server = state.resolver.resolve_episode(&episode, &query.server).await;
    (StatusCode::OK, Json(server)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_http_url() {
        assert!(is_valid_http_url("https://ww3.animeonline.ninja/episodio/x/"));
        assert!(is_valid_http_url("http://localhost:8080/a"));
        assert!(!is_valid_http_url(""));
        assert!(!is_valid_http_url("ftp://host/file"));
        assert!(!is_valid_http_url("/episodio/x/"));
    }

    #[test]
    fn test_server_defaults() {
        let query: SourcesQuery = serde_json::from_str(r#"{"url": "https://a/b"}"#).unwrap();
        assert_eq!(query.server, "default");
    }

    #[test]
    fn test_episode_ref_from_query() {
        let query: SourcesQuery = serde_json::from_str(
            r#"{"url": " https://a/episodio/x/ ", "id": "one-piece-1100"}"#,
        )
        .unwrap();
        assert_eq!(
            query.episode(),
            EpisodeRef {
                id: "one-piece-1100".to_string(),
                url: "https://a/episodio/x/".to_string(),
            }
        );

        let query: SourcesQuery = serde_json::from_str(r#"{"url": "https://a/b", "id": ""}"#).unwrap();
        assert_eq!(query.episode().id, "https://a/b");
    }
}
