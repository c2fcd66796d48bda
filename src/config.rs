use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub port: u16,
    pub node_env: String,

    // Upstream site
    pub site_base_url: String,
    pub fetch_timeout_ms: u64,

    // Outbound headers
    pub user_agent: String,
    pub accept_language: String,

    // Resolution
    pub default_server_name: String,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            // Server
            port: env::var("PORT")
                .unwrap_or_else(|_| "3002".to_string())
                .parse()
                .unwrap_or(3002),
            node_env: env::var("NODE_ENV").unwrap_or_else(|_| "development".to_string()),

            // Upstream site
            site_base_url: env::var("SITE_BASE_URL")
                .unwrap_or_else(|_| "https://ww3.animeonline.ninja".to_string())
                .trim_end_matches('/')
                .to_string(),

            fetch_timeout_ms: env::var("FETCH_TIMEOUT_MS")
                .unwrap_or_else(|_| "15000".to_string())
                .parse()
                .unwrap_or(15_000), // 15 seconds

            // Outbound headers - hosters serve stripped pages to non-browser agents
            user_agent: env::var("USER_AGENT").unwrap_or_else(|_| {
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36"
                    .to_string()
            }),
            accept_language: env::var("ACCEPT_LANGUAGE")
                .unwrap_or_else(|_| "es-ES,es;q=0.9,en;q=0.8".to_string()),

            // Resolution
            default_server_name: env::var("DEFAULT_SERVER_NAME")
                .unwrap_or_else(|_| "animeonline".to_string()),
        }
    }

    /// Config pointing at an arbitrary site, used by tests against a mock server
    #[cfg(test)]
    pub fn for_site(base_url: &str) -> Self {
        Self {
            site_base_url: base_url.trim_end_matches('/').to_string(),
            fetch_timeout_ms: 5_000,
            ..Self::from_env()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
