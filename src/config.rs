use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// MyAnimeList API client ID, sent as `X-MAL-CLIENT-ID`
    #[serde(default)]
    pub mal_client_id: Option<String>,

    /// MyAnimeList API client secret
    #[serde(default)]
    pub mal_client_secret: Option<String>,

    /// Reddit application credentials
    #[serde(default)]
    pub reddit_client_id: Option<String>,

    #[serde(default)]
    pub reddit_client_secret: Option<String>,

    #[serde(default = "default_reddit_user_agent")]
    pub reddit_user_agent: String,

    /// Jikan (unofficial MyAnimeList) API base URL
    #[serde(default = "default_jikan_api_url")]
    pub jikan_api_url: String,

    /// Official MyAnimeList v2 API base URL
    #[serde(default = "default_mal_api_url")]
    pub mal_api_url: String,

    /// Reddit OAuth token endpoint base URL
    #[serde(default = "default_reddit_auth_url")]
    pub reddit_auth_url: String,

    /// Reddit authenticated API base URL
    #[serde(default = "default_reddit_api_url")]
    pub reddit_api_url: String,

    /// Number of titles to collect
    #[serde(default = "default_anime_limit")]
    pub anime_limit: usize,

    /// Maximum number of discussion threads sampled per title
    #[serde(default = "default_hype_max_threads")]
    pub hype_max_threads: usize,

    /// Fixed delay before each title's hype lookup, in milliseconds
    #[serde(default = "default_hype_delay_ms")]
    pub hype_delay_ms: u64,

    /// Upper bound on a single title's hype lookup, in seconds
    #[serde(default = "default_hype_timeout_secs")]
    pub hype_timeout_secs: u64,

    /// Number of synthetic users
    #[serde(default = "default_num_users")]
    pub num_users: u32,

    /// Minimum number of items each synthetic user rates
    #[serde(default = "default_min_ratings")]
    pub min_ratings: usize,

    /// Seed for the synthetic rating generator
    #[serde(default)]
    pub rating_seed: Option<u64>,

    /// Directory for tabular stage artifacts
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Directory for the trained model and hype mapping
    #[serde(default = "default_model_dir")]
    pub model_dir: String,
}

fn default_reddit_user_agent() -> String {
    "anime-hype/0.1 (offline pipeline)".to_string()
}

fn default_jikan_api_url() -> String {
    "https://api.jikan.moe/v4".to_string()
}

fn default_mal_api_url() -> String {
    "https://api.myanimelist.net/v2".to_string()
}

fn default_reddit_auth_url() -> String {
    "https://www.reddit.com".to_string()
}

fn default_reddit_api_url() -> String {
    "https://oauth.reddit.com".to_string()
}

fn default_anime_limit() -> usize {
    50
}

fn default_hype_max_threads() -> usize {
    5
}

fn default_hype_delay_ms() -> u64 {
    2000
}

fn default_hype_timeout_secs() -> u64 {
    30
}

fn default_num_users() -> u32 {
    200
}

fn default_min_ratings() -> usize {
    5
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_model_dir() -> String {
    "models".to_string()
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

        if config.mal_client_id.is_none() || config.mal_client_secret.is_none() {
            tracing::warn!("MAL_CLIENT_ID or MAL_CLIENT_SECRET not set; the mal source is unavailable");
        }

        Ok(config)
    }

    /// Reddit credentials, when both halves are configured
    pub fn reddit_credentials(&self) -> Option<(&str, &str)> {
        match (&self.reddit_client_id, &self.reddit_client_secret) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => {
                Some((id.as_str(), secret.as_str()))
            }
            _ => None,
        }
    }
}
