/// Upstream data source abstraction
///
/// Metadata sources (Jikan, the official MyAnimeList API) return raw catalog
/// payloads for the normalizer; discussion sources (Reddit) return a
/// `HypeSample` per title. Both are injected into the pipeline so tests and
/// offline runs can swap them out.
use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::HypeSample,
};

pub mod jikan;
pub mod mal;
pub mod reddit;

pub use jikan::JikanClient;
pub use mal::MalClient;
pub use reddit::{OfflineDiscussionSource, RedditClient};

/// Trait for anime metadata providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MetadataSource: Send + Sync {
    /// Fetch up to `limit` currently airing top titles as raw payloads
    ///
    /// Payload shape depends on the provider; the normalizer accepts either.
    async fn fetch_top_anime(&self, limit: usize) -> AppResult<Vec<serde_json::Value>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Trait for social discussion providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait DiscussionSource: Send + Sync {
    /// Gather comments and thread weights for a title from at most `max_threads` threads
    ///
    /// An empty sample is a valid answer. Network, auth, and parse failures
    /// are returned as errors; callers degrade them to a neutral score.
    async fn fetch_sample(&self, title: &str, max_threads: usize) -> AppResult<HypeSample>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Which metadata provider to collect from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataProvider {
    Jikan,
    Mal,
}

impl std::str::FromStr for MetadataProvider {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "jikan" => Ok(MetadataProvider::Jikan),
            "mal" | "myanimelist" => Ok(MetadataProvider::Mal),
            other => Err(AppError::InvalidParameter(format!(
                "Unknown metadata source '{}', expected 'jikan' or 'mal'",
                other
            ))),
        }
    }
}

/// Builds the configured metadata provider
pub fn metadata_source(
    provider: MetadataProvider,
    config: &Config,
) -> AppResult<Box<dyn MetadataSource>> {
    match provider {
        MetadataProvider::Jikan => Ok(Box::new(JikanClient::new(config.jikan_api_url.clone()))),
        MetadataProvider::Mal => {
            let client_id = config.mal_client_id.clone().ok_or_else(|| {
                AppError::Config("MAL_CLIENT_ID must be set to use the mal source".to_string())
            })?;
            Ok(Box::new(MalClient::new(client_id, config.mal_api_url.clone())))
        }
    }
}

/// Builds the discussion provider, falling back to an offline source without credentials
pub fn discussion_source(config: &Config) -> Box<dyn DiscussionSource> {
    match config.reddit_credentials() {
        Some((client_id, client_secret)) => Box::new(RedditClient::new(
            client_id.to_string(),
            client_secret.to_string(),
            config.reddit_user_agent.clone(),
            config.reddit_auth_url.clone(),
            config.reddit_api_url.clone(),
        )),
        None => {
            tracing::error!(
                "Reddit credentials not found; every title will receive a neutral hype score"
            );
            Box::new(OfflineDiscussionSource)
        }
    }
}
