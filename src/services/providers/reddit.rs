/// Reddit discussion provider
///
/// Authenticates with application-only OAuth (client credentials), searches
/// r/anime and r/manga for discussion or review threads about a title, and
/// walks each thread's comment tree into a `HypeSample`.
///
/// API Flow:
/// 1. Token: POST /api/v1/access_token (basic auth) -> bearer token, cached until expiry
/// 2. Search: /r/anime+manga/search -> threads with their scores
/// 3. Comments: /r/{subreddit}/comments/{id} -> [thread listing, comment listing]
use crate::{
    error::{AppError, AppResult},
    models::HypeSample,
    services::providers::DiscussionSource,
};
use reqwest::{Client as HttpClient, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

const SEARCH_SUBREDDITS: &str = "anime+manga";
/// Comments this short are reactions rather than discussion
const MIN_COMMENT_CHARS: usize = 10;
const COMMENT_FETCH_LIMIT: &str = "500";
/// Refresh the token this long before Reddit says it expires
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: Instant,
}

#[derive(Debug, Deserialize)]
struct Listing<T> {
    data: ListingData<T>,
}

#[derive(Debug, Deserialize)]
struct ListingData<T> {
    #[serde(default = "Vec::new")]
    children: Vec<Thing<T>>,
}

#[derive(Debug, Deserialize)]
struct Thing<T> {
    kind: String,
    data: T,
}

/// Search result thread
#[derive(Debug, Clone, Deserialize)]
struct RedditPost {
    id: String,
    subreddit: String,
    #[serde(default)]
    score: i64,
}

/// Builds the search query used for a title
pub fn search_query(title: &str) -> String {
    format!("\"{}\" (discussion OR review)", title.replace('"', ""))
}

/// Appends every sufficiently long comment in a comment listing, depth-first
///
/// `more` placeholders are skipped; nested replies are either an empty
/// string or another listing.
pub fn collect_comments(listing: &Value, sample: &mut HypeSample) {
    let Some(children) = listing
        .get("data")
        .and_then(|d| d.get("children"))
        .and_then(Value::as_array)
    else {
        return;
    };

    for child in children {
        if child.get("kind").and_then(Value::as_str) != Some("t1") {
            continue;
        }
        let Some(data) = child.get("data") else {
            continue;
        };

        if let Some(body) = data.get("body").and_then(Value::as_str) {
            if body.chars().count() > MIN_COMMENT_CHARS {
                let score = data.get("score").and_then(Value::as_i64).unwrap_or(0);
                sample.push_comment(body, score);
            }
        }

        if let Some(replies) = data.get("replies").filter(|r| r.is_object()) {
            collect_comments(replies, sample);
        }
    }
}

#[derive(Clone)]
pub struct RedditClient {
    http_client: HttpClient,
    client_id: String,
    client_secret: String,
    user_agent: String,
    auth_url: String,
    api_url: String,
    token: Arc<RwLock<Option<AccessToken>>>,
}

impl RedditClient {
    pub fn new(
        client_id: String,
        client_secret: String,
        user_agent: String,
        auth_url: String,
        api_url: String,
    ) -> Self {
        Self {
            http_client: HttpClient::new(),
            client_id,
            client_secret,
            user_agent,
            auth_url,
            api_url,
            token: Arc::new(RwLock::new(None)),
        }
    }

    /// Returns a valid bearer token, requesting a new one when the cached one is stale
    async fn access_token(&self) -> AppResult<String> {
        if let Some(token) = self.token.read().await.as_ref() {
            if token.expires_at > Instant::now() {
                return Ok(token.value.clone());
            }
        }

        let url = format!("{}/api/v1/access_token", self.auth_url);
        let response = self
            .http_client
            .post(&url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| AppError::UpstreamUnavailable(format!("Reddit auth failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::UpstreamUnavailable(format!(
                "Reddit auth returned status {}",
                response.status()
            )));
        }

        let token: TokenResponse = response.json().await?;
        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);

        let mut cached = self.token.write().await;
        *cached = Some(AccessToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });

        tracing::debug!(expires_in = token.expires_in, "Reddit access token refreshed");

        Ok(token.access_token)
    }

    async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> AppResult<Value> {
        let token = self.access_token().await?;

        let response = self
            .http_client
            .get(url)
            .bearer_auth(token)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if matches!(
            status,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
        ) {
            // A rejected token will not recover by itself
            if status == StatusCode::UNAUTHORIZED {
                *self.token.write().await = None;
            }
            return Err(AppError::UpstreamUnavailable(format!(
                "Reddit API returned status {}",
                status
            )));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Reddit API returned status {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }

    async fn search_posts(&self, title: &str, max_threads: usize) -> AppResult<Vec<RedditPost>> {
        let url = format!("{}/r/{}/search", self.api_url, SEARCH_SUBREDDITS);
        let query = search_query(title);
        let limit = max_threads.to_string();

        let value = self
            .get_json(
                &url,
                &[
                    ("q", query.as_str()),
                    ("sort", "hot"),
                    ("restrict_sr", "true"),
                    ("type", "link"),
                    ("limit", limit.as_str()),
                ],
            )
            .await?;

        let listing: Listing<RedditPost> = serde_json::from_value(value)?;

        Ok(listing
            .data
            .children
            .into_iter()
            .filter(|thing| thing.kind == "t3")
            .map(|thing| thing.data)
            .take(max_threads)
            .collect())
    }

    async fn collect_thread(&self, post: &RedditPost, sample: &mut HypeSample) -> AppResult<()> {
        let url = format!("{}/r/{}/comments/{}", self.api_url, post.subreddit, post.id);
        let value = self
            .get_json(&url, &[("limit", COMMENT_FETCH_LIMIT), ("raw_json", "1")])
            .await?;

        let comments = value
            .as_array()
            .and_then(|parts| parts.get(1))
            .ok_or_else(|| {
                AppError::ExternalApi(format!("Unexpected comment payload for thread {}", post.id))
            })?;

        collect_comments(comments, sample);
        Ok(())
    }
}

#[async_trait::async_trait]
impl DiscussionSource for RedditClient {
    async fn fetch_sample(&self, title: &str, max_threads: usize) -> AppResult<HypeSample> {
        if max_threads == 0 {
            return Ok(HypeSample::default());
        }

        let posts = self.search_posts(title, max_threads).await?;
        let mut sample = HypeSample::new(posts.iter().map(|p| p.score).sum());

        for post in &posts {
            // A thread whose comments cannot be read still contributes its score
            if let Err(e) = self.collect_thread(post, &mut sample).await {
                tracing::debug!(
                    thread = %post.id,
                    error = %e,
                    "Skipping comments of unreadable thread"
                );
            }
        }

        tracing::debug!(
            title = %title,
            threads = posts.len(),
            comments = sample.comment_count(),
            post_score = sample.aggregate_post_score,
            provider = "reddit",
            "Discussion sample gathered"
        );

        Ok(sample)
    }

    fn name(&self) -> &'static str {
        "reddit"
    }
}

/// Stand-in used when no Reddit credentials are configured
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineDiscussionSource;

#[async_trait::async_trait]
impl DiscussionSource for OfflineDiscussionSource {
    async fn fetch_sample(&self, _title: &str, _max_threads: usize) -> AppResult<HypeSample> {
        Err(AppError::UpstreamUnavailable(
            "Reddit credentials are not configured".to_string(),
        ))
    }

    fn name(&self) -> &'static str {
        "offline"
    }
}
