/// Official MyAnimeList v2 provider
///
/// Uses the ranking endpoint with `ranking_type=airing`. Entries come back
/// wrapped in a `node` object and only carry the fields requested through
/// the `fields` parameter.
use crate::{
    error::{AppError, AppResult},
    services::providers::MetadataSource,
};
use reqwest::Client as HttpClient;
use serde::Deserialize;

/// MAL caps ranking pages at 500 entries
const MAX_PAGE_SIZE: usize = 500;
const RANKING_FIELDS: &str =
    "mean,num_scoring_users,genres,media_type,num_episodes,status,num_list_users";

#[derive(Debug, Deserialize)]
struct MalRankingResponse {
    #[serde(default)]
    data: Vec<serde_json::Value>,
}

#[derive(Clone)]
pub struct MalClient {
    http_client: HttpClient,
    client_id: String,
    api_url: String,
}

impl MalClient {
    pub fn new(client_id: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            client_id,
            api_url,
        }
    }
}

#[async_trait::async_trait]
impl MetadataSource for MalClient {
    async fn fetch_top_anime(&self, limit: usize) -> AppResult<Vec<serde_json::Value>> {
        if limit == 0 {
            return Err(AppError::InvalidParameter(
                "Anime limit must be at least 1".to_string(),
            ));
        }

        let url = format!("{}/anime/ranking", self.api_url);
        let limit_param = limit.min(MAX_PAGE_SIZE).to_string();

        let response = self
            .http_client
            .get(&url)
            .header("X-MAL-CLIENT-ID", &self.client_id)
            .query(&[
                ("ranking_type", "airing"),
                ("limit", limit_param.as_str()),
                ("fields", RANKING_FIELDS),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "MyAnimeList API returned status {}: {}",
                status, body
            )));
        }

        let ranking: MalRankingResponse = response.json().await?;

        tracing::info!(
            limit = limit,
            results = ranking.data.len(),
            provider = "mal",
            "Top anime fetched"
        );

        Ok(ranking.data)
    }

    fn name(&self) -> &'static str {
        "mal"
    }
}
